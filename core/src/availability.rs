//! Legal-move and game-over detection.

use crate::direction::Direction;
use crate::grid::GridModel;
use crate::group::groups;

/// Check if a move in `direction` would change the board.
///
/// True when some tile has, directly ahead of it in its group, an empty
/// cell or a tile of equal value.
pub fn has_move(grid: &GridModel, direction: Direction) -> bool {
    groups(grid, direction).iter().any(|group| {
        group.windows(2).any(|pair| {
            let (leading, trailing) = (pair[0], pair[1]);
            grid.tile_at(trailing)
                .is_some_and(|tile| grid.cell_accepts(leading, tile.value()))
        })
    })
}

/// Legal directions as a boolean array in [`Direction::all`] order.
pub fn legal_directions(grid: &GridModel) -> [bool; 4] {
    Direction::all().map(|direction| has_move(grid, direction))
}

/// Whether no direction has a legal move.
pub fn is_game_over(grid: &GridModel) -> bool {
    !Direction::all()
        .into_iter()
        .any(|direction| has_move(grid, direction))
}
