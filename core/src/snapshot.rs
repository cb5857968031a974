use crate::availability::legal_directions;
use crate::grid::{GridModel, Tile};
use crate::session::SessionState;
use serde::Serialize;

/// Everything a presentation layer needs to draw the board after a move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub width: usize,
    pub height: usize,
    pub score: u64,
    pub state: SessionState,
    /// Tile values as rows, `0` for empty cells.
    pub cells: Vec<Vec<u32>>,
    /// Live tiles ordered by id.
    pub tiles: Vec<Tile>,
    /// Legal directions in `Direction::all()` order.
    pub legal: [bool; 4],
}

impl Snapshot {
    pub fn capture(grid: &GridModel, score: u64, state: SessionState) -> Self {
        Snapshot {
            width: grid.width(),
            height: grid.height(),
            score,
            state,
            cells: grid.values(),
            tiles: grid.tiles().cloned().collect(),
            legal: legal_directions(grid),
        }
    }
}
