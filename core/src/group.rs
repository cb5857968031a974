//! Ordered lines of cells for a move direction.

use crate::direction::Direction;
use crate::grid::{GridModel, Position};

/// One row or column, index 0 being the cell on the leading edge.
pub type Group = Vec<Position>;

/// Build the rows (horizontal moves) or columns (vertical moves) of `grid`,
/// each ordered so that index 0 is the cell tiles travel toward.
///
/// Groups hold positions into the grid's own cell store; no tile data is copied.
pub fn groups(grid: &GridModel, direction: Direction) -> Vec<Group> {
    let (lines, len) = if direction.is_horizontal() {
        (grid.height(), grid.width())
    } else {
        (grid.width(), grid.height())
    };

    (0..lines)
        .map(|line| {
            let mut group: Group = (0..len)
                .map(|i| {
                    if direction.is_horizontal() {
                        Position::new(i, line)
                    } else {
                        Position::new(line, i)
                    }
                })
                .collect();
            if direction.toward_far_edge() {
                group.reverse();
            }
            group
        })
        .collect()
}
