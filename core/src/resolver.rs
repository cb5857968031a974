//! Slide and merge resolution for a single move.

use crate::direction::Direction;
use crate::grid::{GridModel, Merge, Position};
use crate::group::{groups, Group};
use serde::Serialize;
use tracing::{debug, error};

/// Result of resolving one move.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MoveOutcome {
    /// Whether any tile moved or was merged away.
    pub moved: bool,
    /// Sum of the new values produced by this move's merges.
    pub score_delta: u64,
    /// Merges completed by this move, in row-major order of their cells.
    pub merges: Vec<Merge>,
}

/// Slide and merge every tile of `grid` toward `direction`.
///
/// Each group is scanned from index 1 outward. A tile travels back toward
/// index 0 across every cell that accepts it and stops on the last one. A
/// cell holding an equal tile accepts at most one merge per move; the merge
/// itself completes once all groups have been scanned.
pub fn resolve(grid: &mut GridModel, direction: Direction) -> MoveOutcome {
    let mut moved = false;

    for group in groups(grid, direction) {
        moved |= slide_group(grid, &group);
    }

    let merges = grid.complete_merges();
    debug_assert!(grid.is_consistent(), "grid inconsistent after {direction:?}");

    let score_delta = merges.iter().map(|merge| u64::from(merge.value)).sum();
    let outcome = MoveOutcome {
        moved: moved || !merges.is_empty(),
        score_delta,
        merges,
    };
    debug!(
        ?direction,
        moved = outcome.moved,
        score_delta,
        merges = outcome.merges.len(),
        "resolved move"
    );
    outcome
}

/// Slide the tiles of one group, returning whether any of them moved.
fn slide_group(grid: &mut GridModel, group: &Group) -> bool {
    let mut moved = false;

    for i in 1..group.len() {
        let Some(tile) = grid.tile_at(group[i]) else {
            continue;
        };
        let (id, value) = (tile.id(), tile.value());

        let Some(destination) = furthest_accepting(grid, &group[..i], value) else {
            continue;
        };

        let occupied = grid
            .cell_at(destination)
            .is_some_and(|cell| !cell.is_empty());
        let committed = if occupied {
            grid.stage_merge(id, destination)
        } else {
            grid.relocate(id, destination)
        };

        match committed {
            Ok(()) => moved = true,
            Err(err) => error!(tile = %id, %err, "aborted slide"),
        }
    }

    moved
}

/// Walk `ahead` from its end back toward index 0 and return the last cell
/// that accepts a tile of `value` before the first one that does not.
fn furthest_accepting(grid: &GridModel, ahead: &[Position], value: u32) -> Option<Position> {
    ahead
        .iter()
        .rev()
        .take_while(|&&position| grid.cell_accepts(position, value))
        .last()
        .copied()
}

// =============================================================================
// Tests
// =============================================================================
