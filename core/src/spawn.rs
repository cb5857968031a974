//! Random tile creation.

use crate::error::SpawnError;
use crate::grid::{GridModel, TileId};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{error, trace};

/// Default chance that a spawned tile is a 4 rather than a 2.
pub const DEFAULT_FOUR_PROBABILITY: f64 = 0.5;

/// Places new tiles on random empty cells.
///
/// Seeded, so the same seed and the same sequence of moves reproduce the
/// same game.
#[derive(Debug, Clone)]
pub struct SpawnGenerator {
    rng: SmallRng,
    four_probability: f64,
}

impl SpawnGenerator {
    pub fn new(seed: u64, four_probability: f64) -> Self {
        SpawnGenerator {
            rng: SmallRng::seed_from_u64(seed),
            four_probability,
        }
    }

    /// Restart the random sequence from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
    }

    pub fn four_probability(&self) -> f64 {
        self.four_probability
    }

    /// Spawn a new tile in a random empty cell.
    ///
    /// Callers only spawn after a move that changed the board, which always
    /// leaves a cell free; a full board here is a contract violation.
    pub fn spawn(&mut self, grid: &mut GridModel) -> Result<TileId, SpawnError> {
        let empty_cells = grid.empty_cells();
        if empty_cells.is_empty() {
            error!("spawn requested on a full board");
            return Err(SpawnError::BoardFull);
        }

        let position = empty_cells[self.rng.gen_range(0..empty_cells.len())];
        let value = if self.rng.gen::<f64>() < self.four_probability {
            4
        } else {
            2
        };
        let id = grid.place_tile(position, value)?;
        trace!(tile = %id, x = position.x, y = position.y, value, "spawned tile");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_fills_empty_cell() {
        let mut grid = GridModel::new(4).unwrap();
        let mut spawner = SpawnGenerator::new(7, DEFAULT_FOUR_PROBABILITY);
        let id = spawner.spawn(&mut grid).unwrap();
        let tile = grid.tile(id).unwrap();
        assert!(tile.value() == 2 || tile.value() == 4);
        assert_eq!(grid.empty_cells().len(), 15);
        assert!(grid.is_consistent());
    }

    #[test]
    fn test_spawn_until_full() {
        let mut grid = GridModel::new(3).unwrap();
        let mut spawner = SpawnGenerator::new(1, DEFAULT_FOUR_PROBABILITY);
        for _ in 0..9 {
            spawner.spawn(&mut grid).unwrap();
        }
        assert!(grid.empty_cells().is_empty());
        assert_eq!(spawner.spawn(&mut grid), Err(SpawnError::BoardFull));
        assert_eq!(grid.tile_count(), 9);
    }

    #[test]
    fn test_spawn_picks_only_empty_cell() {
        let rows = vec![vec![2, 4], vec![8, 0]];
        let mut grid = GridModel::from_rows(&rows).unwrap();
        let mut spawner = SpawnGenerator::new(3, DEFAULT_FOUR_PROBABILITY);
        let id = spawner.spawn(&mut grid).unwrap();
        assert_eq!(grid.tile(id).unwrap().position().x, 1);
        assert_eq!(grid.tile(id).unwrap().position().y, 1);
    }

    #[test]
    fn test_spawn_determinism() {
        let mut a = GridModel::new(4).unwrap();
        let mut b = GridModel::new(4).unwrap();
        let mut spawner_a = SpawnGenerator::new(12345, DEFAULT_FOUR_PROBABILITY);
        let mut spawner_b = SpawnGenerator::new(12345, DEFAULT_FOUR_PROBABILITY);
        for _ in 0..5 {
            spawner_a.spawn(&mut a).unwrap();
            spawner_b.spawn(&mut b).unwrap();
        }
        assert_eq!(a.values(), b.values());
    }

    #[test]
    fn test_reseed_restarts_sequence() {
        let mut spawner = SpawnGenerator::new(99, DEFAULT_FOUR_PROBABILITY);
        let mut first = GridModel::new(4).unwrap();
        spawner.spawn(&mut first).unwrap();

        spawner.reseed(99);
        let mut second = GridModel::new(4).unwrap();
        spawner.spawn(&mut second).unwrap();
        assert_eq!(first.values(), second.values());
    }

    #[test]
    fn test_value_probability_extremes() {
        let mut grid = GridModel::new(4).unwrap();
        let mut twos = SpawnGenerator::new(5, 0.0);
        let mut fours = SpawnGenerator::new(5, 1.0);
        assert_eq!(twos.four_probability(), 0.0);
        assert_eq!(fours.four_probability(), 1.0);
        for _ in 0..4 {
            let id = twos.spawn(&mut grid).unwrap();
            assert_eq!(grid.tile(id).unwrap().value(), 2);
            let id = fours.spawn(&mut grid).unwrap();
            assert_eq!(grid.tile(id).unwrap().value(), 4);
        }
    }

    #[test]
    fn test_even_split_produces_both_values() {
        let mut spawner = SpawnGenerator::new(2024, DEFAULT_FOUR_PROBABILITY);
        let mut grid = GridModel::new(8).unwrap();
        for _ in 0..64 {
            spawner.spawn(&mut grid).unwrap();
        }
        let fours = grid.tiles().filter(|t| t.value() == 4).count();
        // 64 fair draws landing entirely on one side is vanishingly unlikely.
        assert!(fours > 8 && fours < 56, "fours = {fours}");
    }
}
