//! Error types for the engine.
//!
//! Illegal input (an unknown key, a move while the game is over) is never an
//! error; it is ignored by the session. The variants here are configuration
//! problems and contract violations.

use crate::grid::{Position, TileId};
use std::io;

/// Errors raised by [`GridModel`](crate::GridModel) lookups and mutations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("grid dimensions must be non-zero (got {width}x{height})")]
    ZeroSize { width: usize, height: usize },
    #[error("rows have different lengths")]
    RaggedRows,
    #[error("position ({}, {}) is outside the grid", .0.x, .0.y)]
    OutOfBounds(Position),
    #[error("cell ({}, {}) is already occupied", .0.x, .0.y)]
    Occupied(Position),
    #[error("no tile with id {0}")]
    UnknownTile(TileId),
}

/// Errors raised by [`SpawnGenerator`](crate::SpawnGenerator).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SpawnError {
    #[error("cannot spawn a tile: the board is full")]
    BoardFull,
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Errors raised while loading or validating a [`SessionConfig`](crate::SessionConfig).
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("grid size must be at least 1 (got {0})")]
    InvalidGridSize(usize),
    #[error("start_tiles must be at least 1")]
    NoStartTiles,
    #[error("four_probability must be within [0, 1] (got {0})")]
    InvalidFourProbability(f64),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors raised by [`GameSession`](crate::GameSession).
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Spawn(#[from] SpawnError),
}
