//! # Tile-merge Engine
//!
//! Move resolution for a sliding-tile merge puzzle: slides and merges
//! tiles on a grid of cells, spawns new tiles from a seedable PRNG and
//! detects when no legal move remains. Rendering and input capture are
//! left to the caller, which drives a [`GameSession`] with [`Event`]s.
//!
//! ## Example
//!
//! ```rust
//! use tilemerge_core::{Direction, Event, GameSession, SessionConfig, Turn};
//!
//! let mut session = GameSession::new(SessionConfig::default()).unwrap();
//! session.subscribe(|notification| println!("{notification:?}"));
//!
//! match session.handle(Event::Move(Direction::Left)).unwrap() {
//!     Turn::Moved { outcome, .. } => println!("+{} points", outcome.score_delta),
//!     other => println!("{other:?}"),
//! }
//! println!("{session}");
//! ```

pub mod availability;
pub mod config;
pub mod direction;
pub mod error;
pub mod grid;
pub mod group;
pub mod resolver;
pub mod score;
pub mod session;
pub mod snapshot;
pub mod spawn;

pub use availability::{has_move, is_game_over, legal_directions};
pub use config::SessionConfig;
pub use direction::Direction;
pub use error::{ConfigError, GridError, SessionError, SpawnError};
pub use grid::{Cell, GridModel, Merge, Position, Tile, TileId};
pub use group::{groups, Group};
pub use resolver::{resolve, MoveOutcome};
pub use score::ScoreAccumulator;
pub use session::{Event, GameSession, Notification, SessionState, Turn};
pub use snapshot::Snapshot;
pub use spawn::{SpawnGenerator, DEFAULT_FOUR_PROBABILITY};
