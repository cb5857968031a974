//! Session parameters.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```toml
//! grid_size = 5
//! seed = 7
//! four_probability = 0.1
//! ```

use crate::error::ConfigError;
use crate::spawn::DEFAULT_FOUR_PROBABILITY;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameters read once at session start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Side length of the square grid.
    pub grid_size: usize,
    /// Seed for tile spawning. Restart `n` uses `seed + n`.
    pub seed: u64,
    /// Tiles placed when a session starts or restarts.
    pub start_tiles: usize,
    /// Chance that a spawned tile is a 4.
    pub four_probability: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            grid_size: 4,
            seed: 42,
            start_tiles: 2,
            four_probability: DEFAULT_FOUR_PROBABILITY,
        }
    }
}

impl SessionConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size == 0 {
            return Err(ConfigError::InvalidGridSize(self.grid_size));
        }
        if self.start_tiles == 0 {
            return Err(ConfigError::NoStartTiles);
        }
        if !(0.0..=1.0).contains(&self.four_probability) {
            return Err(ConfigError::InvalidFourProbability(self.four_probability));
        }
        Ok(())
    }
}
