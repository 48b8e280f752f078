//! Game configuration.
//!
//! [`GameConfig`] is plain serde data. Every field has a default, so a JSON
//! file only needs to name what it overrides:
//!
//! ```
//! use maleficer_engine::config::GameConfig;
//!
//! let config = GameConfig::from_json_str(r#"{ "seed": 7, "board_width": 20 }"#).unwrap();
//! assert_eq!(config.seed, 7);
//! assert_eq!(config.board_width, 20);
//! assert_eq!(config.max_known_spells, 4);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunables for one game session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Board width in cells.
    pub board_width: i32,
    /// Board height in cells.
    pub board_height: i32,
    /// Radius around the player inside which deaths are reported in the log.
    pub perception: i32,
    /// Number of spell slots a player can fill.
    pub max_known_spells: usize,
    /// Pause between animation frames, in milliseconds. Zero disables it.
    pub animation_delay_ms: u64,
    /// Seed for the session RNG.
    pub seed: u64,
    /// Potions the player starts with.
    pub starting_potions: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board_width: 60,
            board_height: 36,
            perception: 10,
            max_known_spells: 4,
            animation_delay_ms: 15,
            seed: 0,
            starting_potions: 1,
        }
    }
}

impl GameConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        tracing::info!(path = %path.display(), seed = config.seed, "loaded game config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // Arena walls take the outer ring, so anything smaller has no floor.
        if self.board_width < 3 || self.board_height < 3 {
            return Err(ConfigError::Invalid(format!(
                "board must be at least 3x3, got {}x{}",
                self.board_width, self.board_height
            )));
        }
        if self.max_known_spells == 0 {
            return Err(ConfigError::Invalid(
                "max_known_spells must be at least 1".to_owned(),
            ));
        }
        if self.perception < 0 {
            return Err(ConfigError::Invalid(format!(
                "perception must not be negative, got {}",
                self.perception
            )));
        }
        Ok(())
    }

    pub fn animation_delay(&self) -> Duration {
        Duration::from_millis(self.animation_delay_ms)
    }

    /// A small, animation-free config for tests and headless runs.
    pub fn headless(seed: u64) -> Self {
        Self {
            board_width: 12,
            board_height: 10,
            animation_delay_ms: 0,
            seed,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(GameConfig::default().validate().is_ok());
        assert!(GameConfig::headless(1).validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = GameConfig::from_json_str(r#"{ "perception": 3 }"#).unwrap();
        assert_eq!(config.perception, 3);
        assert_eq!(config.board_width, GameConfig::default().board_width);
    }

    #[test]
    fn zero_spell_cap_is_rejected() {
        let err = GameConfig::from_json_str(r#"{ "max_known_spells": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn tiny_board_is_rejected() {
        let err = GameConfig::from_json_str(r#"{ "board_width": 2 }"#).unwrap_err();
        assert!(err.to_string().contains("at least 3x3"));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = GameConfig::from_json_str("{ seed: }").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = GameConfig::load("/nonexistent/maleficer.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn round_trips_through_json() {
        let config = GameConfig::headless(42);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(GameConfig::from_json_str(&json).unwrap(), config);
    }
}
