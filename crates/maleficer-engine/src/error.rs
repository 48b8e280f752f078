//! Error types for the turn-resolution core.
//!
//! Three tiers, mirroring how far an error is allowed to travel:
//!
//! - *Fizzles* are not errors at all. A resolver that finds its subject gone
//!   drops the event and logs at `trace`.
//! - [`GameError::InvalidAction`] is user-recoverable. It is caught exactly
//!   once, by [`Game::submit`](crate::game::Game::submit), and turned into a
//!   rejected step.
//! - Everything else ([`GameError::Lookup`], [`GameError::OutOfBounds`],
//!   [`GameError::MissingComponent`], [`GameError::NoInput`]) is a broken
//!   structural invariant and propagates to the caller.

use std::path::PathBuf;

use maleficer_ecs::component::short_type_name;
use maleficer_ecs::prelude::*;

use crate::phase::Ontology;

/// Result alias used throughout the engine.
pub type GameResult<T> = Result<T, GameError>;

/// Errors produced while resolving a turn.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The attempted action is not legal right now (spell on cooldown, empty
    /// inventory, ...). The turn is not consumed.
    #[error("{0}")]
    InvalidAction(String),

    /// A query that must find its entity did not.
    #[error(transparent)]
    Lookup(#[from] EcsError),

    /// A board access outside the grid.
    #[error("({x}, {y}) is outside the {width}x{height} board")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },

    /// An entity lacks a component its role guarantees.
    #[error("entity {entity} has no {component} component")]
    MissingComponent {
        entity: EntityId,
        component: &'static str,
    },

    /// The active phase ran a full cycle without reaching an input unit.
    #[error("phase {phase:?} never waits for input")]
    NoInput { phase: Ontology },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl GameError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidAction(reason.into())
    }

    pub fn missing<T: ?Sized>(entity: EntityId) -> Self {
        Self::MissingComponent {
            entity,
            component: short_type_name::<T>(),
        }
    }

    /// Whether this is the user-recoverable kind.
    pub fn is_invalid_action(&self) -> bool {
        matches!(self, Self::InvalidAction(_))
    }
}

/// Errors produced while loading or validating a [`GameConfig`](crate::config::GameConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Health;

    #[test]
    fn missing_component_uses_short_name() {
        let err = GameError::missing::<Health>(EntityId::new(4, 1));
        assert_eq!(err.to_string(), "entity 4v1 has no Health component");
    }

    #[test]
    fn ecs_errors_convert_with_question_mark() {
        fn lookup() -> GameResult<()> {
            let found: Result<(), EcsError> = Err(EcsError::NotFound { query: "player" });
            found?;
            Ok(())
        }
        assert!(matches!(lookup(), Err(GameError::Lookup(_))));
    }

    #[test]
    fn invalid_action_displays_reason_verbatim() {
        let err = GameError::invalid("Spell on cooldown");
        assert!(err.is_invalid_action());
        assert_eq!(err.to_string(), "Spell on cooldown");
    }
}
