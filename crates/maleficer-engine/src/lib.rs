//! Maleficer Engine -- turn-resolution core for a dungeon-crawler roguelike.
//!
//! Builds on [`maleficer_ecs`] to provide the pieces of one game turn:
//! deferred event queues drained by resolvers, a condition ledger ticked by
//! upkeep, trigger lists of closed [`Callback`](behavior::Callback)s, and a
//! phase scheduler that swaps the active units between menus, the level,
//! targeting and the inventory.
//!
//! # Quick Start
//!
//! ```
//! use maleficer_engine::prelude::*;
//!
//! let mut game = Game::new(GameConfig::headless(1))
//!     .unwrap()
//!     .with_map_source(ArenaMap::new());
//! game.start_run(PlayerClass::Adept).unwrap();
//! assert_eq!(game.advance().unwrap(), Step::Awaiting(Ontology::Level));
//!
//! // Step right; the turn resolves and the scheduler waits again.
//! let step = game.submit(Action::Move { dx: 1, dy: 0 }).unwrap();
//! assert_eq!(step, Step::Awaiting(Ontology::Level));
//! assert_eq!(game.turn(), 1);
//! ```

#![deny(unsafe_code)]

pub mod behavior;
pub mod board;
pub mod components;
pub mod condition;
pub mod config;
pub mod content;
pub mod error;
pub mod event;
pub mod game;
pub mod location;
pub mod log;
pub mod logging;
pub mod map;
pub mod phase;
pub mod present;
pub mod resolve;
pub mod trigger;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the ECS crate for convenience.
pub use maleficer_ecs;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for drivers and tests.
pub mod prelude {
    pub use maleficer_ecs::prelude::*;

    pub use crate::behavior::{Behavior, Callback};
    pub use crate::board::Board;
    pub use crate::components::*;
    pub use crate::condition::{Condition, State};
    pub use crate::config::GameConfig;
    pub use crate::content::player::PlayerClass;
    pub use crate::content::prefab::Prefab;
    pub use crate::error::{ConfigError, GameError, GameResult};
    pub use crate::event::{Damage, DamageSource, Death, Movement, Queues, Spawn, Tick};
    pub use crate::game::{Action, Game, Step};
    pub use crate::log::MessageLog;
    pub use crate::map::{ArenaMap, LevelLayout, MapSource};
    pub use crate::phase::{Ontology, PhaseScheduler, Unit};
    pub use crate::present::{Color, Glyph, NullPresenter, Presenter, RecordingPresenter, View};
    pub use crate::trigger::{
        OnDeathTrigger, OnEnemyTurnTrigger, OnStepTrigger, OnUseTrigger, Trigger,
    };
}
