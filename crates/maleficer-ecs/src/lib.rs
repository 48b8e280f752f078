//! Maleficer ECS -- map-of-maps Entity Component System with generational ids.
//!
//! Every component type owns one ordered map keyed by [`EntityId`]. Queries
//! intersect those key sets and then join the requested components per
//! entity. Generational ids let events that outlive their subject detect the
//! miss instead of hitting a recycled slot.
//!
//! # Quick Start
//!
//! ```
//! use maleficer_ecs::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Position { x: i32, y: i32 }
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Health { max: i32, current: i32 }
//!
//! let mut world = World::new();
//! world.register_component::<Position>("position");
//!
//! let entity = world.spawn_bundle(
//!     ComponentBundle::new()
//!         .with(Position { x: 2, y: 3 })
//!         .with(Health { max: 10, current: 10 }),
//! );
//!
//! let (found, (pos, hp)) = world.filter::<(&Position, &Health)>().single().unwrap();
//! assert_eq!(found, entity);
//! assert_eq!(pos, &Position { x: 2, y: 3 });
//! assert_eq!(hp.current, 10);
//! ```

#![deny(unsafe_code)]

pub mod component;
pub mod entity;
pub mod query;
pub mod storage;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by ECS operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    /// The entity does not exist (stale generation or never allocated).
    #[error("entity {entity:?} does not exist (stale or never allocated)")]
    StaleEntity { entity: entity::EntityId },

    /// A query expected at least one match and found none.
    #[error("query {query} matched no entities")]
    NotFound { query: &'static str },

    /// A query expected exactly one match.
    #[error("query {query} expected exactly one entity, matched {count}")]
    NotSingleton { query: &'static str, count: usize },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::component::{Component, ComponentInfo, ComponentRegistry, ComponentTypeId};
    pub use crate::entity::{EntityAllocator, EntityId};
    pub use crate::query::{Filter, FilterIter, Query, QueryItem};
    pub use crate::world::{ComponentBundle, World};
    pub use crate::EcsError;
}
