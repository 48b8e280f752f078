//! Turn resolvers.
//!
//! Each resolver drains one event queue to empty, applying its rules and
//! queueing follow-up events for the resolvers after it. The phase table in
//! [`crate::phase`] decides the order they run in.

pub mod damage;
pub mod death;
pub mod movement;
pub mod npc;
pub mod spawn;
pub mod upkeep;
