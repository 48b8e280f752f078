//! Component types attached to game entities.
//!
//! Markers are unit structs; data components are small `Clone` records.
//! Condition state lives in [`crate::condition::State`] and trigger lists in
//! [`crate::trigger`].

use maleficer_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::behavior::Behavior;
use crate::present::{Color, Glyph};

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn as_tuple(self) -> (i32, i32) {
        (self.x, self.y)
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visible {
    pub glyph: Glyph,
    pub color: Color,
}

impl Visible {
    pub fn new(glyph: Glyph, color: Color) -> Self {
        Self { glyph, color }
    }
}

/// Does not block light.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transparent;

/// Blocks light even on a transparent cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opaque;

/// Can't be moved through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blocking;

/// A board tile: floor, wall, stairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wall;

// ---------------------------------------------------------------------------
// Actors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Player;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enemy {
    /// How far the enemy notices the player.
    pub perception: i32,
    /// Steps taken per turn when closing in.
    pub speed: i32,
    pub behavior: Behavior,
}

impl Enemy {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            perception: 0,
            speed: 1,
            behavior,
        }
    }

    pub fn with_perception(mut self, perception: i32) -> Self {
        self.perception = perception;
        self
    }

    pub fn with_speed(mut self, speed: i32) -> Self {
        self.speed = speed;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Named {
    pub name: String,
}

impl Named {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    pub max: i32,
    pub current: i32,
}

impl Health {
    /// Full health.
    pub fn new(max: i32) -> Self {
        Self { max, current: max }
    }

    /// Subtract `amount` (negative heals), clamped to `[0, max]`.
    pub fn apply(&mut self, amount: i32) {
        self.current = (self.current - amount).clamp(0, self.max);
    }
}

/// Unaffected by `OnStep` entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flying;

/// A visual halo. The bomb's colour escalates each enemy turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aura {
    pub radius: i32,
    pub color: Color,
}

// ---------------------------------------------------------------------------
// Items and spells
// ---------------------------------------------------------------------------

/// The targeting cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crosshair;

/// Effects resolve against every cell within `radius` of the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectArea {
    pub radius: i32,
}

/// Can be picked up into the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collectable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InInventory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spell {
    /// Maximum cast distance. Zero means self-targeted.
    pub target_range: i32,
}

/// The spell is castable from `slot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Known {
    pub slot: usize,
}

/// Using this teaches `spell`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Learnable {
    pub spell: EntityId,
}

/// Turns between uses.
///
/// Stored one higher than configured: the grant lands mid-turn and the
/// same turn's upkeep immediately takes one off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldown {
    pub turns: i32,
}

impl Cooldown {
    pub fn new(turns: i32) -> Self {
        Self { turns: turns + 1 }
    }
}

/// The entity an effect holder is currently resolving against.
///
/// Only present while one cast, use or trigger is being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub target: EntityId,
}

/// The spell that opened the targeting phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Targeting;

/// Inventory cursor. Exists only while the inventory phase is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MenuSelection {
    pub item: usize,
}

/// Activates when walked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnStep;

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageEffect {
    /// Flat damage, or the number of dice when `die_type` is set.
    pub amount: i32,
    pub die_type: Option<u32>,
    /// Who gets credit in the log. `None` credits the holder.
    pub source: Option<EntityId>,
}

impl DamageEffect {
    pub fn flat(amount: i32, source: Option<EntityId>) -> Self {
        Self {
            amount,
            die_type: None,
            source,
        }
    }

    pub fn dice(count: i32, die_type: u32, source: Option<EntityId>) -> Self {
        Self {
            amount: count,
            die_type: Some(die_type),
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealEffect {
    pub amount: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BleedEffect {
    pub value: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StunEffect {
    pub value: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AegisEffect {
    pub value: i32,
}

/// Moves `target` to the crosshair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveEffect {
    pub target: EntityId,
}

/// Shoves everything affected `distance` cells away from `source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushEffect {
    pub source: EntityId,
    pub distance: i32,
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

/// Display name of `entity`, falling back to a generic noun.
pub fn name_of(world: &World, entity: EntityId) -> String {
    world
        .get_component::<Named>(entity)
        .map(|named| named.name.clone())
        .unwrap_or_else(|| "something".to_owned())
}

/// Position of `entity`, or a [`MissingComponent`](crate::error::GameError::MissingComponent)
/// error.
pub fn position_of(world: &World, entity: EntityId) -> crate::error::GameResult<Position> {
    world
        .get_component::<Position>(entity)
        .copied()
        .ok_or_else(|| crate::error::GameError::missing::<Position>(entity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_clamps_both_ways() {
        let mut hp = Health::new(10);
        hp.apply(25);
        assert_eq!(hp.current, 0);
        hp.apply(-4);
        assert_eq!(hp.current, 4);
        hp.apply(-100);
        assert_eq!(hp.current, 10);
    }

    #[test]
    fn cooldown_adds_the_grant_turn() {
        assert_eq!(Cooldown::new(2).turns, 3);
    }

    #[test]
    fn unnamed_entities_are_something() {
        let mut world = World::new();
        let named = world.spawn_with(Named::new("bat"));
        let anon = world.spawn();
        assert_eq!(name_of(&world, named), "bat");
        assert_eq!(name_of(&world, anon), "something");
    }
}
