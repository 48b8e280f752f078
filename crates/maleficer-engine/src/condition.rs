//! The condition ledger: per-entity status effects with integer magnitudes.
//!
//! A magnitude is both strength and remaining duration. Each upkeep pass
//! [`apply`]s every active condition once, then [`decay`]s them all by one.
//! Entries that hit zero are removed, never stored as zero, so a grant of `N`
//! lasts exactly `N` passes.
//!
//! Grants overwrite: granting `Bleed 2` over `Bleed 5` leaves `Bleed 2`.

use std::collections::BTreeMap;

use maleficer_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::{name_of, Position};
use crate::error::GameResult;
use crate::event::{Animation, Damage, DamageSource, Death, Flash};
use crate::game::Game;
use crate::present::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Condition {
    /// Ability unusable while present.
    Cooldown,
    /// Damage equal to the magnitude every pass.
    Bleed,
    /// Dies when the magnitude reaches one.
    Dying,
    /// Movement is discarded.
    Stun,
    /// Absorbs incoming damage point for point.
    Aegis,
}

/// Every condition an entity currently has.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct State {
    pub map: BTreeMap<Condition, i32>,
}

pub fn has(world: &World, entity: EntityId, kind: Condition) -> bool {
    get(world, entity, kind) != 0
}

/// Current magnitude, zero when absent.
pub fn get(world: &World, entity: EntityId, kind: Condition) -> i32 {
    world
        .get_component::<State>(entity)
        .and_then(|state| state.map.get(&kind).copied())
        .unwrap_or(0)
}

/// Set `kind` to `value`, replacing any previous magnitude.
///
/// A non-positive value clears the condition.
pub fn grant(world: &mut World, entity: EntityId, kind: Condition, value: i32) -> GameResult<()> {
    if !world.has_component::<State>(entity) {
        world.insert_component(entity, State::default())?;
    }
    if let Some(state) = world.get_component_mut::<State>(entity) {
        if value > 0 {
            state.map.insert(kind, value);
        } else {
            state.map.remove(&kind);
        }
    }
    tracing::trace!(entity = %entity, condition = ?kind, value, "condition granted");
    Ok(())
}

/// Snapshot of active conditions, in ledger order.
pub fn active(world: &World, entity: EntityId) -> Vec<(Condition, i32)> {
    world
        .get_component::<State>(entity)
        .map(|state| state.map.iter().map(|(k, v)| (*k, *v)).collect())
        .unwrap_or_default()
}

/// Run the per-pass side effect of one condition.
pub fn apply(game: &mut Game, entity: EntityId, kind: Condition, value: i32) -> GameResult<()> {
    match kind {
        Condition::Bleed => {
            if let Some(pos) = game.world.get_component::<Position>(entity).copied() {
                game.queues
                    .push(Animation::new(vec![Flash::at(pos, None, Color::Red)]));
            }
            game.queues.push(Damage {
                source: DamageSource::bleed(),
                target: entity,
                amount: value,
            });
            let name = name_of(&game.world, entity);
            game.log.push(format!("{name} bleeds for {value}"));
        }
        Condition::Dying if value == 1 => {
            game.queues.push(Death { entity });
        }
        _ => {}
    }
    Ok(())
}

/// Take one off every magnitude and drop the expired ones.
pub fn decay(world: &mut World, entity: EntityId) {
    if let Some(state) = world.get_component_mut::<State>(entity) {
        for value in state.map.values_mut() {
            *value = (*value - 1).max(0);
        }
        state.map.retain(|_, value| *value > 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_condition_reads_zero() {
        let mut world = World::new();
        let e = world.spawn();
        assert!(!has(&world, e, Condition::Bleed));
        assert_eq!(get(&world, e, Condition::Bleed), 0);
    }

    #[test]
    fn grant_overwrites_instead_of_stacking() {
        let mut world = World::new();
        let e = world.spawn();
        grant(&mut world, e, Condition::Bleed, 5).unwrap();
        grant(&mut world, e, Condition::Bleed, 2).unwrap();
        assert_eq!(get(&world, e, Condition::Bleed), 2);
    }

    #[test]
    fn zero_grant_removes_the_entry() {
        let mut world = World::new();
        let e = world.spawn();
        grant(&mut world, e, Condition::Aegis, 3).unwrap();
        grant(&mut world, e, Condition::Aegis, 0).unwrap();
        assert!(!has(&world, e, Condition::Aegis));
        assert!(active(&world, e).is_empty());
    }

    #[test]
    fn decay_removes_instead_of_zeroing() {
        let mut world = World::new();
        let e = world.spawn();
        grant(&mut world, e, Condition::Cooldown, 1).unwrap();
        grant(&mut world, e, Condition::Stun, 2).unwrap();
        decay(&mut world, e);
        assert_eq!(active(&world, e), vec![(Condition::Stun, 1)]);
        decay(&mut world, e);
        assert!(active(&world, e).is_empty());
    }

    #[test]
    fn grant_on_stale_entity_is_an_error() {
        let mut world = World::new();
        let e = world.spawn();
        world.despawn(e).unwrap();
        assert!(grant(&mut world, e, Condition::Bleed, 1).is_err());
    }
}
