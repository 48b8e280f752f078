//! Spell entities.
//!
//! A spell is an entity with [`Spell`], a [`Cooldown`], one effect component
//! and an [`OnUseTrigger`] that starts with [`Callback::ApplyCooldown`]. It is
//! castable once it also carries [`Known`](crate::components::Known).

use maleficer_ecs::prelude::*;
use rand::Rng;

use crate::behavior::Callback;
use crate::components::{
    AegisEffect, BleedEffect, Cooldown, DamageEffect, EffectArea, MoveEffect, Named, PushEffect,
    Spell, StunEffect,
};
use crate::trigger::OnUseTrigger;

fn base(name: &str, target_range: i32, cooldown: i32, effect: Callback) -> ComponentBundle {
    ComponentBundle::new()
        .with(Named::new(name))
        .with(Spell { target_range })
        .with(Cooldown::new(cooldown))
        .with(OnUseTrigger::new([Callback::ApplyCooldown, effect]))
}

/// Area damage, rolled as `1 + level` six-sided dice.
pub fn firebolt(world: &mut World, player: EntityId, level: i32) -> EntityId {
    world.spawn_bundle(
        base("Firebolt", 5, 1, Callback::ApplyDamage)
            .with(DamageEffect::dice(1 + level, 6, Some(player)))
            .with(EffectArea { radius: 1 }),
    )
}

/// Teleport the player to the crosshair.
pub fn blink(world: &mut World, player: EntityId, level: i32) -> EntityId {
    world.spawn_bundle(
        base("Blink", 3 + level, 5, Callback::ApplyMove).with(MoveEffect { target: player }),
    )
}

pub fn lacerate(world: &mut World, level: i32) -> EntityId {
    world.spawn_bundle(
        base("Lacerate", 3, 2, Callback::ApplyBleed).with(BleedEffect { value: 4 + level }),
    )
}

pub fn push(world: &mut World, player: EntityId, level: i32) -> EntityId {
    world.spawn_bundle(base("Push", 3 + level, 2, Callback::ApplyPush).with(PushEffect {
        source: player,
        distance: 2,
    }))
}

pub fn daze(world: &mut World, level: i32) -> EntityId {
    world.spawn_bundle(base("Daze", 2, 6, Callback::ApplyStun).with(StunEffect { value: 1 + level }))
}

/// Self-cast damage absorption.
pub fn shield(world: &mut World, level: i32) -> EntityId {
    world.spawn_bundle(base("Shield", 0, 6, Callback::ApplyAegis).with(AegisEffect { value: 9 + level }))
}

// ---------------------------------------------------------------------------
// Procedural spells
// ---------------------------------------------------------------------------

/// Rolled stats of a generated spell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpellStats {
    pub damage: i32,
    pub range: i32,
    pub cooldown: i32,
}

/// Spend `budget` points over damage, range and cooldown reduction.
///
/// Everything starts at one point (range at two). Each remaining point is
/// lost with probability `waste_chance`, otherwise it goes to a random stat.
pub fn roll_stats(rng: &mut impl Rng, budget: i32, waste_chance: f64) -> SpellStats {
    let mut points = [1, 2, 1];
    let mut remaining = budget - points.iter().sum::<i32>();
    while remaining > 0 {
        if rng.gen::<f64>() > waste_chance {
            points[rng.gen_range(0..points.len())] += 1;
        }
        remaining -= 1;
    }
    SpellStats {
        damage: points[0] * 10,
        range: points[1],
        cooldown: (5 - points[2]).max(1),
    }
}

/// A random spell worth `budget` points.
///
/// One in four rolls is wasteful and becomes a bleed spell; the rest deal
/// direct damage credited to `player`. One in seven gains an area of effect
/// smaller than its range.
pub fn generate(world: &mut World, rng: &mut impl Rng, player: EntityId, budget: i32) -> EntityId {
    let wasteful = rng.gen_range(0..4) == 0;
    let stats = roll_stats(rng, budget, if wasteful { 0.4 } else { 0.2 });
    let name: String = (0..5).map(|_| char::from(rng.gen_range(b'a'..=b'z'))).collect();

    let mut bundle = if wasteful {
        base(&name, stats.range, stats.cooldown, Callback::ApplyBleed).with(BleedEffect {
            value: stats.damage,
        })
    } else {
        base(&name, stats.range, stats.cooldown, Callback::ApplyDamage)
            .with(DamageEffect::flat(stats.damage, Some(player)))
    };
    if rng.gen_range(0..7) == 0 && stats.range > 1 {
        bundle.add(EffectArea {
            radius: rng.gen_range(1..stats.range),
        });
    }
    let spell = world.spawn_bundle(bundle);
    tracing::debug!(spell = %spell, %name, ?stats, wasteful, "generated spell");
    spell
}
