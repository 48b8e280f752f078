//! Damage resolution.
//!
//! Drains the damage queue in order. Targets that died earlier in the turn
//! fizzle. A hit on a bare map cell is re-queued against every living
//! occupant of that cell. Otherwise Aegis absorbs first and health takes the
//! rest, clamped to `[0, max]`.
//!
//! Nothing here queues deaths: the death resolver sweeps for zero health.

use maleficer_ecs::prelude::*;

use crate::components::{name_of, Cell, Health, Position};
use crate::condition::{self, Condition};
use crate::error::GameResult;
use crate::event::Damage;
use crate::game::Game;

pub fn resolve(game: &mut Game) -> GameResult<()> {
    while let Some(damage) = game.queues.pop_damage() {
        resolve_one(game, damage)?;
    }
    Ok(())
}

fn resolve_one(game: &mut Game, damage: Damage) -> GameResult<()> {
    let target = damage.target;
    if !game.world.is_alive(target) {
        tracing::trace!(entity = %target, "damage fizzled");
        return Ok(());
    }

    if game.world.has_component::<Cell>(target) && !game.world.has_component::<Health>(target) {
        let Some(pos) = game.world.get_component::<Position>(target).copied() else {
            return Ok(());
        };
        let occupants: Vec<EntityId> = game
            .board
            .pieces_at(pos.x, pos.y)?
            .iter()
            .copied()
            .filter(|e| game.world.has_component::<Health>(*e))
            .collect();
        for occupant in occupants {
            game.queues.push(Damage {
                source: damage.source.clone(),
                target: occupant,
                amount: damage.amount,
            });
        }
        return Ok(());
    }

    if !game.world.has_component::<Health>(target) {
        tracing::trace!(entity = %target, "damage against something without health");
        return Ok(());
    }

    let target_name = name_of(&game.world, target);
    let mut amount = damage.amount;
    let shield = condition::get(&game.world, target, Condition::Aegis);
    if amount > 0 && shield > 0 {
        let absorbed = shield.min(amount);
        condition::grant(&mut game.world, target, Condition::Aegis, shield - absorbed)?;
        amount -= absorbed;
        game.log
            .push(format!("{target_name}'s aegis absorbs {absorbed} damage"));
    }

    if let Some(health) = game.world.get_component_mut::<Health>(target) {
        health.apply(amount);
        tracing::debug!(
            entity = %target,
            amount,
            current = health.current,
            max = health.max,
            source = %damage.source.name,
            "damage applied"
        );
    }

    let source = &damage.source.name;
    if amount < 0 {
        game.log
            .push(format!("{source} heals {target_name} for {}", -amount));
    } else if amount > 0 {
        game.log
            .push(format!("{source} hits {target_name} for {amount}"));
    }
    Ok(())
}
