//! What entities do: effect callbacks and enemy behaviours.
//!
//! [`Callback`] is the closed set of reactions a trigger list can hold. Most
//! read the holder's [`Target`] and one of its effect components and queue
//! events; none of them resolve damage or movement inline except
//! [`Callback::ResolveDamageNow`].
//!
//! [`Behavior`] is an enemy's turn policy, evaluated by the NPC-turn unit.

use maleficer_ecs::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::{
    name_of, position_of, AegisEffect, Aura, BleedEffect, Cell, Cooldown, Crosshair,
    DamageEffect, EffectArea, HealEffect, Health, Learnable, MoveEffect, Position,
    PushEffect, StunEffect, Target,
};
use crate::condition::{self, Condition};
use crate::content::player;
use crate::content::prefab::Prefab;
use crate::error::GameResult;
use crate::event::{Animation, Damage, DamageSource, Flash, Movement, Spawn};
use crate::game::Game;
use crate::location;
use crate::phase::Unit;
use crate::present::{Color, Glyph};

// ---------------------------------------------------------------------------
// Callback
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Callback {
    /// Put the holder's own ability on cooldown.
    ApplyCooldown,
    ApplyDamage,
    ApplyHealing,
    ApplyBleed,
    ApplyStun,
    ApplyAegis,
    /// Move the effect's subject to the crosshair.
    ApplyMove,
    ApplyPush,
    /// Teach the spell carried by a scroll.
    ApplyLearn,
    LobBomb,
    FireAtPlayer,
    /// Escalate the holder's aura colour.
    AuraTick,
    /// Queue the next level if the player is the one who stepped here.
    Descend,
    /// Drain the damage queue immediately, out of turn order.
    ResolveDamageNow,
}

impl Callback {
    pub fn invoke(self, game: &mut Game, holder: EntityId) -> GameResult<()> {
        match self {
            Self::ApplyCooldown => apply_cooldown(game, holder),
            Self::ApplyDamage => apply_damage(game, holder),
            Self::ApplyHealing => apply_healing(game, holder),
            Self::ApplyBleed => {
                let Some(effect) = game.world.get_component::<BleedEffect>(holder).copied() else {
                    return Ok(());
                };
                grant_to_affected(game, holder, Condition::Bleed, effect.value)
            }
            Self::ApplyStun => {
                let Some(effect) = game.world.get_component::<StunEffect>(holder).copied() else {
                    return Ok(());
                };
                grant_to_affected(game, holder, Condition::Stun, effect.value)
            }
            Self::ApplyAegis => apply_aegis(game, holder),
            Self::ApplyMove => apply_move(game, holder),
            Self::ApplyPush => apply_push(game, holder),
            Self::ApplyLearn => apply_learn(game, holder),
            Self::LobBomb => lob_bomb(game, holder).map(|_| ()),
            Self::FireAtPlayer => fire_at_player(game, holder),
            Self::AuraTick => {
                if let Some(aura) = game.world.get_component_mut::<Aura>(holder) {
                    aura.color = match aura.color {
                        Color::White => Color::LightRed,
                        _ => Color::BloodRed,
                    };
                }
                Ok(())
            }
            Self::Descend => {
                let player = game.player()?;
                if target_of(&game.world, holder) == Some(player) {
                    game.queues.push(Spawn::NextLevel);
                }
                Ok(())
            }
            Self::ResolveDamageNow => game.oneshot(Unit::Damage),
        }
    }
}

/// The holder's live [`Target`], if any.
pub fn target_of(world: &World, holder: EntityId) -> Option<EntityId> {
    world
        .get_component::<Target>(holder)
        .map(|t| t.target)
        .filter(|t| world.is_alive(*t))
}

/// Entities an effect held by `holder` reaches when aimed at `target`.
///
/// Without an [`EffectArea`] that is everything on the target's coordinate.
/// With one, it is everything within the radius except the holder.
pub fn collect_affected(game: &Game, holder: EntityId, target: EntityId) -> GameResult<Vec<EntityId>> {
    let pos = position_of(&game.world, target)?;
    let Some(area) = game.world.get_component::<EffectArea>(holder).copied() else {
        return Ok(game.board.pieces_at(pos.x, pos.y)?.iter().copied().collect());
    };
    let mut affected = Vec::new();
    for (x, y) in location::coords_within_radius(&game.board, pos, area.radius) {
        affected.extend(
            game.board
                .pieces_at(x, y)?
                .iter()
                .copied()
                .filter(|e| *e != holder),
        );
    }
    Ok(affected)
}

/// Whether an effect should spread instead of hitting `target` alone.
fn spreads(world: &World, holder: EntityId, target: EntityId) -> bool {
    world.has_component::<Cell>(target) || world.has_component::<EffectArea>(holder)
}

fn roll(game: &mut Game, effect: DamageEffect) -> i32 {
    match effect.die_type {
        Some(sides) if sides > 0 => (0..effect.amount.max(0))
            .map(|_| game.rng.gen_range(1..=sides) as i32)
            .sum(),
        _ => effect.amount,
    }
}

pub fn apply_cooldown(game: &mut Game, holder: EntityId) -> GameResult<()> {
    if let Some(cooldown) = game.world.get_component::<Cooldown>(holder).copied() {
        condition::grant(&mut game.world, holder, Condition::Cooldown, cooldown.turns)?;
    }
    Ok(())
}

pub fn apply_damage(game: &mut Game, holder: EntityId) -> GameResult<()> {
    let Some(target) = target_of(&game.world, holder) else {
        return Ok(());
    };
    let Some(effect) = game.world.get_component::<DamageEffect>(holder).copied() else {
        return Ok(());
    };
    let source = DamageSource::of(&game.world, effect.source.unwrap_or(holder));
    let amount = roll(game, effect);

    if spreads(&game.world, holder, target) {
        for entity in collect_affected(game, holder, target)? {
            if game.world.has_component::<Health>(entity) {
                game.queues.push(Damage {
                    source: source.clone(),
                    target: entity,
                    amount,
                });
            }
        }
    } else {
        game.queues.push(Damage {
            source,
            target,
            amount,
        });
    }
    Ok(())
}

pub fn apply_healing(game: &mut Game, holder: EntityId) -> GameResult<()> {
    let Some(target) = target_of(&game.world, holder) else {
        return Ok(());
    };
    let Some(effect) = game.world.get_component::<HealEffect>(holder).copied() else {
        return Ok(());
    };
    game.queues.push(Damage {
        source: DamageSource::of(&game.world, holder),
        target,
        amount: -effect.amount,
    });
    Ok(())
}

fn grant_to_affected(game: &mut Game, holder: EntityId, kind: Condition, value: i32) -> GameResult<()> {
    let Some(target) = target_of(&game.world, holder) else {
        return Ok(());
    };
    if !spreads(&game.world, holder, target) {
        return condition::grant(&mut game.world, target, kind, value);
    }
    for entity in collect_affected(game, holder, target)? {
        if game.world.has_component::<Health>(entity) {
            condition::grant(&mut game.world, entity, kind, value)?;
        }
    }
    Ok(())
}

fn apply_aegis(game: &mut Game, holder: EntityId) -> GameResult<()> {
    let Some(target) = target_of(&game.world, holder) else {
        return Ok(());
    };
    let Some(effect) = game.world.get_component::<AegisEffect>(holder).copied() else {
        return Ok(());
    };
    condition::grant(&mut game.world, target, Condition::Aegis, effect.value)?;
    let name = name_of(&game.world, target);
    game.log.push(format!("{name} is shielded for {}", effect.value));
    Ok(())
}

fn apply_move(game: &mut Game, holder: EntityId) -> GameResult<()> {
    let Some(effect) = game.world.get_component::<MoveEffect>(holder).copied() else {
        return Ok(());
    };
    let (_, (_, pos)) = game.world.filter::<(&Crosshair, &Position)>().single()?;
    let pos = *pos;
    game.queues.push(Movement::to(effect.target, pos.x, pos.y));
    Ok(())
}

fn apply_push(game: &mut Game, holder: EntityId) -> GameResult<()> {
    let Some(effect) = game.world.get_component::<PushEffect>(holder).copied() else {
        return Ok(());
    };
    let Some(target) = target_of(&game.world, holder) else {
        return Ok(());
    };
    let origin = position_of(&game.world, effect.source)?;
    let mut frames = Vec::new();
    for entity in collect_affected(game, holder, target)? {
        if entity == effect.source
            || game.world.has_component::<Cell>(entity)
            || game.world.has_component::<Crosshair>(entity)
        {
            continue;
        }
        let Some(pos) = game.world.get_component::<Position>(entity).copied() else {
            continue;
        };
        let (x, y) = location::push_coords(origin, pos, effect.distance);
        game.queues.push(Movement::to(entity, x, y));
        if game.board.in_bounds(x, y) {
            frames.push(Flash::at(Position::new(x, y), None, Color::Orange));
        }
    }
    game.queues.push(Animation::new(frames));
    Ok(())
}

fn apply_learn(game: &mut Game, holder: EntityId) -> GameResult<()> {
    let Some(learnable) = game.world.get_component::<Learnable>(holder).copied() else {
        return Ok(());
    };
    let slot = player::learn(&mut game.world, learnable.spell, game.config.max_known_spells)?;
    apply_cooldown(game, learnable.spell)?;
    let name = name_of(&game.world, learnable.spell);
    game.log.push(format!("You learn {name} in slot {slot}"));
    Ok(())
}

/// Throw a bomb next to the player, if one can land there.
///
/// Tries the player's neighbours in random order and picks the first that
/// is unblocked and reachable by a straight throw. Returns whether a bomb
/// was thrown.
pub fn lob_bomb(game: &mut Game, holder: EntityId) -> GameResult<bool> {
    let player = game.player()?;
    if !location::can_see(&game.world, &game.board, holder, player)? {
        return Ok(false);
    }
    let player_pos = position_of(&game.world, player)?;
    let mut candidates = location::neighbor_coords(player_pos);
    candidates.shuffle(&mut game.rng);

    for (x, y) in candidates {
        let Some(cell) = game.board.get_cell(x, y) else {
            continue;
        };
        if game.board.has_blocker(&game.world, x, y) {
            continue;
        }
        let (dest, trace) = location::trace_ray(&game.world, &game.board, holder, cell)?;
        if dest != cell {
            continue;
        }
        game.queues
            .push(Animation::line(&trace, Some(Glyph::Bomb), Color::Red));
        game.queues.push(Spawn::Prefab {
            prefab: Prefab::Bomb,
            pos: Position::new(x, y),
        });
        apply_cooldown(game, holder)?;
        tracing::debug!(thrower = %holder, x, y, "bomb lobbed");
        return Ok(true);
    }
    Ok(false)
}

/// Aim at the player: the first thing the ray hits becomes the holder's
/// target and the holder's ability goes on cooldown.
pub fn fire_at_player(game: &mut Game, holder: EntityId) -> GameResult<()> {
    let player = game.player()?;
    let (dest, trace) = location::trace_ray(&game.world, &game.board, holder, player)?;
    game.queues
        .push(Animation::line(&trace, Some(Glyph::MagicMissile), Color::Blue));
    game.world.insert_component(holder, Target { target: dest })?;
    apply_cooldown(game, holder)
}

// ---------------------------------------------------------------------------
// Behavior
// ---------------------------------------------------------------------------

/// An enemy's policy for its own turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Behavior {
    /// Never acts.
    Idle,
    /// Fires its enemy-turn triggers every turn without moving.
    Fuse,
    /// Steps in a random direction.
    Wander,
    /// Closes in on a visible player and attacks by bumping.
    Melee,
    /// Lobs bombs at a visible player while off cooldown.
    Bomber,
    /// Shoots a visible player while off cooldown, otherwise closes in.
    Ranged,
}

/// What an enemy chose to do this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Nothing,
    Step { dx: i32, dy: i32, times: i32 },
    Trigger,
    LobBomb,
    Fire,
}

impl Behavior {
    /// Decide this turn's intent for `entity`. Pure apart from RNG draws.
    pub fn evaluate(self, game: &mut Game, entity: EntityId) -> GameResult<Intent> {
        let Some(enemy) = game.world.get_component::<crate::components::Enemy>(entity).cloned() else {
            return Ok(Intent::Nothing);
        };
        let ready = !condition::has(&game.world, entity, Condition::Cooldown);
        match self {
            Self::Idle => Ok(Intent::Nothing),
            Self::Fuse => Ok(Intent::Trigger),
            Self::Wander => {
                let pos = position_of(&game.world, entity)?;
                let choice = location::neighbor_coords(pos)
                    .choose(&mut game.rng)
                    .copied()
                    .unwrap_or(pos.as_tuple());
                Ok(Intent::Step {
                    dx: choice.0 - pos.x,
                    dy: choice.1 - pos.y,
                    times: 1,
                })
            }
            Self::Melee => Ok(approach(game, entity, &enemy)?.unwrap_or(Intent::Nothing)),
            Self::Bomber => {
                if ready && notices_player(game, entity, &enemy)? {
                    Ok(Intent::LobBomb)
                } else {
                    Ok(Intent::Nothing)
                }
            }
            Self::Ranged => {
                if ready && notices_player(game, entity, &enemy)? {
                    Ok(Intent::Fire)
                } else {
                    Ok(approach(game, entity, &enemy)?.unwrap_or(Intent::Nothing))
                }
            }
        }
    }
}

/// Within perception and in line of sight.
fn notices_player(game: &Game, entity: EntityId, enemy: &crate::components::Enemy) -> GameResult<bool> {
    let Ok(player) = game.player() else {
        return Ok(false);
    };
    let from = position_of(&game.world, entity)?;
    let to = position_of(&game.world, player)?;
    if location::euclidean_distance(from, to) > f64::from(enemy.perception) {
        return Ok(false);
    }
    location::can_see(&game.world, &game.board, entity, player)
}

fn approach(game: &Game, entity: EntityId, enemy: &crate::components::Enemy) -> GameResult<Option<Intent>> {
    if !notices_player(game, entity, enemy)? {
        return Ok(None);
    }
    let player = game.player()?;
    let from = position_of(&game.world, entity)?;
    let to = position_of(&game.world, player)?;
    let (dx, dy) = location::step_towards(from, to);
    Ok(Some(Intent::Step {
        dx,
        dy,
        times: enemy.speed.max(1),
    }))
}
