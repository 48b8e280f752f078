//! Movement resolution: collisions, bump attacks, pickups and step
//! triggers.

use maleficer_ecs::prelude::*;

use crate::components::{
    name_of, Blocking, Collectable, Crosshair, Enemy, Flying, Health, InInventory, OnStep, Player,
    Position, Target,
};
use crate::condition::{self, Condition};
use crate::error::GameResult;
use crate::event::Movement;
use crate::game::Game;
use crate::present::Color;
use crate::trigger::{self, OnEnemyTurnTrigger, OnStepTrigger};

pub fn resolve(game: &mut Game) -> GameResult<()> {
    while let Some(movement) = game.queues.pop_movement() {
        resolve_one(game, movement)?;
    }
    Ok(())
}

fn resolve_one(game: &mut Game, movement: Movement) -> GameResult<()> {
    let mover = movement.source;
    let Some(from) = game.world.get_component::<Position>(mover).copied() else {
        tracing::trace!(entity = %mover, "movement fizzled");
        return Ok(());
    };
    if condition::has(&game.world, mover, Condition::Stun) {
        tracing::debug!(entity = %mover, "stunned, movement discarded");
        return Ok(());
    }
    let dest = if movement.relative {
        from.offset(movement.x, movement.y)
    } else {
        Position::new(movement.x, movement.y)
    };
    if !game.board.in_bounds(dest.x, dest.y) {
        tracing::debug!(entity = %mover, x = dest.x, y = dest.y, "movement off the board cancelled");
        return Ok(());
    }

    let cursor = game.world.has_component::<Crosshair>(mover);
    if !cursor {
        let blockers: Vec<EntityId> = game
            .board
            .pieces_at(dest.x, dest.y)?
            .iter()
            .copied()
            .filter(|e| *e != mover && game.world.has_component::<Blocking>(*e))
            .collect();
        if !blockers.is_empty() {
            return bump(game, mover, dest, &blockers);
        }
    }

    game.board.relocate(mover, from, dest)?;
    game.world.insert_component(mover, dest)?;
    tracing::debug!(entity = %mover, x = dest.x, y = dest.y, "moved");
    if cursor {
        return Ok(());
    }
    arrive(game, mover, dest)
}

/// The mover walked into something solid and stays put.
fn bump(game: &mut Game, mover: EntityId, dest: Position, blockers: &[EntityId]) -> GameResult<()> {
    if game.world.has_component::<Enemy>(mover) {
        for &blocker in blockers {
            if !game.world.is_alive(mover) {
                break;
            }
            if game.world.has_component::<Health>(blocker) && !game.world.has_component::<Enemy>(blocker)
            {
                game.world.insert_component(mover, Target { target: blocker })?;
                trigger::dispatch::<OnEnemyTurnTrigger>(game, mover)?;
            }
        }
    } else if game.world.has_component::<Player>(mover) {
        let name = name_of(&game.world, blockers[0]);
        game.log.push(format!("You bump into {name}"));
        game.presenter.flash(dest.x, dest.y, None, Color::Red);
    }
    Ok(())
}

/// Interact with everything else at the destination.
fn arrive(game: &mut Game, mover: EntityId, dest: Position) -> GameResult<()> {
    let player = game.world.has_component::<Player>(mover);
    let flying = game.world.has_component::<Flying>(mover);
    let others: Vec<EntityId> = game
        .board
        .pieces_at(dest.x, dest.y)?
        .iter()
        .copied()
        .filter(|e| *e != mover)
        .collect();

    for other in others {
        if !game.world.is_alive(other) || !game.world.is_alive(mover) {
            continue;
        }
        if player && game.world.has_component::<Collectable>(other) {
            game.world.insert_component(other, InInventory)?;
            game.world.remove_component::<Position>(other)?;
            game.board.remove(other, dest)?;
            let name = name_of(&game.world, other);
            game.log.push(format!("You pick up {name}"));
        } else if !flying && game.world.has_component::<OnStep>(other) {
            game.world.insert_component(other, Target { target: mover })?;
            trigger::dispatch::<OnStepTrigger>(game, other)?;
        }
    }
    Ok(())
}
