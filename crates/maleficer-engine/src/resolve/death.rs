//! Death resolution.
//!
//! Death is derived state: before draining the queue, and again after
//! every entity it processes, the resolver sweeps for anything at zero
//! health and queues it. Deaths caused by death triggers (a bomb blast
//! killing a bat) are therefore caught in the same pass.

use maleficer_ecs::prelude::*;

use crate::components::{name_of, Cell, Health, Player, Position, Target};
use crate::content::tile;
use crate::error::GameResult;
use crate::event::Death;
use crate::game::Game;
use crate::location;
use crate::phase::Ontology;
use crate::trigger::{self, OnDeathTrigger};

pub fn resolve(game: &mut Game) -> GameResult<()> {
    sweep(game);
    while let Some(entity) = game.queues.pop_death() {
        if !game.world.is_alive(entity) {
            tracing::trace!(entity = %entity, "death fizzled");
            continue;
        }
        die(game, entity)?;
        sweep(game);
    }
    Ok(())
}

/// Queue everything at zero health. A dead player stays on the board for
/// the game-over screen and is skipped once the run has ended.
fn sweep(game: &mut Game) {
    let over = game.scheduler.active() == Ontology::GameOver;
    let zeroed: Vec<EntityId> = game
        .world
        .query::<(&Health,)>()
        .filter(|(_, (health,))| health.current <= 0)
        .map(|(entity, _)| entity)
        .filter(|entity| !(over && game.world.has_component::<Player>(*entity)))
        .collect();
    for entity in zeroed {
        game.queues.push(Death { entity });
    }
}

fn die(game: &mut Game, entity: EntityId) -> GameResult<()> {
    game.world.insert_component(entity, Target { target: entity })?;
    trigger::dispatch::<OnDeathTrigger>(game, entity)?;
    if !game.world.is_alive(entity) {
        return Ok(());
    }

    if game.world.has_component::<Player>(entity) {
        tracing::info!(entity = %entity, depth = game.depth, turn = game.turn, "player died");
        game.log.push("You die");
        game.scheduler.change_to(Ontology::GameOver, None);
        return Ok(());
    }

    let name = name_of(&game.world, entity);
    let pos = game.world.get_component::<Position>(entity).copied();
    if let (Some(pos), Ok(seen_from)) = (pos, location::player_position(&game.world)) {
        if location::euclidean_distance(pos, seen_from) <= f64::from(game.config.perception) {
            game.log.push(format!("{name} dies"));
        }
    }

    match pos {
        Some(pos) if game.world.has_component::<Cell>(entity) => {
            let floor = tile::floor(&mut game.world, pos.x, pos.y);
            game.board.set_cell(&mut game.world, pos.x, pos.y, floor)?;
            game.board.build_entity_cache(&game.world);
        }
        Some(pos) => {
            game.board.remove(entity, pos)?;
            game.world.despawn(entity)?;
        }
        None => game.world.despawn(entity)?,
    }
    tracing::debug!(entity = %entity, %name, "entity died");
    Ok(())
}
