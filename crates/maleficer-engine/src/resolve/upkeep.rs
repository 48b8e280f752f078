//! Once-per-tick condition upkeep.

use maleficer_ecs::prelude::*;

use crate::condition::{self, State};
use crate::error::GameResult;
use crate::game::Game;

/// Consume every pending tick. Each one advances the turn counter, applies
/// every active condition once and then decays them all.
pub fn resolve(game: &mut Game) -> GameResult<()> {
    while game.queues.take_tick() {
        game.turn += 1;
        let holders: Vec<EntityId> = game
            .world
            .query::<(&State,)>()
            .map(|(entity, _)| entity)
            .collect();
        for entity in holders {
            if !game.world.is_alive(entity) {
                continue;
            }
            for (kind, value) in condition::active(&game.world, entity) {
                condition::apply(game, entity, kind, value)?;
            }
            condition::decay(&mut game.world, entity);
        }
        tracing::debug!(turn = game.turn, "upkeep");
    }
    Ok(())
}
