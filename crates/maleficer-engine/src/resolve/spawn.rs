//! Deferred construction: drained at the end of the level cycle, when no
//! other resolver is iterating the world.

use crate::error::GameResult;
use crate::event::Spawn;
use crate::game::Game;

pub fn resolve(game: &mut Game) -> GameResult<()> {
    while let Some(spawn) = game.queues.pop_spawn() {
        match spawn {
            Spawn::Prefab { prefab, pos } => {
                prefab.spawn(game, pos)?;
            }
            Spawn::NextLevel => game.next_level()?,
        }
    }
    let flushed = game.world.flush_deferred();
    if flushed > 0 {
        tracing::debug!(flushed, "deferred despawns flushed");
    }
    game.board.build_entity_cache(&game.world);
    Ok(())
}
