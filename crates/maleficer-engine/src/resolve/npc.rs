//! The monsters' turn.
//!
//! Every enemy on the board evaluates its [`Behavior`](crate::behavior::Behavior)
//! in engine order. Steps are queued for the second movement pass; attacks
//! and throws happen immediately and queue their damage or spawns.


use crate::behavior::{self, Intent};
use crate::components::{Enemy, Position};
use crate::condition::{self, Condition};
use crate::error::GameResult;
use crate::event::Movement;
use crate::game::Game;
use crate::trigger::{self, OnEnemyTurnTrigger};

pub fn resolve(game: &mut Game) -> GameResult<()> {
    if game.player().is_err() {
        return Ok(());
    }
    let enemies: Vec<_> = game
        .world
        .query::<(&Enemy, &Position)>()
        .map(|(entity, (enemy, _))| (entity, enemy.behavior))
        .collect();

    for (entity, behavior) in enemies {
        if !game.world.is_alive(entity) {
            continue;
        }
        if condition::has(&game.world, entity, Condition::Stun) {
            tracing::trace!(entity = %entity, "stunned, skipping turn");
            continue;
        }
        let intent = behavior.evaluate(game, entity)?;
        tracing::trace!(entity = %entity, ?behavior, ?intent, "enemy turn");
        match intent {
            Intent::Nothing => {}
            Intent::Step { dx, dy, times } => {
                if (dx, dy) != (0, 0) {
                    for _ in 0..times {
                        game.queues.push(Movement::by(entity, dx, dy));
                    }
                }
            }
            Intent::Trigger => trigger::dispatch::<OnEnemyTurnTrigger>(game, entity)?,
            Intent::LobBomb => {
                behavior::lob_bomb(game, entity)?;
            }
            Intent::Fire => {
                behavior::fire_at_player(game, entity)?;
                trigger::dispatch::<OnEnemyTurnTrigger>(game, entity)?;
            }
        }
    }
    Ok(())
}
