//! Named spawnables, so events and level layouts can refer to content
//! without holding a constructor.

use maleficer_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::Position;
use crate::content::{item, npc};
use crate::error::GameResult;
use crate::game::Game;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Prefab {
    Bat,
    Skeleton,
    Goblin,
    Warlock,
    LivingFlame,
    Potion,
    Scroll,
    Bomb,
    Trap,
}

impl Prefab {
    /// What a random level is populated from.
    pub const POPULATION: [Prefab; 8] = [
        Self::Bat,
        Self::Skeleton,
        Self::Goblin,
        Self::Warlock,
        Self::LivingFlame,
        Self::Potion,
        Self::Scroll,
        Self::Trap,
    ];

    /// Build the entity at `pos` and index it on the board.
    pub fn spawn(self, game: &mut Game, pos: Position) -> GameResult<EntityId> {
        let entity = match self {
            Self::Bat => npc::bat(&mut game.world, pos),
            Self::Skeleton => npc::skeleton(&mut game.world, pos),
            Self::Goblin => npc::goblin(&mut game.world, pos),
            Self::Warlock => npc::warlock(&mut game.world, pos),
            Self::LivingFlame => npc::living_flame(&mut game.world, pos),
            Self::Potion => item::potion(&mut game.world, Some(pos)),
            Self::Scroll => {
                let player = game.player()?;
                item::scroll(&mut game.world, &mut game.rng, player, game.depth, Some(pos))
            }
            Self::Bomb => item::bomb(&mut game.world, pos),
            Self::Trap => item::trap(&mut game.world, pos),
        };
        game.board.add(entity, pos)?;
        tracing::debug!(prefab = ?self, entity = %entity, x = pos.x, y = pos.y, "spawned");
        Ok(entity)
    }
}
