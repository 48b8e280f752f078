//! Monsters.
//!
//! Every monster blocks, has a name and hit points, and attacks by bumping:
//! its [`OnEnemyTurnTrigger`] applies its [`DamageEffect`] to whatever it
//! walked into.

use maleficer_ecs::prelude::*;

use crate::behavior::{Behavior, Callback};
use crate::components::{Blocking, Cooldown, DamageEffect, Enemy, Flying, Health, Named, Position, Visible};
use crate::present::{Color, Glyph};
use crate::trigger::OnEnemyTurnTrigger;

fn monster(name: &str, pos: Position, visible: Visible, hp: i32, damage: i32, enemy: Enemy) -> ComponentBundle {
    ComponentBundle::new()
        .with(pos)
        .with(visible)
        .with(Named::new(name))
        .with(Health::new(hp))
        .with(Blocking)
        .with(enemy)
        .with(DamageEffect::flat(damage, None))
        .with(OnEnemyTurnTrigger::new([Callback::ApplyDamage]))
}

/// Flutters about at random. Flying, so traps ignore it.
pub fn bat(world: &mut World, pos: Position) -> EntityId {
    let bundle = monster(
        "bat",
        pos,
        Visible::new(Glyph::Bat, Color::Brown),
        10,
        5,
        Enemy::new(Behavior::Wander),
    )
    .with(Flying);
    world.spawn_bundle(bundle)
}

pub fn skeleton(world: &mut World, pos: Position) -> EntityId {
    world.spawn_bundle(monster(
        "skeleton",
        pos,
        Visible::new(Glyph::Skeleton, Color::Beige),
        25,
        10,
        Enemy::new(Behavior::Melee).with_perception(10),
    ))
}

/// Throws bombs from a distance.
pub fn goblin(world: &mut World, pos: Position) -> EntityId {
    let bundle = monster(
        "goblin",
        pos,
        Visible::new(Glyph::Goblin, Color::DarkGreen),
        20,
        10,
        Enemy::new(Behavior::Bomber).with_perception(5),
    )
    .with(Cooldown::new(2));
    world.spawn_bundle(bundle)
}

/// Shoots the player when it can see them, walks closer otherwise.
pub fn warlock(world: &mut World, pos: Position) -> EntityId {
    let bundle = monster(
        "warlock",
        pos,
        Visible::new(Glyph::Warlock, Color::Indigo),
        15,
        5,
        Enemy::new(Behavior::Ranged).with_perception(3),
    )
    .with(Cooldown::new(1));
    world.spawn_bundle(bundle)
}

/// A fast melee unit: two steps per turn.
pub fn living_flame(world: &mut World, pos: Position) -> EntityId {
    world.spawn_bundle(monster(
        "living flame",
        pos,
        Visible::new(Glyph::Flame, Color::Orange),
        20,
        10,
        Enemy::new(Behavior::Melee).with_perception(5).with_speed(2),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monsters_attack_by_bumping() {
        let mut world = World::new();
        let spawned = [
            bat(&mut world, Position::new(0, 0)),
            skeleton(&mut world, Position::new(1, 0)),
            goblin(&mut world, Position::new(2, 0)),
            warlock(&mut world, Position::new(3, 0)),
            living_flame(&mut world, Position::new(4, 0)),
        ];
        for monster in spawned {
            assert!(world.has_component::<Blocking>(monster));
            assert_eq!(
                world.get_component::<OnEnemyTurnTrigger>(monster).map(|t| t.0.as_slice()),
                Some([Callback::ApplyDamage].as_slice())
            );
        }
        assert_eq!(world.get_component::<Cooldown>(spawned[2]).unwrap().turns, 3);
        assert_eq!(world.get_component::<Enemy>(spawned[4]).unwrap().speed, 2);
        assert!(world.has_component::<Flying>(spawned[0]));
    }
}
