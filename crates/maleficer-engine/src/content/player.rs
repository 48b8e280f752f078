//! The player character and their inventory.

use std::collections::BTreeMap;

use maleficer_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::{Blocking, Health, InInventory, Known, Named, Player, Position, Visible};
use crate::content::{item, spell};
use crate::error::{GameError, GameResult};
use crate::present::{Color, Glyph};

/// Starting kit chosen on the character select screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerClass {
    /// Firebolt and blink.
    Adept,
    /// Daze and lacerate, more hit points.
    Bloodmage,
}

impl PlayerClass {
    pub const ALL: [PlayerClass; 2] = [Self::Adept, Self::Bloodmage];

    pub fn label(self) -> &'static str {
        match self {
            Self::Adept => "Adept",
            Self::Bloodmage => "Bloodmage",
        }
    }
}

/// Spawn the player with the class's spells already known and
/// `potions` potions in the inventory.
pub fn spawn(
    world: &mut World,
    class: PlayerClass,
    pos: Position,
    potions: u32,
    max_spells: usize,
) -> GameResult<EntityId> {
    let (hp, color) = match class {
        PlayerClass::Adept => (80, Color::Green),
        PlayerClass::Bloodmage => (100, Color::Red),
    };
    let player = world.spawn_bundle(
        ComponentBundle::new()
            .with(Player)
            .with(Visible::new(Glyph::Player, color))
            .with(pos)
            .with(Health::new(hp))
            .with(Named::new("player"))
            .with(Blocking),
    );
    let spells = match class {
        PlayerClass::Adept => [spell::firebolt(world, player, 1), spell::blink(world, player, 1)],
        PlayerClass::Bloodmage => [spell::daze(world, 1), spell::lacerate(world, 1)],
    };
    for spell in spells {
        learn(world, spell, max_spells)?;
    }
    for _ in 0..potions {
        let potion = item::potion(world, None);
        world.insert_component(potion, InInventory)?;
    }
    tracing::info!(player = %player, class = class.label(), "player spawned");
    Ok(player)
}

/// Put `spell` in the lowest free slot in `1..=max_slots`.
pub fn learn(world: &mut World, spell: EntityId, max_slots: usize) -> GameResult<usize> {
    let taken: Vec<usize> = world
        .query::<(&Known,)>()
        .map(|(_, (known,))| known.slot)
        .collect();
    let slot = (1..=max_slots)
        .find(|slot| !taken.contains(slot))
        .ok_or_else(|| GameError::invalid("Max spells learned"))?;
    world.insert_component(spell, Known { slot })?;
    Ok(slot)
}

/// The spell castable from `slot`, if any.
pub fn spell_in_slot(world: &World, slot: usize) -> Option<EntityId> {
    world
        .query::<(&Known,)>()
        .find(|(_, (known,))| known.slot == slot)
        .map(|(entity, _)| entity)
}

/// Carried items grouped by name, in name order.
pub fn inventory_map(world: &World) -> Vec<(String, Vec<EntityId>)> {
    let mut grouped: BTreeMap<String, Vec<EntityId>> = BTreeMap::new();
    for (entity, (_, named)) in world.query::<(&InInventory, &Named)>() {
        grouped.entry(named.name.clone()).or_default().push(entity);
    }
    grouped.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_know_two_spells() {
        let mut world = World::new();
        let player = spawn(&mut world, PlayerClass::Adept, Position::new(1, 1), 2, 4).unwrap();
        assert_eq!(world.get_component::<Health>(player).unwrap().max, 80);
        assert!(spell_in_slot(&world, 1).is_some());
        assert!(spell_in_slot(&world, 2).is_some());
        assert!(spell_in_slot(&world, 3).is_none());
        let inventory = inventory_map(&world);
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory[0].0, "potion");
        assert_eq!(inventory[0].1.len(), 2);
    }

    #[test]
    fn learning_fills_the_lowest_gap() {
        let mut world = World::new();
        let a = world.spawn();
        let b = world.spawn();
        let c = world.spawn();
        assert_eq!(learn(&mut world, a, 2).unwrap(), 1);
        assert_eq!(learn(&mut world, b, 2).unwrap(), 2);
        let full = learn(&mut world, c, 2).unwrap_err();
        assert!(full.is_invalid_action());
        assert_eq!(full.to_string(), "Max spells learned");

        world.despawn(a).unwrap();
        assert_eq!(learn(&mut world, c, 2).unwrap(), 1);
    }
}
