//! Board cells.

use maleficer_ecs::prelude::*;

use crate::behavior::Callback;
use crate::components::{Blocking, Cell, Health, Named, OnStep, Position, Transparent, Visible, Wall};
use crate::present::{Color, Glyph};
use crate::trigger::OnStepTrigger;

pub fn floor(world: &mut World, x: i32, y: i32) -> EntityId {
    world.spawn_bundle(
        ComponentBundle::new()
            .with(Cell)
            .with(Position::new(x, y))
            .with(Visible::new(Glyph::Floor, Color::Floor))
            .with(Transparent),
    )
}

/// A wall cell. Breakable walls have one hit point and die like anything
/// else, leaving floor behind.
pub fn wall(world: &mut World, x: i32, y: i32, breakable: bool) -> EntityId {
    let glyph = if breakable { Glyph::BreakableWall } else { Glyph::Wall };
    let mut bundle = ComponentBundle::new()
        .with(Cell)
        .with(Position::new(x, y))
        .with(Visible::new(glyph, Color::LightGrey))
        .with(Blocking)
        .with(Wall);
    if breakable {
        bundle.add(Health::new(1));
        bundle.add(Named::new("wall"));
    }
    world.spawn_bundle(bundle)
}

/// The way down. Stepping here as the player queues the next level.
pub fn stairs(world: &mut World, pos: Position) -> EntityId {
    world.spawn_bundle(
        ComponentBundle::new()
            .with(Cell)
            .with(pos)
            .with(Visible::new(Glyph::Stairs, Color::LightGrey))
            .with(Transparent)
            .with(OnStep)
            .with(Named::new("stairs"))
            .with(OnStepTrigger::new([Callback::Descend])),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakable_walls_can_take_damage() {
        let mut world = World::new();
        let plain = wall(&mut world, 0, 0, false);
        let weak = wall(&mut world, 1, 0, true);
        assert!(!world.has_component::<Health>(plain));
        assert_eq!(world.get_component::<Health>(weak), Some(&Health::new(1)));
        assert_eq!(
            world.get_component::<Visible>(weak).map(|v| v.glyph),
            Some(Glyph::BreakableWall)
        );
    }

    #[test]
    fn stairs_are_walkable_cells() {
        let mut world = World::new();
        let down = stairs(&mut world, Position::new(2, 2));
        assert!(world.has_component::<Cell>(down));
        assert!(!world.has_component::<Blocking>(down));
        assert!(world.has_component::<OnStepTrigger>(down));
    }
}
