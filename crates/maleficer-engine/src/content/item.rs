//! Items and hazards.

use std::collections::BTreeMap;

use maleficer_ecs::prelude::*;
use rand::Rng;

use crate::behavior::{Behavior, Callback};
use crate::components::{
    Aura, Collectable, DamageEffect, EffectArea, Enemy, HealEffect, Health, Learnable, Named,
    OnStep, Position, Visible,
};
use crate::condition::{Condition, State};
use crate::content::spell;
use crate::present::{Color, Glyph};
use crate::trigger::{OnDeathTrigger, OnEnemyTurnTrigger, OnStepTrigger, OnUseTrigger};

/// Heals two points. Placed on the board when `pos` is given, otherwise
/// left for the caller to put in the inventory.
pub fn potion(world: &mut World, pos: Option<Position>) -> EntityId {
    let mut bundle = ComponentBundle::new()
        .with(Visible::new(Glyph::Potion, Color::Green))
        .with(Named::new("potion"))
        .with(Collectable)
        .with(Health::new(1))
        .with(HealEffect { amount: 2 })
        .with(OnUseTrigger::new([Callback::ApplyHealing]));
    if let Some(pos) = pos {
        bundle.add(pos);
    }
    world.spawn_bundle(bundle)
}

/// Teaches a freshly generated spell whose budget grows with `depth`.
pub fn scroll(
    world: &mut World,
    rng: &mut impl Rng,
    player: EntityId,
    depth: u32,
    pos: Option<Position>,
) -> EntityId {
    let budget = 5 + depth as i32 * 5;
    let taught = spell::generate(world, rng, player, budget);
    let name = world
        .get_component::<Named>(taught)
        .map(|named| format!("{} scroll", named.name))
        .unwrap_or_else(|| "scroll".to_owned());
    let mut bundle = ComponentBundle::new()
        .with(Visible::new(Glyph::Scroll, Color::Magenta))
        .with(Named::new(name))
        .with(Collectable)
        .with(Health::new(1))
        .with(Learnable { spell: taught })
        .with(OnUseTrigger::new([Callback::ApplyLearn]));
    if let Some(pos) = pos {
        bundle.add(pos);
    }
    world.spawn_bundle(bundle)
}

/// A lit bomb. It dies on its second upkeep and blasts everything around
/// it, resolving the blast before anything else moves.
pub fn bomb(world: &mut World, pos: Position) -> EntityId {
    world.spawn_bundle(
        ComponentBundle::new()
            .with(pos)
            .with(Visible::new(Glyph::Bomb, Color::Red))
            .with(Named::new("bomb"))
            .with(Health::new(1))
            .with(Enemy::new(Behavior::Fuse))
            .with(EffectArea { radius: 1 })
            .with(Aura {
                radius: 1,
                color: Color::White,
            })
            .with(DamageEffect::flat(1, None))
            .with(OnDeathTrigger::new([Callback::ApplyDamage, Callback::ResolveDamageNow]))
            .with(OnEnemyTurnTrigger::new([Callback::AuraTick]))
            .with(State {
                map: BTreeMap::from([(Condition::Dying, 2)]),
            }),
    )
}

/// Hurts whatever walks onto it.
pub fn trap(world: &mut World, pos: Position) -> EntityId {
    world.spawn_bundle(
        ComponentBundle::new()
            .with(pos)
            .with(Visible::new(Glyph::Trap, Color::Red))
            .with(Named::new("trap"))
            .with(Health::new(1))
            .with(OnStep)
            .with(DamageEffect::flat(1, None))
            .with(OnStepTrigger::new([Callback::ApplyDamage])),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    #[test]
    fn scroll_is_named_after_its_spell() {
        let mut world = World::new();
        let player = world.spawn();
        let mut rng = Pcg64::seed_from_u64(1);
        let scroll = scroll(&mut world, &mut rng, player, 1, None);
        let spell = world.get_component::<Learnable>(scroll).unwrap().spell;
        let spell_name = &world.get_component::<Named>(spell).unwrap().name;
        assert_eq!(
            world.get_component::<Named>(scroll).unwrap().name,
            format!("{spell_name} scroll")
        );
        assert!(!world.has_component::<Position>(scroll));
    }

    #[test]
    fn bomb_is_already_dying() {
        let mut world = World::new();
        let bomb = bomb(&mut world, Position::new(1, 1));
        assert_eq!(crate::condition::get(&world, bomb, Condition::Dying), 2);
        assert_eq!(world.get_component::<Aura>(bomb).unwrap().color, Color::White);
    }
}
