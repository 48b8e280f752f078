//! Property tests for ECS operations.
//!
//! Random sequences of spawn/despawn/insert/remove are applied to a world
//! and checked against a plain shadow model after every step.

use std::collections::BTreeMap;

use maleficer_ecs::prelude::*;
use proptest::prelude::*;

#[derive(Debug, Clone, PartialEq)]
struct Pos {
    x: i32,
    y: i32,
}

#[derive(Debug, Clone, PartialEq)]
struct Hp(i32);

#[derive(Debug, Clone, PartialEq)]
struct Flying;

#[derive(Debug, Clone)]
enum EcsOp {
    SpawnPos(i32, i32),
    SpawnPosHp(i32, i32, i32),
    Despawn(usize),
    DespawnDeferred(usize),
    Flush,
    InsertHp(usize, i32),
    RemoveHp(usize),
    InsertFlying(usize),
}

fn ecs_op_strategy() -> impl Strategy<Value = EcsOp> {
    prop_oneof![
        (-50..50i32, -50..50i32).prop_map(|(x, y)| EcsOp::SpawnPos(x, y)),
        (-50..50i32, -50..50i32, 0..100i32).prop_map(|(x, y, hp)| EcsOp::SpawnPosHp(x, y, hp)),
        (0..100usize).prop_map(EcsOp::Despawn),
        (0..100usize).prop_map(EcsOp::DespawnDeferred),
        Just(EcsOp::Flush),
        (0..100usize, 0..100i32).prop_map(|(i, hp)| EcsOp::InsertHp(i, hp)),
        (0..100usize).prop_map(EcsOp::RemoveHp),
        (0..100usize).prop_map(EcsOp::InsertFlying),
    ]
}

/// What we expect each live entity to carry.
#[derive(Debug, Default, Clone)]
struct Shadow {
    hp: Option<i32>,
    flying: bool,
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    #[test]
    fn random_ops_match_shadow_model(ops in prop::collection::vec(ecs_op_strategy(), 1..60)) {
        let mut world = World::new();
        let mut shadow: BTreeMap<EntityId, Shadow> = BTreeMap::new();

        for op in ops {
            let alive: Vec<EntityId> = shadow.keys().copied().collect();
            let pick = |idx: usize| (!alive.is_empty()).then(|| alive[idx % alive.len()]);
            match op {
                EcsOp::SpawnPos(x, y) => {
                    let e = world.spawn_with(Pos { x, y });
                    shadow.insert(e, Shadow::default());
                }
                EcsOp::SpawnPosHp(x, y, hp) => {
                    let e = world.spawn_bundle(ComponentBundle::new().with(Pos { x, y }).with(Hp(hp)));
                    shadow.insert(e, Shadow { hp: Some(hp), flying: false });
                }
                EcsOp::Despawn(idx) => {
                    if let Some(e) = pick(idx) {
                        prop_assert!(world.despawn(e).is_ok());
                        shadow.remove(&e);
                    }
                }
                EcsOp::DespawnDeferred(idx) => {
                    if let Some(e) = pick(idx) {
                        world.despawn_deferred(e);
                        // Still alive until the flush.
                        prop_assert!(world.is_alive(e));
                    }
                }
                EcsOp::Flush => {
                    world.flush_deferred();
                    shadow.retain(|e, _| world.is_alive(*e));
                }
                EcsOp::InsertHp(idx, hp) => {
                    if let Some(e) = pick(idx) {
                        world.insert_component(e, Hp(hp)).unwrap();
                        shadow.get_mut(&e).unwrap().hp = Some(hp);
                    }
                }
                EcsOp::RemoveHp(idx) => {
                    if let Some(e) = pick(idx) {
                        let removed = world.remove_component::<Hp>(e).unwrap();
                        let expected = shadow.get_mut(&e).unwrap().hp.take();
                        prop_assert_eq!(removed.map(|h| h.0), expected);
                    }
                }
                EcsOp::InsertFlying(idx) => {
                    if let Some(e) = pick(idx) {
                        world.insert_component(e, Flying).unwrap();
                        shadow.get_mut(&e).unwrap().flying = true;
                    }
                }
            }

            prop_assert_eq!(world.entity_count(), shadow.len());

            let with_hp: Vec<EntityId> = world.query::<(&Pos, &Hp)>().map(|(e, _)| e).collect();
            let expected_hp: Vec<EntityId> = shadow
                .iter()
                .filter(|(_, s)| s.hp.is_some())
                .map(|(e, _)| *e)
                .collect();
            prop_assert_eq!(with_hp, expected_hp);

            let grounded = world.filter::<(&Pos,)>().exclude::<Flying>().len();
            prop_assert_eq!(grounded, shadow.values().filter(|s| !s.flying).count());
        }
    }

    /// After despawning, old ids stay stale even when their index is recycled.
    #[test]
    fn stale_ids_detected_after_despawn_and_recycle(
        spawn_count in 1..20usize,
        despawn_indices in prop::collection::vec(0..20usize, 1..10),
    ) {
        let mut world = World::new();
        let mut entities: Vec<EntityId> = (0..spawn_count)
            .map(|i| world.spawn_with(Pos { x: i as i32, y: 0 }))
            .collect();

        let mut stale_ids = Vec::new();
        for idx in despawn_indices {
            if !entities.is_empty() {
                let e = entities.remove(idx % entities.len());
                world.despawn(e).unwrap();
                stale_ids.push(e);
            }
        }

        for _ in 0..stale_ids.len() {
            entities.push(world.spawn_with(Pos { x: 99, y: 99 }));
        }

        for &stale in &stale_ids {
            prop_assert!(!world.is_alive(stale));
            prop_assert_eq!(world.get_component::<Pos>(stale), None);
            prop_assert!(world.insert_component(stale, Hp(1)).is_err());
        }
        for &e in &entities {
            prop_assert!(world.get_component::<Pos>(e).is_some());
        }
    }
}
