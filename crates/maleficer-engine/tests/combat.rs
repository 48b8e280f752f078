//! Integration tests for the resolvers: damage, conditions, movement,
//! death and the monster behaviours that feed them.
//!
//! Each test builds a small open arena, places what it needs, queues
//! events directly and drains them with `Game::oneshot`.

use maleficer_engine::behavior;
use maleficer_engine::condition;
use maleficer_engine::prelude::*;
use maleficer_engine::trigger;

fn arena(seed: u64) -> Game {
    let mut game = Game::new(GameConfig::headless(seed))
        .unwrap()
        .with_map_source(ArenaMap::new().without_stairs());
    game.start_run(PlayerClass::Adept).unwrap();
    game
}

fn health(game: &Game, entity: EntityId) -> i32 {
    game.world().get_component::<Health>(entity).unwrap().current
}

fn hit(game: &mut Game, target: EntityId, amount: i32) {
    game.queues_mut().push(Damage {
        source: DamageSource::bleed(),
        target,
        amount,
    });
    game.oneshot(Unit::Damage).unwrap();
}

// ---------------------------------------------------------------------------
// Damage
// ---------------------------------------------------------------------------

#[test]
fn damage_and_healing_clamp_to_the_health_range() {
    let mut game = arena(1);
    let skeleton = Prefab::Skeleton.spawn(&mut game, Position::new(5, 5)).unwrap();

    hit(&mut game, skeleton, 30);
    assert_eq!(health(&game, skeleton), 0);
    hit(&mut game, skeleton, -30);
    assert_eq!(health(&game, skeleton), 25);

    hit(&mut game, skeleton, 10);
    hit(&mut game, skeleton, -10);
    assert_eq!(health(&game, skeleton), 25);
}

#[test]
fn aegis_absorbs_smaller_hits_completely() {
    let mut game = arena(1);
    let player = game.player().unwrap();
    condition::grant(game.world_mut(), player, Condition::Aegis, 10).unwrap();

    hit(&mut game, player, 4);
    assert_eq!(health(&game, player), 80);
    assert_eq!(condition::get(game.world(), player, Condition::Aegis), 6);
    assert!(game.log().contains("player's aegis absorbs 4 damage"));
}

#[test]
fn aegis_lets_the_overflow_through() {
    let mut game = arena(1);
    let player = game.player().unwrap();
    condition::grant(game.world_mut(), player, Condition::Aegis, 6).unwrap();

    hit(&mut game, player, 9);
    assert_eq!(health(&game, player), 77);
    assert!(!condition::has(game.world(), player, Condition::Aegis));
}

#[test]
fn damage_against_a_despawned_entity_fizzles() {
    let mut game = arena(1);
    let bat = Prefab::Bat.spawn(&mut game, Position::new(4, 4)).unwrap();
    game.queues_mut().push(Damage {
        source: DamageSource::bleed(),
        target: bat,
        amount: 3,
    });
    game.board_mut().remove(bat, Position::new(4, 4)).unwrap();
    game.world_mut().despawn(bat).unwrap();

    game.oneshot(Unit::Damage).unwrap();
    assert_eq!(game.queues().pending_damage(), 0);
}

#[test]
fn damage_on_a_bare_cell_reaches_its_occupants() {
    let mut game = arena(1);
    let goblin = Prefab::Goblin.spawn(&mut game, Position::new(6, 6)).unwrap();
    let cell = game.board().cell_at(6, 6).unwrap();

    hit(&mut game, cell, 7);
    assert_eq!(health(&game, goblin), 13);
}

#[test]
fn breakable_walls_crumble_into_floor() {
    let mut game = Game::new(GameConfig::headless(1))
        .unwrap()
        .with_map_source(ArenaMap::new().with_wall(Position::new(3, 3), true));
    game.start_run(PlayerClass::Adept).unwrap();
    let wall = game.board().cell_at(3, 3).unwrap();
    assert!(game.board().has_blocker(game.world(), 3, 3));

    hit(&mut game, wall, 1);
    game.oneshot(Unit::Death).unwrap();
    assert!(!game.world().is_alive(wall));
    assert!(!game.board().has_blocker(game.world(), 3, 3));
}

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

#[test]
fn bleed_lasts_exactly_its_magnitude() {
    let mut game = arena(1);
    let skeleton = Prefab::Skeleton.spawn(&mut game, Position::new(5, 5)).unwrap();
    condition::grant(game.world_mut(), skeleton, Condition::Bleed, 3).unwrap();

    for _ in 0..2 {
        game.queues_mut().push(Tick);
        game.oneshot(Unit::Upkeep).unwrap();
    }
    assert_eq!(condition::get(game.world(), skeleton, Condition::Bleed), 1);

    game.queues_mut().push(Tick);
    game.oneshot(Unit::Upkeep).unwrap();
    assert!(!condition::has(game.world(), skeleton, Condition::Bleed));

    game.oneshot(Unit::Damage).unwrap();
    assert_eq!(health(&game, skeleton), 25 - (3 + 2 + 1));
    assert_eq!(game.turn(), 3);
}

#[test]
fn upkeep_without_a_tick_does_nothing() {
    let mut game = arena(1);
    let player = game.player().unwrap();
    condition::grant(game.world_mut(), player, Condition::Stun, 2).unwrap();
    game.oneshot(Unit::Upkeep).unwrap();
    assert_eq!(condition::get(game.world(), player, Condition::Stun), 2);
}

#[test]
fn bombs_explode_on_their_second_upkeep() {
    let mut game = arena(1);
    let bomb = Prefab::Bomb.spawn(&mut game, Position::new(5, 5)).unwrap();
    let bat = Prefab::Bat.spawn(&mut game, Position::new(6, 5)).unwrap();

    for _ in 0..2 {
        game.queues_mut().push(Tick);
        game.oneshot(Unit::Upkeep).unwrap();
        game.oneshot(Unit::Death).unwrap();
    }
    assert!(!game.world().is_alive(bomb));
    // The blast is resolved by the death trigger itself.
    assert_eq!(health(&game, bat), 9);
}

// ---------------------------------------------------------------------------
// Movement
// ---------------------------------------------------------------------------

#[test]
fn blocked_movement_leaves_the_mover_in_place() {
    let mut game = arena(1);
    let player = game.player().unwrap();
    Prefab::Skeleton.spawn(&mut game, Position::new(2, 1)).unwrap();

    game.queues_mut().push(Movement::by(player, 1, 0));
    game.oneshot(Unit::Movement).unwrap();
    assert_eq!(
        game.world().get_component::<Position>(player),
        Some(&Position::new(1, 1))
    );
    assert!(game.log().contains("You bump into skeleton"));
}

#[test]
fn open_movement_updates_position_and_index() {
    let mut game = arena(1);
    let player = game.player().unwrap();

    game.queues_mut().push(Movement::by(player, 0, 1));
    game.oneshot(Unit::Movement).unwrap();
    assert_eq!(
        game.world().get_component::<Position>(player),
        Some(&Position::new(1, 2))
    );
    assert!(game.board().pieces_at(1, 2).unwrap().contains(&player));
    assert!(!game.board().pieces_at(1, 1).unwrap().contains(&player));
}

#[test]
fn movement_is_resolved_first_in_first_out() {
    let mut game = arena(1);
    let player = game.player().unwrap();
    let bat = Prefab::Bat.spawn(&mut game, Position::new(3, 1)).unwrap();

    // Both want (2, 1); the player asked first.
    game.queues_mut().push(Movement::by(player, 1, 0));
    game.queues_mut().push(Movement::by(bat, -1, 0));
    game.oneshot(Unit::Movement).unwrap();
    assert_eq!(game.world().get_component::<Position>(player), Some(&Position::new(2, 1)));
    assert_eq!(game.world().get_component::<Position>(bat), Some(&Position::new(3, 1)));
}

#[test]
fn stunned_movers_stay_put() {
    let mut game = arena(1);
    let player = game.player().unwrap();
    condition::grant(game.world_mut(), player, Condition::Stun, 1).unwrap();
    game.queues_mut().push(Movement::by(player, 1, 0));
    game.oneshot(Unit::Movement).unwrap();
    assert_eq!(game.world().get_component::<Position>(player), Some(&Position::new(1, 1)));
}

#[test]
fn monsters_attack_what_they_bump_into() {
    let mut game = arena(1);
    let player = game.player().unwrap();
    let skeleton = Prefab::Skeleton.spawn(&mut game, Position::new(2, 1)).unwrap();

    game.queues_mut().push(Movement::by(skeleton, -1, 0));
    game.oneshot(Unit::Movement).unwrap();
    game.oneshot(Unit::Damage).unwrap();
    assert_eq!(health(&game, player), 70);
    assert!(game.log().contains("skeleton hits player for 10"));
    assert!(!game.world().has_component::<Target>(skeleton));
}

#[test]
fn traps_hurt_walkers_but_not_flyers() {
    let mut game = arena(1);
    let player = game.player().unwrap();
    Prefab::Trap.spawn(&mut game, Position::new(2, 1)).unwrap();
    Prefab::Trap.spawn(&mut game, Position::new(4, 3)).unwrap();
    let bat = Prefab::Bat.spawn(&mut game, Position::new(3, 3)).unwrap();

    game.queues_mut().push(Movement::by(player, 1, 0));
    game.queues_mut().push(Movement::by(bat, 1, 0));
    game.oneshot(Unit::Movement).unwrap();
    game.oneshot(Unit::Damage).unwrap();
    assert_eq!(health(&game, player), 79);
    assert_eq!(game.world().get_component::<Position>(bat), Some(&Position::new(4, 3)));
    assert_eq!(health(&game, bat), 10);
}

#[test]
fn the_player_picks_up_collectables() {
    let mut game = arena(1);
    let player = game.player().unwrap();
    let potion = Prefab::Potion.spawn(&mut game, Position::new(2, 1)).unwrap();

    game.queues_mut().push(Movement::by(player, 1, 0));
    game.oneshot(Unit::Movement).unwrap();
    assert!(game.world().has_component::<InInventory>(potion));
    assert!(!game.world().has_component::<Position>(potion));
    assert!(!game.board().pieces_at(2, 1).unwrap().contains(&potion));
    assert!(game.log().contains("You pick up potion"));
}

// ---------------------------------------------------------------------------
// Death
// ---------------------------------------------------------------------------

#[test]
fn death_is_dispatched_once_per_entity() {
    let mut game = arena(1);
    let doomed = game.world_mut().spawn_bundle(
        ComponentBundle::new()
            .with(Position::new(5, 5))
            .with(Health::new(3))
            .with(DamageEffect::flat(5, None))
            .with(OnDeathTrigger::new([Callback::ApplyDamage])),
    );
    game.board_mut().add(doomed, Position::new(5, 5)).unwrap();

    game.queues_mut().push(Death { entity: doomed });
    game.queues_mut().push(Death { entity: doomed });
    game.oneshot(Unit::Death).unwrap();

    assert!(!game.world().is_alive(doomed));
    // Each dispatch queues one hit against the dying entity itself.
    assert_eq!(game.queues().pending_damage(), 1);
    assert!(!game.board().pieces_at(5, 5).unwrap().contains(&doomed));
}

#[test]
fn zero_health_is_swept_into_death() {
    let mut game = arena(1);
    let bat = Prefab::Bat.spawn(&mut game, Position::new(4, 1)).unwrap();
    hit(&mut game, bat, 10);
    assert!(game.world().is_alive(bat));
    game.oneshot(Unit::Death).unwrap();
    assert!(!game.world().is_alive(bat));
    assert!(game.log().contains("bat dies"));
}

#[test]
fn player_death_ends_the_run() {
    let mut game = arena(1);
    let player = game.player().unwrap();
    game.world_mut().get_component_mut::<Health>(player).unwrap().current = 0;

    game.oneshot(Unit::Death).unwrap();
    assert_eq!(game.phase(), Ontology::GameOver);
    assert_eq!(game.advance().unwrap(), Step::Awaiting(Ontology::GameOver));
    // A second sweep does not re-kill the corpse.
    game.oneshot(Unit::Death).unwrap();
    assert_eq!(game.queues().pending_deaths(), 0);
}

// ---------------------------------------------------------------------------
// Callbacks and behaviours
// ---------------------------------------------------------------------------

#[test]
fn casting_a_damage_spell_hits_for_its_amount() {
    let mut game = arena(1);
    let player = game.player().unwrap();
    let skeleton = Prefab::Skeleton.spawn(&mut game, Position::new(3, 1)).unwrap();
    let spell = game.world_mut().spawn_bundle(
        ComponentBundle::new()
            .with(Named::new("zap"))
            .with(Spell { target_range: 5 })
            .with(Cooldown::new(1))
            .with(DamageEffect::flat(5, Some(player)))
            .with(OnUseTrigger::new([Callback::ApplyCooldown, Callback::ApplyDamage])),
    );
    let lines = game.log().len();

    game.world_mut()
        .insert_component(spell, Target { target: skeleton })
        .unwrap();
    trigger::dispatch::<OnUseTrigger>(&mut game, spell).unwrap();
    game.oneshot(Unit::Damage).unwrap();

    assert_eq!(health(&game, skeleton), 20);
    assert_eq!(game.log().len(), lines + 1);
    assert_eq!(game.log().last(), Some("player hits skeleton for 5"));
    assert_eq!(condition::get(game.world(), spell, Condition::Cooldown), 2);
    assert!(!game.world().has_component::<Target>(spell));
}

#[test]
fn goblin_lobs_a_bomb_next_to_the_player() {
    let mut game = arena(7);
    let player_pos = Position::new(1, 1);
    let goblin = Prefab::Goblin.spawn(&mut game, Position::new(4, 1)).unwrap();

    assert!(behavior::lob_bomb(&mut game, goblin).unwrap());
    assert_eq!(condition::get(game.world(), goblin, Condition::Cooldown), 3);
    assert_eq!(game.queues().pending_spawns(), 1);

    game.oneshot(Unit::Spawn).unwrap();
    let (bomb, (_, pos)) = game.world().filter::<(&Aura, &Position)>().single().unwrap();
    assert!((pos.x - player_pos.x).abs() <= 1 && (pos.y - player_pos.y).abs() <= 1);
    assert!(game.board().pieces_at(pos.x, pos.y).unwrap().contains(&bomb));
}

#[test]
fn goblins_on_cooldown_hold_their_fire() {
    let mut game = arena(7);
    let goblin = Prefab::Goblin.spawn(&mut game, Position::new(4, 1)).unwrap();
    condition::grant(game.world_mut(), goblin, Condition::Cooldown, 2).unwrap();

    game.oneshot(Unit::NpcTurn).unwrap();
    assert_eq!(game.queues().pending_spawns(), 0);
}

#[test]
fn warlocks_shoot_what_is_in_the_way() {
    let mut game = Game::new(GameConfig::headless(3))
        .unwrap()
        .with_map_source(ArenaMap::new().without_stairs().with_wall(Position::new(2, 1), true));
    game.start_run(PlayerClass::Adept).unwrap();
    let warlock = Prefab::Warlock.spawn(&mut game, Position::new(3, 1)).unwrap();
    let wall = game.board().cell_at(2, 1).unwrap();

    // Behind a breakable wall the warlock cannot see the player, so it
    // walks instead of shooting.
    game.oneshot(Unit::NpcTurn).unwrap();
    assert_eq!(game.queues().pending_movement(), 0);

    behavior::fire_at_player(&mut game, warlock).unwrap();
    trigger::dispatch::<OnEnemyTurnTrigger>(&mut game, warlock).unwrap();
    game.oneshot(Unit::Damage).unwrap();
    assert_eq!(health(&game, wall), 0);
    assert_eq!(condition::get(game.world(), warlock, Condition::Cooldown), 2);
}

#[test]
fn learning_past_the_cap_is_an_invalid_action() {
    let mut config = GameConfig::headless(1);
    config.max_known_spells = 2;
    let mut game = Game::new(config)
        .unwrap()
        .with_map_source(ArenaMap::new());
    game.start_run(PlayerClass::Bloodmage).unwrap();
    let player = game.player().unwrap();
    let scroll = Prefab::Scroll.spawn(&mut game, Position::new(4, 4)).unwrap();

    game.world_mut()
        .insert_component(scroll, Target { target: player })
        .unwrap();
    let err = trigger::dispatch::<OnUseTrigger>(&mut game, scroll).unwrap_err();
    assert!(err.is_invalid_action());
    assert_eq!(err.to_string(), "Max spells learned");
    assert!(!game.world().has_component::<Target>(scroll));
}
