use mutation_brawler::compute::*;
use mutation_brawler::config::Tuning;
use mutation_brawler::entities::*;
use mutation_brawler::mutations::MutationKind;
use mutation_brawler::progression::select_choice;
use mutation_brawler::spawn::{enemy_of_kind, enemy_profile, pickup_at, player_body};

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

const DT: f32 = 1.0 / 60.0;

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

/// A run with one motionless grunt parked far from the player, so waves
/// never advance and nothing touches the player unless a test says so.
fn make_state() -> GameState {
    let mut rng = seeded_rng();
    let mut state = init_state(Tuning::default(), &mut rng);
    state.enemies.clear();
    let mut far = enemy_of_kind(EnemyKind::Grunt, 900.0, 380.0, &state.tuning, &mut state.ids, 0.0);
    far.body.stats.move_speed = 0.0;
    state.enemies.push(far);
    state
}

/// Grunt standing just right of the player, same depth and height.
fn adjacent_grunt(state: &mut GameState) -> EntityId {
    let x = state.player.body.x + 20.0;
    let y = state.player.body.y;
    let grunt = enemy_of_kind(EnemyKind::Grunt, x, y, &state.tuning, &mut state.ids, 0.0);
    let id = grunt.id;
    state.enemies.push(grunt);
    id
}

fn enemy(state: &GameState, id: EntityId) -> &Enemy {
    state
        .enemies
        .iter()
        .find(|e| e.id == id)
        .expect("enemy should still be alive")
}

fn idle() -> InputIntent {
    InputIntent::default()
}

// ── init_state ────────────────────────────────────────────────────────────────

#[test]
fn init_state_opens_wave_one() {
    let mut rng = seeded_rng();
    let s = init_state(Tuning::default(), &mut rng);
    assert_eq!(s.wave, 1);
    assert_eq!(s.enemies.len(), 3);
    assert!(s.enemies.iter().all(|e| e.kind == EnemyKind::Grunt));
    assert!(s.boss.is_none());
    assert_eq!(s.status, GameStatus::Running);
    assert_eq!(s.clock, 0.0);
    assert_eq!(s.player.level, 1);
    assert_eq!(s.player.xp, 0);
    assert_eq!(s.player.xp_to_next_level, 100);
}

#[test]
fn init_state_hands_out_unique_ids() {
    let mut rng = seeded_rng();
    let s = init_state(Tuning::default(), &mut rng);
    let mut ids: Vec<EntityId> = s.enemies.iter().map(|e| e.id).collect();
    ids.push(s.player.id);
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4);
}

#[test]
fn init_state_is_reproducible_for_a_seed() {
    let a = init_state(Tuning::default(), &mut seeded_rng());
    let b = init_state(Tuning::default(), &mut seeded_rng());
    assert_eq!(a, b);
}

// ── Status gating ─────────────────────────────────────────────────────────────

#[test]
fn tick_advances_clock_while_running() {
    let s = tick(make_state(), &idle(), DT, &mut seeded_rng());
    assert!((s.clock - DT).abs() < 1e-6);
}

#[test]
fn tick_clamps_long_frames() {
    let s = tick(make_state(), &idle(), 5.0, &mut seeded_rng());
    assert!((s.clock - Tuning::default().max_frame_dt).abs() < 1e-6);
}

#[test]
fn tick_is_noop_while_choice_pending() {
    let mut s = make_state();
    s.status = GameStatus::ChoicePending;
    let input = InputIntent {
        move_x: 1,
        attack_a: true,
        ..InputIntent::default()
    };
    let after = tick(s.clone(), &input, DT, &mut seeded_rng());
    assert_eq!(after, s);
}

#[test]
fn player_death_ends_the_run() {
    let mut s = make_state();
    s.player.body.stats.hp = 0.0;
    let s = tick(s, &idle(), DT, &mut seeded_rng());
    assert_eq!(s.status, GameStatus::GameOver);
    assert!(s.is_game_over());
    assert!(s.level_up_choices.is_empty());
}

#[test]
fn game_over_freezes_everything() {
    let mut s = make_state();
    s.player.body.stats.hp = 0.0;
    let mut rng = seeded_rng();
    let over = tick(s, &idle(), DT, &mut rng);

    let mut later = over.clone();
    for _ in 0..30 {
        later = tick(later, &InputIntent { move_x: -1, jump: true, ..idle() }, DT, &mut rng);
    }
    assert_eq!(later.enemies, over.enemies);
    assert_eq!(later.projectiles, over.projectiles);
    assert_eq!(later.clock, over.clock);
    assert_eq!(later, over);
}

// ── Movement & physics ────────────────────────────────────────────────────────

#[test]
fn move_right_faces_right_and_moves() {
    let mut s = make_state();
    s.player.body.facing = Facing::Left;
    let x0 = s.player.body.x;
    let s = tick(s, &InputIntent { move_x: 1, ..idle() }, DT, &mut seeded_rng());
    assert!(s.player.body.x > x0);
    assert_eq!(s.player.body.facing, Facing::Right);
}

#[test]
fn diagonal_movement_is_slower_per_axis() {
    let straight = tick(make_state(), &InputIntent { move_x: 1, ..idle() }, DT, &mut seeded_rng());
    let diagonal = tick(
        make_state(),
        &InputIntent { move_x: 1, move_y: 1, ..idle() },
        DT,
        &mut seeded_rng(),
    );
    let x0 = make_state().player.body.x;
    assert!(diagonal.player.body.x - x0 < straight.player.body.x - x0);
}

#[test]
fn player_stays_inside_arena() {
    let mut s = make_state();
    let mut rng = seeded_rng();
    for _ in 0..300 {
        s = tick(s, &InputIntent { move_x: -1, move_y: -1, ..idle() }, DT, &mut rng);
    }
    assert_eq!(s.player.body.x, 0.0);
    assert_eq!(s.player.body.y, s.tuning.play_band_min);
}

#[test]
fn jump_only_from_the_ground() {
    let mut rng = seeded_rng();
    let jump = InputIntent { jump: true, ..idle() };
    let s = tick(make_state(), &jump, DT, &mut rng);
    assert!(s.player.body.z > 0.0);
    assert!(!s.player.body.on_ground);
    let vz_airborne = s.player.body.vz;

    // Holding jump in mid-air does not relaunch.
    let s = tick(s, &jump, DT, &mut rng);
    assert!(s.player.body.vz < vz_airborne);
}

#[test]
fn jump_lands_and_height_never_negative() {
    let mut rng = seeded_rng();
    let mut s = tick(make_state(), &InputIntent { jump: true, ..idle() }, DT, &mut rng);
    for _ in 0..120 {
        s = tick(s, &idle(), DT, &mut rng);
        assert!(s.player.body.z >= 0.0);
    }
    assert!(s.player.body.on_ground);
    assert_eq!(s.player.body.z, 0.0);
}

#[test]
fn knockback_snaps_to_zero_eventually() {
    let tuning = Tuning::default();
    let mut body = player_body(&tuning);
    body.knockback_vx = 300.0;
    body.knockback_vy = -150.0;
    for _ in 0..200 {
        integrate_body(&mut body, &tuning, DT);
    }
    assert_eq!(body.knockback_vx, 0.0);
    assert_eq!(body.knockback_vy, 0.0);
}

proptest! {
    #[test]
    fn knockback_decays_strictly(k in 2.0f32..500.0, dt in 0.001f32..0.1) {
        let tuning = Tuning::default();
        let mut body = player_body(&tuning);
        body.knockback_vx = k;
        integrate_body(&mut body, &tuning, dt);
        prop_assert!(body.knockback_vx.abs() < k);
        prop_assert!(body.knockback_vx >= 0.0);
    }

    #[test]
    fn direction_is_unit_or_zero(dx in -500.0f32..500.0, dy in -500.0f32..500.0) {
        let (nx, ny) = direction(dx, dy);
        let len = (nx * nx + ny * ny).sqrt();
        prop_assert!(len <= 1.0 + 1e-4);
        if dx.abs() > 1.0 || dy.abs() > 1.0 {
            prop_assert!((len - 1.0).abs() < 1e-4);
        }
    }
}

#[test]
fn direction_of_coincident_points_is_zero() {
    assert_eq!(direction(0.0, 0.0), (0.0, 0.0));
}

// ── Attacks ───────────────────────────────────────────────────────────────────

#[test]
fn swipe_hits_adjacent_enemy() {
    let mut s = make_state();
    let id = adjacent_grunt(&mut s);
    let s = tick(s, &InputIntent { attack_a: true, ..idle() }, DT, &mut seeded_rng());

    let grunt = enemy(&s, id);
    assert_eq!(grunt.body.stats.hp, 20.0);
    assert!(grunt.body.knockback_vx > 0.0);
    assert!(s.player.attack_state.is_some());
    assert_eq!(s.player.body.last_attack_a, Some(s.clock));
}

#[test]
fn attack_instance_hits_each_enemy_once() {
    let mut s = make_state();
    let id = adjacent_grunt(&mut s);
    let mut spec = mutation_brawler::attacks::base_attack_a();
    spec.area = 2000.0;
    let grunt_z = enemy(&s, id).body.mid_z();
    let instance = AttackInstance {
        id: s.ids.next_id(),
        owner_id: s.player.id,
        spec,
        x: 100.0,
        y: 330.0,
        z: grunt_z,
        facing: Facing::Right,
        expires_at: 10.0,
        hit_ids: Default::default(),
        socket: None,
    };
    s.attack_instances.push(instance);

    let mut rng = seeded_rng();
    for _ in 0..10 {
        s = tick(s, &idle(), DT, &mut rng);
    }
    assert_eq!(enemy(&s, id).body.stats.hp, 20.0);
    assert!(s.attack_instances[0].hit_ids.contains(&id));
}

#[test]
fn only_one_attack_plays_at_a_time() {
    let mut s = make_state();
    let id = adjacent_grunt(&mut s);
    let both = InputIntent {
        attack_a: true,
        attack_b: true,
        ..idle()
    };
    let mut rng = seeded_rng();
    s = tick(s, &both, DT, &mut rng);
    assert_eq!(s.attack_instances.len(), 1);
    assert!(s.player.body.last_attack_b.is_none());

    // Still inside active + recovery: no new attack.
    s = tick(s, &both, DT, &mut rng);
    assert!(s.attack_instances.len() <= 1);
    assert_eq!(enemy(&s, id).body.stats.hp, 20.0);
}

#[test]
fn attack_respects_cooldown_after_recovery() {
    let mut s = make_state();
    let mut rng = seeded_rng();
    let swing = InputIntent { attack_a: true, ..idle() };
    s = tick(s, &swing, DT, &mut rng);
    let first = s.player.body.last_attack_a;

    // 0.5 s later the swipe has recovered but its 0.7 s cooldown has not run.
    for _ in 0..30 {
        s = tick(s, &idle(), DT, &mut rng);
    }
    s = tick(s, &swing, DT, &mut rng);
    assert_eq!(s.player.body.last_attack_a, first);

    for _ in 0..20 {
        s = tick(s, &idle(), DT, &mut rng);
    }
    s = tick(s, &swing, DT, &mut rng);
    assert_ne!(s.player.body.last_attack_a, first);
}

#[test]
fn poison_card_poisons_on_hit() {
    let mut s = make_state();
    s.inventory.socket_a = Some(MutationKind::Poison.card(1));
    let id = adjacent_grunt(&mut s);
    let s = tick(s, &InputIntent { attack_a: true, ..idle() }, DT, &mut seeded_rng());
    let effects = &enemy(&s, id).body.status_effects;
    assert!(effects
        .iter()
        .any(|e| matches!(e, StatusEffect::Poison { .. })));
}

#[test]
fn cryo_card_slows_on_hit() {
    let mut s = make_state();
    s.inventory.socket_a = Some(MutationKind::Cryo.card(1));
    let id = adjacent_grunt(&mut s);
    let s = tick(s, &InputIntent { attack_a: true, ..idle() }, DT, &mut seeded_rng());
    let effects = &enemy(&s, id).body.status_effects;
    assert_eq!(effects.len(), 1);
    assert!(matches!(effects[0], StatusEffect::Slow { .. }));
}

#[test]
fn poison_ticks_damage_and_expires() {
    let mut s = make_state();
    s.enemies[0].body.refresh_status(StatusEffect::Poison {
        remaining: 0.5,
        dps: 10.0,
    });
    let mut rng = seeded_rng();
    for _ in 0..60 {
        s = tick(s, &idle(), DT, &mut rng);
    }
    let grunt = &s.enemies[0];
    assert!(grunt.body.stats.hp < 30.0);
    assert!(grunt.body.stats.hp > 20.0);
    assert!(grunt.body.status_effects.is_empty());
}

#[test]
fn sidearm_in_socket_b_fires_projectile() {
    let mut s = make_state();
    s.inventory.socket_b = Some(MutationKind::Sidearm.card(1));
    let s = tick(s, &InputIntent { attack_b: true, ..idle() }, DT, &mut seeded_rng());
    assert_eq!(s.projectiles.len(), 1);
    let p = &s.projectiles[0];
    assert_eq!(p.owner, ProjectileOwner::Player);
    assert!(p.vx > 0.0);
}

#[test]
fn sidearm_in_socket_a_fires_nothing() {
    let mut s = make_state();
    s.inventory.socket_a = Some(MutationKind::Sidearm.card(1));
    let s = tick(s, &InputIntent { attack_a: true, ..idle() }, DT, &mut seeded_rng());
    assert!(s.projectiles.is_empty());
}

#[test]
fn projectiles_expire() {
    let mut s = make_state();
    s.inventory.socket_b = Some(MutationKind::Sidearm.card(1));
    let mut rng = seeded_rng();
    s = tick(s, &InputIntent { attack_b: true, ..idle() }, DT, &mut rng);
    for _ in 0..90 {
        s = tick(s, &idle(), DT, &mut rng);
    }
    assert!(s.projectiles.is_empty());
}

// ── Enemies ───────────────────────────────────────────────────────────────────

#[test]
fn grunt_contact_damages_player_once_per_cooldown() {
    let mut s = make_state();
    adjacent_grunt(&mut s);
    let mut rng = seeded_rng();
    s = tick(s, &idle(), DT, &mut rng);
    assert_eq!(s.player.body.stats.hp, 96.0);

    s = tick(s, &idle(), DT, &mut rng);
    assert_eq!(s.player.body.stats.hp, 96.0);
}

#[test]
fn grunt_walks_toward_player() {
    let mut s = make_state();
    let grunt = enemy_of_kind(EnemyKind::Grunt, 500.0, 320.0, &s.tuning, &mut s.ids, 0.0);
    let id = grunt.id;
    s.enemies.push(grunt);
    let mut rng = seeded_rng();
    for _ in 0..10 {
        s = tick(s, &idle(), DT, &mut rng);
    }
    assert!(enemy(&s, id).body.x < 500.0);
    assert_eq!(enemy(&s, id).body.facing, Facing::Left);
}

// ── Death, loot & waves ───────────────────────────────────────────────────────

#[test]
fn clearing_wave_one_starts_wave_two() {
    let mut rng = seeded_rng();
    let mut s = init_state(Tuning::default(), &mut rng);
    for e in &mut s.enemies {
        e.body.stats.hp = 0.0;
    }
    let s = tick(s, &idle(), DT, &mut rng);
    assert_eq!(s.player.xp, 30);
    assert_eq!(s.wave, 2);
    assert_eq!(s.enemies.len(), 5);
}

#[test]
fn xp_matches_enemy_profiles() {
    let mut s = make_state();
    for kind in [EnemyKind::Grunt, EnemyKind::Scout, EnemyKind::Brute] {
        let mut e = enemy_of_kind(kind, 700.0, 300.0, &s.tuning, &mut s.ids, 0.0);
        e.body.stats.hp = 0.0;
        s.enemies.push(e);
    }
    let s = tick(s, &idle(), DT, &mut seeded_rng());
    let expected = enemy_profile(EnemyKind::Grunt).xp_value
        + enemy_profile(EnemyKind::Scout).xp_value
        + enemy_profile(EnemyKind::Brute).xp_value;
    assert_eq!(s.player.xp, expected);
    assert_eq!(s.enemies.len(), 1);
}

#[test]
fn drop_chance_controls_loot() {
    let mut never = make_state();
    never.tuning.drop_chance = 0.0;
    let mut always = make_state();
    always.tuning.drop_chance = 1.0;
    for s in [&mut never, &mut always] {
        let mut e = enemy_of_kind(EnemyKind::Grunt, 700.0, 300.0, &s.tuning, &mut s.ids, 0.0);
        e.body.stats.hp = 0.0;
        s.enemies.push(e);
    }
    let never = tick(never, &idle(), DT, &mut seeded_rng());
    let always = tick(always, &idle(), DT, &mut seeded_rng());
    assert!(never.pickups.is_empty());
    assert_eq!(always.pickups.len(), 1);
    assert_ne!(always.pickups[0].card.kind, MutationKind::Sidearm);
}

#[test]
fn viral_kill_spawns_nova_burst() {
    let mut s = make_state();
    s.inventory.socket_a = Some(MutationKind::Viral.card(1));
    let mut e = enemy_of_kind(EnemyKind::Grunt, 700.0, 300.0, &s.tuning, &mut s.ids, 0.0);
    e.body.stats.hp = 0.0;
    s.enemies.push(e);
    let s = tick(s, &idle(), DT, &mut seeded_rng());
    assert_eq!(s.attack_instances.len(), 1);
    let nova = &s.attack_instances[0];
    assert_eq!(nova.spec.name, "Viral Nova");
    assert_eq!(nova.socket, None);
}

#[test]
fn every_fifth_wave_is_a_boss() {
    let mut s = make_state();
    s.enemies.clear();
    s.wave = 4;
    let s = tick(s, &idle(), DT, &mut seeded_rng());
    assert_eq!(s.wave, 5);
    assert!(s.enemies.is_empty());
    let boss = s.boss.as_ref().expect("boss wave");
    assert_eq!(boss.kind, EnemyKind::Boss);
}

#[test]
fn boss_shoots_on_cooldown() {
    let mut s = make_state();
    s.enemies.clear();
    s.wave = 4;
    let mut rng = seeded_rng();
    s = tick(s, &idle(), DT, &mut rng);
    for _ in 0..80 {
        s = tick(s, &idle(), DT, &mut rng);
    }
    assert!(s
        .projectiles
        .iter()
        .any(|p| p.owner == ProjectileOwner::Enemy));
}

#[test]
fn boss_defeat_drops_sidearm_and_pends_level_up() {
    let mut s = make_state();
    let mut boss = mutation_brawler::spawn::spawn_boss(&s.tuning, &mut s.ids, 0.0);
    boss.body.stats.hp = 0.0;
    s.boss = Some(boss);
    let mut rng = seeded_rng();
    let mut s = tick(s, &idle(), DT, &mut rng);

    assert!(s.boss.is_none());
    assert_eq!(s.player.xp, 100);
    assert!(s
        .pickups
        .iter()
        .any(|p| p.card == MutationKind::Sidearm.card(2)));
    assert_eq!(s.status, GameStatus::ChoicePending);
    assert_eq!(s.level_up_choices.len(), 3);

    select_choice(&mut s, 0).expect("choice is pending");
    assert_eq!(s.status, GameStatus::Running);
    assert_eq!(s.player.level, 2);
    assert_eq!(s.player.xp, 0);
    assert_eq!(s.player.xp_to_next_level, 120);
}

// ── Pickups & sockets ─────────────────────────────────────────────────────────

#[test]
fn duplicate_pickups_stack() {
    let mut s = make_state();
    let (x, y) = (s.player.body.x, s.player.body.y);
    let mut rng = seeded_rng();

    let first = pickup_at(&mut s.ids, x, y, MutationKind::Poison.card(1));
    s.pickups.push(first);
    s = tick(s, &idle(), DT, &mut rng);
    let second = pickup_at(&mut s.ids, x, y, MutationKind::Poison.card(1));
    s.pickups.push(second);
    s = tick(s, &idle(), DT, &mut rng);

    assert!(s.pickups.is_empty());
    assert_eq!(s.inventory.backpack, vec![MutationKind::Poison.card(2)]);
}

#[test]
fn airborne_player_misses_pickups() {
    let mut s = make_state();
    s.player.body.z = 60.0;
    s.player.body.on_ground = false;
    let (x, y) = (s.player.body.x, s.player.body.y);
    let pickup = pickup_at(&mut s.ids, x, y, MutationKind::Cryo.card(1));
    s.pickups.push(pickup);
    let s = tick(s, &idle(), DT, &mut seeded_rng());
    assert_eq!(s.pickups.len(), 1);
    assert!(s.inventory.backpack.is_empty());
}

#[test]
fn equip_intent_moves_newest_card_and_recolours() {
    let mut s = make_state();
    s.inventory.add_card(MutationKind::Knockback.card(1));
    s.inventory.add_card(MutationKind::Elastic.card(2));
    let s = tick(s, &InputIntent { equip_newest_a: true, ..idle() }, DT, &mut seeded_rng());

    assert_eq!(s.inventory.socket_a, Some(MutationKind::Elastic.card(2)));
    assert_eq!(s.inventory.backpack, vec![MutationKind::Knockback.card(1)]);
    assert_eq!(s.player.body.shape.tint, Tint::Elastic);
    assert!(s.player.body.shape.scale > 1.0);
}
