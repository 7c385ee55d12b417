use mutation_brawler::compute::init_state;
use mutation_brawler::config::Tuning;
use mutation_brawler::entities::*;
use mutation_brawler::spawn::{player_body, IdAllocator};

use rand::rngs::StdRng;
use rand::SeedableRng;

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

#[test]
fn entity_clone_and_eq() {
    assert_eq!(EnemyKind::Grunt, EnemyKind::Grunt);
    assert_ne!(EnemyKind::Grunt, EnemyKind::Boss);
    assert_eq!(GameStatus::Running, GameStatus::Running);
    assert_ne!(GameStatus::Running, GameStatus::GameOver);
    assert_eq!(ProjectileOwner::Player, ProjectileOwner::Player);
    assert_ne!(ProjectileOwner::Player, ProjectileOwner::Enemy);
    assert_ne!(Socket::A, Socket::B);
}

#[test]
fn game_state_clone_is_independent() {
    let original = init_state(Tuning::default(), &mut seeded_rng());
    let mut cloned = original.clone();

    cloned.player.body.x = 500.0;
    cloned.enemies.clear();
    cloned.wave = 9;

    assert_eq!(original.player.body.x, 100.0);
    assert_eq!(original.enemies.len(), 3);
    assert_eq!(original.wave, 1);
}

#[test]
fn game_state_survives_json_snapshot() {
    let original = init_state(Tuning::default(), &mut seeded_rng());
    let json = serde_json::to_string(&original).expect("state serialises");
    let restored: GameState = serde_json::from_str(&json).expect("state deserialises");
    assert_eq!(restored, original);
}

#[test]
fn facing_sign() {
    assert_eq!(Facing::Left.sign(), -1.0);
    assert_eq!(Facing::Right.sign(), 1.0);
}

#[test]
fn default_intent_does_nothing() {
    let intent = InputIntent::default();
    assert_eq!(intent.move_x, 0);
    assert_eq!(intent.move_y, 0);
    assert!(!intent.jump && !intent.attack_a && !intent.attack_b);
    assert!(!intent.equip_newest_a && !intent.equip_newest_b);
}

// ── Body ──────────────────────────────────────────────────────────────────────

#[test]
fn body_accessors() {
    let body = player_body(&Tuning::default());
    assert_eq!(body.center_x(), 114.0);
    assert_eq!(body.center_y(), 338.0);
    assert_eq!(body.mid_z(), 18.0);
    assert!(body.is_alive());
    assert!(body.on_ground);
}

#[test]
fn body_dead_at_zero_hp() {
    let mut body = player_body(&Tuning::default());
    body.stats.hp = 0.0;
    assert!(!body.is_alive());
    body.stats.hp = -3.0;
    assert!(!body.is_alive());
}

#[test]
fn last_attack_per_socket() {
    let mut body = player_body(&Tuning::default());
    assert_eq!(body.last_attack(Socket::A), None);
    body.set_last_attack(Socket::B, 1.5);
    assert_eq!(body.last_attack(Socket::A), None);
    assert_eq!(body.last_attack(Socket::B), Some(1.5));
}

// ── Status effects ────────────────────────────────────────────────────────────

#[test]
fn status_same_kind_ignores_values() {
    let a = StatusEffect::Poison { remaining: 1.0, dps: 3.0 };
    let b = StatusEffect::Poison { remaining: 2.5, dps: 9.0 };
    let c = StatusEffect::Slow { remaining: 1.0, factor: 0.6 };
    assert!(a.same_kind(&b));
    assert!(!a.same_kind(&c));
    assert_eq!(b.remaining(), 2.5);
}

#[test]
fn refresh_status_replaces_same_kind() {
    let mut body = player_body(&Tuning::default());
    body.refresh_status(StatusEffect::Poison { remaining: 0.2, dps: 3.0 });
    body.refresh_status(StatusEffect::Slow { remaining: 1.5, factor: 0.6 });
    body.refresh_status(StatusEffect::Poison { remaining: 3.0, dps: 3.0 });

    assert_eq!(body.status_effects.len(), 2);
    let poison = body
        .status_effects
        .iter()
        .find(|e| matches!(e, StatusEffect::Poison { .. }))
        .expect("poison present");
    assert_eq!(poison.remaining(), 3.0);
}

// ── Ids ───────────────────────────────────────────────────────────────────────

#[test]
fn id_allocator_counts_up_from_one() {
    let mut ids = IdAllocator::new();
    assert_eq!(ids.next_id(), EntityId(1));
    assert_eq!(ids.next_id(), EntityId(2));
    assert_eq!(IdAllocator::new().next_id(), EntityId(1));
}
