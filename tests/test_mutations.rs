use mutation_brawler::attacks::*;
use mutation_brawler::entities::AttackShape;
use mutation_brawler::mutations::*;

use proptest::prelude::*;

// ── Cards ─────────────────────────────────────────────────────────────────────

#[test]
fn card_level_is_at_least_one() {
    assert_eq!(MutationCard::new(MutationKind::Cryo, 0).level, 1);
    assert_eq!(MutationKind::Cryo.card(4).level, 4);
}

#[test]
fn card_ids_are_stable() {
    assert_eq!(MutationKind::TwinStrike.id(), "twin");
    assert_eq!(MutationKind::LongReach.card(3).id(), "long_reach");
}

#[test]
fn viral_carries_poison_and_nova() {
    let viral = MutationKind::Viral.card(1);
    assert!(viral.has_tag(Tag::Poison));
    assert!(viral.has_tag(Tag::Nova));
    assert!(!viral.has_tag(Tag::Slow));
}

#[test]
fn sidearm_is_not_droppable() {
    assert!(!DROPPABLE.contains(&MutationKind::Sidearm));
    assert_eq!(DROPPABLE.len(), 7);
}

// ── Composition ───────────────────────────────────────────────────────────────

#[test]
fn compose_without_cards_is_base() {
    let base = base_attack_a();
    let none: [MutationCard; 0] = [];
    assert_eq!(compose_attack(&base, &none), base);
    assert_eq!(compose_attack(&base, None::<&MutationCard>), base);
}

#[test]
fn compose_single_card_matches_transform() {
    let base = base_attack_b();
    let card = MutationKind::Knockback.card(2);
    assert_eq!(compose_attack(&base, Some(&card)), card.apply_to_attack(&base));
}

#[test]
fn compose_leaves_inputs_alone() {
    let base = base_attack_a();
    let cards = [MutationKind::Elastic.card(3), MutationKind::Poison.card(2)];
    let composed = compose_attack(&base, &cards);
    assert_eq!(base, base_attack_a());
    assert_ne!(composed, base);
    assert_eq!(cards[0], MutationKind::Elastic.card(3));
}

#[test]
fn compose_appends_name_suffixes_in_order() {
    let cards = [MutationKind::Poison.card(1), MutationKind::TwinStrike.card(1)];
    let composed = compose_attack(&base_attack_a(), &cards);
    assert_eq!(composed.name, "AOE Swipe +Poison +Twin");
}

#[test]
fn poison_scales_damage_and_slows_cooldown() {
    let spec = MutationKind::Poison.card(2).apply_to_attack(&base_attack_a());
    assert!((spec.base_damage - 10.0 * 1.3 * 0.9).abs() < 1e-4);
    assert!((spec.base_cooldown - 0.7 * 1.05).abs() < 1e-5);
}

#[test]
fn knockback_card_scales_knockback() {
    let spec = MutationKind::Knockback.card(1).apply_to_attack(&base_attack_a());
    assert!((spec.knockback - 120.0 * 1.3).abs() < 1e-3);
}

#[test]
fn twin_cooldown_floors() {
    let spec = MutationKind::TwinStrike.card(30).apply_to_attack(&base_attack_a());
    assert_eq!(spec.base_cooldown, 0.18);
    assert_eq!(spec.recovery, 0.06);
}

#[test]
fn elastic_damage_never_negative() {
    let spec = MutationKind::Elastic.card(15).apply_to_attack(&base_attack_b());
    assert_eq!(spec.base_damage, 0.0);
    assert!(spec.area > base_attack_b().area);
}

#[test]
fn sidearm_grants_projectile() {
    let spec = MutationKind::Sidearm.card(2).apply_to_attack(&base_attack_b());
    let projectile = spec.projectile.expect("sidearm grants a projectile");
    assert_eq!(projectile.speed, 480.0);
    assert_eq!(spec.shape, AttackShape::Line);
}

#[test]
fn cryo_leaves_numbers_alone() {
    let base = base_attack_a();
    let spec = MutationKind::Cryo.card(3).apply_to_attack(&base);
    assert_eq!(spec.base_damage, base.base_damage);
    assert_eq!(spec.area, base.area);
    assert_eq!(spec.base_cooldown, base.base_cooldown);
}

#[test]
fn effective_cooldown_has_a_floor() {
    let mut spec = base_attack_a();
    spec.base_cooldown = 0.0;
    assert_eq!(effective_cooldown(&spec), MIN_ATTACK_COOLDOWN);
}

proptest! {
    #[test]
    fn long_reach_grows_with_diminishing_returns(level in 1u32..=10) {
        let base = base_attack_a();
        let lower = MutationKind::LongReach.card(level).apply_to_attack(&base).area;
        let higher = MutationKind::LongReach.card(level + 1).apply_to_attack(&base).area;
        prop_assert!(higher > lower);
        prop_assert!(lower > base.area);
        prop_assert!(higher < 1.5 * base.area);
    }
}

// ── Shape ─────────────────────────────────────────────────────────────────────

#[test]
fn shape_takes_last_tint_and_elastic_scale() {
    let cards = [MutationKind::Elastic.card(2), MutationKind::Cryo.card(1)];
    let shape = compose_shape(&base_shape(), &cards);
    assert!((shape.scale - 1.2).abs() < 1e-6);
    assert_eq!(shape.tint, mutation_brawler::entities::Tint::Cryo);
    assert_eq!(compose_shape(&base_shape(), None::<&MutationCard>), base_shape());
}
