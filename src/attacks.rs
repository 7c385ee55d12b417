/// Base attacks and composition with socketed cards.

use crate::entities::{AttackShape, AttackSpec, Shape, Tint};
use crate::mutations::MutationCard;

/// Effective cooldowns never drop below this, whatever the cards do.
pub const MIN_ATTACK_COOLDOWN: f32 = 0.05;

pub fn base_attack_a() -> AttackSpec {
    AttackSpec {
        name: "AOE Swipe".to_string(),
        base_damage: 10.0,
        base_cooldown: 0.7,
        shape: AttackShape::Circle,
        area: 50.0,
        hitstun: 0.15,
        knockback: 120.0,
        startup: 0.08,
        active: 0.12,
        recovery: 0.3,
        projectile: None,
    }
}

pub fn base_attack_b() -> AttackSpec {
    AttackSpec {
        name: "Forward Combo".to_string(),
        base_damage: 7.0,
        base_cooldown: 0.35,
        shape: AttackShape::Line,
        area: 70.0,
        hitstun: 0.1,
        knockback: 80.0,
        startup: 0.06,
        active: 0.08,
        recovery: 0.22,
        projectile: None,
    }
}

/// Area burst spawned where an enemy dies while a nova card is equipped.
pub fn nova_burst() -> AttackSpec {
    AttackSpec {
        name: "Viral Nova".to_string(),
        base_damage: 5.0,
        base_cooldown: 0.0,
        shape: AttackShape::Circle,
        area: 80.0,
        hitstun: 0.1,
        knockback: 50.0,
        startup: 0.0,
        active: 0.2,
        recovery: 0.0,
        projectile: None,
    }
}

pub fn base_shape() -> Shape {
    Shape {
        scale: 1.0,
        tint: Tint::Base,
    }
}

/// Fold `cards` over `base` in equip order.  No cards gives back `base`.
pub fn compose_attack<'a, I>(base: &AttackSpec, cards: I) -> AttackSpec
where
    I: IntoIterator<Item = &'a MutationCard>,
{
    cards
        .into_iter()
        .fold(base.clone(), |spec, card| card.apply_to_attack(&spec))
}

pub fn compose_shape<'a, I>(base: &Shape, cards: I) -> Shape
where
    I: IntoIterator<Item = &'a MutationCard>,
{
    cards
        .into_iter()
        .fold(*base, |shape, card| card.apply_to_shape(&shape))
}

pub fn effective_cooldown(spec: &AttackSpec) -> f32 {
    spec.base_cooldown.max(MIN_ATTACK_COOLDOWN)
}
