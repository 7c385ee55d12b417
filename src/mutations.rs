//! Mutation card registry.
//!
//! A card is a `(kind, level)` pair.  What it does to an attack or to the
//! player's shape is a pure function of the kind, the level and the input
//! value: every transform builds a fresh value and leaves its argument alone.

use serde::{Deserialize, Serialize};

use crate::entities::{AttackSpec, ProjectileSpec, Shape, Tint};

/// Ability categories granted by cards.  Status effects and on-kill triggers
/// look these up on equipped cards instead of special-casing card kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    Poison,
    RangeUp,
    Control,
    Multihit,
    Ranged,
    Slow,
    Area,
    Nova,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MutationKind {
    Poison,
    LongReach,
    Knockback,
    TwinStrike,
    Sidearm,
    Cryo,
    Elastic,
    Viral,
}

/// Kinds that can drop from regular enemies or be offered on level-up.
/// `Sidearm` is reserved for the boss.
pub const DROPPABLE: [MutationKind; 7] = [
    MutationKind::Poison,
    MutationKind::LongReach,
    MutationKind::Knockback,
    MutationKind::TwinStrike,
    MutationKind::Cryo,
    MutationKind::Elastic,
    MutationKind::Viral,
];

impl MutationKind {
    /// Stable identity used for stacking.
    pub fn id(self) -> &'static str {
        match self {
            MutationKind::Poison => "poison",
            MutationKind::LongReach => "long_reach",
            MutationKind::Knockback => "knockback",
            MutationKind::TwinStrike => "twin",
            MutationKind::Sidearm => "sidearm",
            MutationKind::Cryo => "cryo",
            MutationKind::Elastic => "elastic",
            MutationKind::Viral => "viral",
        }
    }

    pub fn tags(self) -> &'static [Tag] {
        match self {
            MutationKind::Poison => &[Tag::Poison],
            MutationKind::LongReach => &[Tag::RangeUp],
            MutationKind::Knockback => &[Tag::Control],
            MutationKind::TwinStrike => &[Tag::Multihit],
            MutationKind::Sidearm => &[Tag::Ranged],
            MutationKind::Cryo => &[Tag::Slow],
            MutationKind::Elastic => &[Tag::Area],
            MutationKind::Viral => &[Tag::Poison, Tag::Nova],
        }
    }

    pub fn card(self, level: u32) -> MutationCard {
        MutationCard::new(self, level)
    }

    fn suffix(self) -> &'static str {
        match self {
            MutationKind::Poison => " +Poison",
            MutationKind::LongReach => " +Reach",
            MutationKind::Knockback => " +KB",
            MutationKind::TwinStrike => " +Twin",
            MutationKind::Sidearm => " +Sidearm",
            MutationKind::Cryo => " +Cryo",
            MutationKind::Elastic => " +Elastic",
            MutationKind::Viral => " +Viral",
        }
    }

    fn tint(self) -> Tint {
        match self {
            MutationKind::Poison => Tint::Poison,
            MutationKind::LongReach => Tint::LongReach,
            MutationKind::Knockback => Tint::Knockback,
            MutationKind::TwinStrike => Tint::TwinStrike,
            MutationKind::Sidearm => Tint::Sidearm,
            MutationKind::Cryo => Tint::Cryo,
            MutationKind::Elastic => Tint::Elastic,
            MutationKind::Viral => Tint::Viral,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MutationCard {
    pub kind: MutationKind,
    /// Always at least 1.  Picking up a duplicate raises it by one.
    pub level: u32,
}

impl MutationCard {
    pub fn new(kind: MutationKind, level: u32) -> Self {
        Self {
            kind,
            level: level.max(1),
        }
    }

    pub fn id(&self) -> &'static str {
        self.kind.id()
    }

    pub fn tags(&self) -> &'static [Tag] {
        self.kind.tags()
    }

    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags().contains(&tag)
    }

    /// Derive a new attack spec from `attack` at this card's level.
    pub fn apply_to_attack(&self, attack: &AttackSpec) -> AttackSpec {
        let level = self.level as f32;
        let mut spec = attack.clone();
        match self.kind {
            MutationKind::Poison => {
                spec.base_damage = scale_linear(attack.base_damage, level, 0.15) * 0.9;
                spec.base_cooldown = attack.base_cooldown * 1.05;
            }
            MutationKind::LongReach => {
                spec.area = soft_area(attack.area, level);
            }
            MutationKind::Knockback => {
                spec.knockback = attack.knockback * (1.0 + 0.3 * level);
            }
            MutationKind::TwinStrike => {
                spec.base_damage = attack.base_damage * 0.85;
                spec.base_cooldown = (attack.base_cooldown * (0.8 - 0.05 * level)).max(0.18);
                spec.recovery = (attack.recovery * (0.85 - 0.03 * level)).max(0.06);
            }
            MutationKind::Sidearm => {
                // Last writer wins if two cards both grant a projectile.
                spec.projectile = Some(ProjectileSpec {
                    speed: 400.0 + 40.0 * level,
                    lifetime: 0.6 + 0.06 * level,
                    width: 8.0,
                    height: 4.0,
                    pierce: 0,
                });
                spec.base_cooldown = attack.base_cooldown * 1.1;
            }
            MutationKind::Cryo | MutationKind::Viral => {}
            MutationKind::Elastic => {
                spec.area = soft_area(attack.area, level * 1.5);
                spec.base_damage = attack.base_damage * (1.0 - 0.1 * level).max(0.0);
                spec.recovery = attack.recovery * (1.0 + 0.15 * level);
            }
        }
        spec.name = format!("{}{}", attack.name, self.kind.suffix());
        spec
    }

    /// Derive a new player shape: every card recolours, elastic also grows.
    pub fn apply_to_shape(&self, shape: &Shape) -> Shape {
        let scale = match self.kind {
            MutationKind::Elastic => shape.scale * (1.0 + 0.1 * self.level as f32),
            _ => shape.scale,
        };
        Shape {
            scale,
            tint: self.kind.tint(),
        }
    }
}

pub fn scale_linear(base: f32, level: f32, per_level: f32) -> f32 {
    base * (1.0 + per_level * level)
}

/// Diminishing-returns area growth, bounded by `1.5 * area`.
pub fn soft_area(area: f32, level: f32) -> f32 {
    area * (1.0 + 0.5 * (0.5 * level).tanh())
}
