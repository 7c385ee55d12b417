/// Spawners, enemy profiles and weighted random selection.
///
/// All randomness comes through the `rng` argument, and every new entity
/// takes its id from the state's `IdAllocator`.

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::Tuning;
use crate::entities::{Body, EnemyKind, EntityId, Enemy, Facing, Pickup, Shape, Stats, Tint};
use crate::mutations::{MutationCard, MutationKind, DROPPABLE};

pub const PICKUP_SIZE: f32 = 18.0;

/// Hands out entity ids for one run.  Lives in the game state, so starting
/// a new run starts numbering from scratch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> EntityId {
        self.next += 1;
        EntityId(self.next)
    }
}

// ── Enemy profiles ────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyProfile {
    pub width: f32,
    pub height: f32,
    pub max_hp: f32,
    pub move_speed: f32,
    /// Damage of one melee contact tick on the player.
    pub contact_damage: f32,
    pub contact_knockback: f32,
    /// XP granted to the player on death.
    pub xp_value: u32,
    pub melee_radius: f32,
    /// Seconds between melee contact ticks.
    pub melee_cooldown: f32,
    /// Distance the enemy tries to hold from the player.
    pub stand_off: f32,
    /// Back away when the player is closer than this.
    pub retreat_below: Option<f32>,
}

pub fn enemy_profile(kind: EnemyKind) -> EnemyProfile {
    match kind {
        EnemyKind::Grunt => EnemyProfile {
            width: 28.0,
            height: 32.0,
            max_hp: 30.0,
            move_speed: 120.0,
            contact_damage: 4.0,
            contact_knockback: 40.0,
            xp_value: 10,
            melee_radius: 40.0,
            melee_cooldown: 0.7,
            stand_off: 25.0,
            retreat_below: None,
        },
        EnemyKind::Scout => EnemyProfile {
            width: 24.0,
            height: 28.0,
            max_hp: 20.0,
            move_speed: 180.0,
            contact_damage: 3.0,
            contact_knockback: 30.0,
            xp_value: 12,
            melee_radius: 40.0,
            melee_cooldown: 0.7,
            stand_off: 120.0,
            retreat_below: Some(100.0),
        },
        EnemyKind::Brute => EnemyProfile {
            width: 34.0,
            height: 38.0,
            max_hp: 60.0,
            move_speed: 90.0,
            contact_damage: 10.0,
            contact_knockback: 80.0,
            xp_value: 20,
            melee_radius: 45.0,
            melee_cooldown: 1.1,
            stand_off: 25.0,
            retreat_below: None,
        },
        // The boss does not melee; it shoots (see `BOSS_SHOT_*`).
        EnemyKind::Boss => EnemyProfile {
            width: 36.0,
            height: 40.0,
            max_hp: 220.0,
            move_speed: 140.0,
            contact_damage: 0.0,
            contact_knockback: 0.0,
            xp_value: 100,
            melee_radius: 0.0,
            melee_cooldown: 0.0,
            stand_off: 80.0,
            retreat_below: None,
        },
    }
}

pub const BOSS_SHOT_COOLDOWN: f32 = 1.2;
pub const BOSS_SHOT_SPEED: f32 = 280.0;
pub const BOSS_SHOT_LIFT: f32 = 50.0;
pub const BOSS_SHOT_DAMAGE: f32 = 8.0;

/// Wave composition by wave number.
fn wave_table(wave: u32) -> &'static [(EnemyKind, f64)] {
    match wave {
        0 | 1 => &[(EnemyKind::Grunt, 1.0)],
        2 | 3 => &[(EnemyKind::Grunt, 0.6), (EnemyKind::Scout, 0.4)],
        _ => &[
            (EnemyKind::Grunt, 0.4),
            (EnemyKind::Scout, 0.3),
            (EnemyKind::Brute, 0.3),
        ],
    }
}

/// Regular wave size.
pub fn wave_size(wave: u32) -> usize {
    3 + wave as usize
}

// ── Weighted selection ────────────────────────────────────────────────────────

/// Pick an item with probability proportional to its weight.  `None` only
/// when the table is empty or every weight is zero.
pub fn weighted_choice<'a, T, R: Rng + ?Sized>(rng: &mut R, table: &'a [(T, f64)]) -> Option<&'a T> {
    let dist = WeightedIndex::new(table.iter().map(|(_, w)| *w)).ok()?;
    table.get(dist.sample(rng)).map(|(item, _)| item)
}

// ── Constructors ─────────────────────────────────────────────────────────────

fn body_at(x: f32, y: f32, width: f32, height: f32, stats: Stats, facing: Facing) -> Body {
    Body {
        x,
        y,
        z: 0.0,
        vx: 0.0,
        vy: 0.0,
        vz: 0.0,
        knockback_vx: 0.0,
        knockback_vy: 0.0,
        width,
        height,
        stats,
        shape: Shape {
            scale: 1.0,
            tint: Tint::Base,
        },
        on_ground: true,
        facing,
        last_attack_a: None,
        last_attack_b: None,
        status_effects: Vec::new(),
    }
}

/// Body for the player at the arena's start position.
pub fn player_body(tuning: &Tuning) -> Body {
    let stats = Stats {
        max_hp: tuning.player_max_hp,
        hp: tuning.player_max_hp,
        move_speed: tuning.player_move_speed,
        gravity: tuning.gravity,
        jump_velocity: tuning.player_jump_velocity,
    };
    body_at(100.0, 320.0, 28.0, 36.0, stats, Facing::Right)
}

pub fn enemy_of_kind(
    kind: EnemyKind,
    x: f32,
    y: f32,
    tuning: &Tuning,
    ids: &mut IdAllocator,
    now: f32,
) -> Enemy {
    let profile = enemy_profile(kind);
    let stats = Stats {
        max_hp: profile.max_hp,
        hp: profile.max_hp,
        move_speed: profile.move_speed,
        gravity: tuning.gravity,
        jump_velocity: 0.0,
    };
    Enemy {
        id: ids.next_id(),
        kind,
        body: body_at(x, y, profile.width, profile.height, stats, Facing::Left),
        last_contact: None,
        last_shot: now,
    }
}

/// One regular enemy at a random spot, typed by the wave table.
pub fn spawn_enemy<R: Rng + ?Sized>(
    tuning: &Tuning,
    ids: &mut IdAllocator,
    wave: u32,
    now: f32,
    rng: &mut R,
) -> Enemy {
    let x = rng.gen_range(50.0..(tuning.arena_width - 50.0).max(50.1));
    let y = rng.gen_range(tuning.play_band_min..tuning.play_band_max);
    let kind = weighted_choice(rng, wave_table(wave))
        .copied()
        .unwrap_or(EnemyKind::Grunt);
    enemy_of_kind(kind, x, y, tuning, ids, now)
}

pub fn spawn_wave<R: Rng + ?Sized>(
    tuning: &Tuning,
    ids: &mut IdAllocator,
    wave: u32,
    count: usize,
    now: f32,
    rng: &mut R,
) -> Vec<Enemy> {
    (0..count)
        .map(|_| spawn_enemy(tuning, ids, wave, now, rng))
        .collect()
}

pub fn spawn_boss(tuning: &Tuning, ids: &mut IdAllocator, now: f32) -> Enemy {
    let x = tuning.arena_width / 2.0 - 20.0;
    let y = (tuning.play_band_min + tuning.play_band_max) / 2.0;
    enemy_of_kind(EnemyKind::Boss, x, y, tuning, ids, now)
}

// ── Loot ──────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Rarity {
    Common,
    Uncommon,
    Rare,
}

const RARITIES: [(Rarity, f64); 3] = [
    (Rarity::Common, 0.70),
    (Rarity::Uncommon, 0.25),
    (Rarity::Rare, 0.05),
];

fn level_table(rarity: Rarity) -> &'static [(u32, f64)] {
    match rarity {
        Rarity::Common => &[(1, 1.0)],
        Rarity::Uncommon => &[(1, 0.5), (2, 0.5)],
        Rarity::Rare => &[(2, 0.6), (3, 0.4)],
    }
}

/// A random droppable card with a rarity-weighted level.
pub fn random_card<R: Rng + ?Sized>(rng: &mut R) -> MutationCard {
    let rarity = weighted_choice(rng, &RARITIES)
        .copied()
        .unwrap_or(Rarity::Common);
    let kind = DROPPABLE
        .choose(rng)
        .copied()
        .unwrap_or(MutationKind::Poison);
    let level = weighted_choice(rng, level_table(rarity))
        .copied()
        .unwrap_or(1);
    MutationCard::new(kind, level)
}

pub fn pickup_at(ids: &mut IdAllocator, x: f32, y: f32, card: MutationCard) -> Pickup {
    Pickup {
        id: ids.next_id(),
        x,
        y,
        z: 0.0,
        width: PICKUP_SIZE,
        height: PICKUP_SIZE,
        card,
    }
}

pub fn spawn_pickup<R: Rng + ?Sized>(ids: &mut IdAllocator, x: f32, y: f32, rng: &mut R) -> Pickup {
    let card = random_card(rng);
    pickup_at(ids, x, y, card)
}
