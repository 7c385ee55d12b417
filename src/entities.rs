/// All game entity types: pure data, plus a handful of field accessors.
///
/// Positions follow the arena convention: `x` is lateral, `y` is depth inside
/// the play band and `z` is height above the ground.  `(x, y)` is the
/// top-left corner of an entity's footprint.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::Tuning;
use crate::inventory::Inventory;
use crate::mutations::MutationCard;
use crate::progression::LevelUpOption;
use crate::spawn::IdAllocator;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Grunt,
    Scout,
    Brute,
    Boss,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Running,
    /// Level-up choices are on offer; `tick` is a no-op until one is applied.
    ChoicePending,
    GameOver,
}

/// One of the two attack buttons, and the equip slot bound to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Socket {
    A,
    B,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// Cosmetic colour family.  The renderer maps each one to a terminal colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tint {
    Base,
    Poison,
    Sidearm,
    Knockback,
    TwinStrike,
    LongReach,
    Cryo,
    Elastic,
    Viral,
}

// ── Shared body ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub max_hp: f32,
    /// May dip below zero for the rest of the frame; `<= 0` means dead.
    pub hp: f32,
    pub move_speed: f32,
    pub gravity: f32,
    pub jump_velocity: f32,
}

/// Derived visual shape.  Never read back by gameplay code.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub scale: f32,
    pub tint: Tint,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum StatusEffect {
    Poison { remaining: f32, dps: f32 },
    Slow { remaining: f32, factor: f32 },
}

impl StatusEffect {
    pub fn remaining(&self) -> f32 {
        match self {
            StatusEffect::Poison { remaining, .. } | StatusEffect::Slow { remaining, .. } => {
                *remaining
            }
        }
    }

    pub fn same_kind(&self, other: &StatusEffect) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// The physical shape shared by the player, regular enemies and the boss.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub vx: f32,
    pub vy: f32,
    pub vz: f32,
    /// Decaying impulse velocity, applied on top of `vx`/`vy`.
    pub knockback_vx: f32,
    pub knockback_vy: f32,
    pub width: f32,
    pub height: f32,
    pub stats: Stats,
    pub shape: Shape,
    pub on_ground: bool,
    pub facing: Facing,
    /// Simulation-clock time each socket last fired, `None` if never.
    pub last_attack_a: Option<f32>,
    pub last_attack_b: Option<f32>,
    pub status_effects: Vec<StatusEffect>,
}

impl Body {
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Height of the body's midpoint, used for vertical hit bands.
    pub fn mid_z(&self) -> f32 {
        self.z + self.height / 2.0
    }

    pub fn is_alive(&self) -> bool {
        self.stats.hp > 0.0
    }

    pub fn last_attack(&self, socket: Socket) -> Option<f32> {
        match socket {
            Socket::A => self.last_attack_a,
            Socket::B => self.last_attack_b,
        }
    }

    pub fn set_last_attack(&mut self, socket: Socket, at: f32) {
        match socket {
            Socket::A => self.last_attack_a = Some(at),
            Socket::B => self.last_attack_b = Some(at),
        }
    }

    /// Replace any effect of the same kind with `effect`.
    pub fn refresh_status(&mut self, effect: StatusEffect) {
        self.status_effects.retain(|e| !e.same_kind(&effect));
        self.status_effects.push(effect);
    }
}

// ── Attacks ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackShape {
    Circle,
    Line,
    Projectile,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSpec {
    pub speed: f32,
    pub lifetime: f32,
    pub width: f32,
    pub height: f32,
    pub pierce: u32,
}

/// Attack description.  Effective specs are recomposed from the base spec
/// and the socketed card on every trigger; they are never stored back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackSpec {
    pub name: String,
    pub base_damage: f32,
    pub base_cooldown: f32,
    pub shape: AttackShape,
    /// Radius for circles, reach for lines.
    pub area: f32,
    pub hitstun: f32,
    pub knockback: f32,
    pub startup: f32,
    pub active: f32,
    pub recovery: f32,
    pub projectile: Option<ProjectileSpec>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackState {
    pub spec: AttackSpec,
    pub started_at: f32,
}

/// A live hitbox.  Each enemy id lands in `hit_ids` at most once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackInstance {
    pub id: EntityId,
    pub owner_id: EntityId,
    pub spec: AttackSpec,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub facing: Facing,
    pub expires_at: f32,
    pub hit_ids: BTreeSet<EntityId>,
    /// Socket whose card tags apply on hit; `None` for nova bursts.
    pub socket: Option<Socket>,
}

// ── Projectiles & pickups ─────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileOwner {
    Player,
    Enemy,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub id: EntityId,
    pub owner_id: EntityId,
    /// Player projectiles only hit enemies, enemy projectiles only the player.
    pub owner: ProjectileOwner,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub vx: f32,
    pub vz: f32,
    pub width: f32,
    pub height: f32,
    pub damage: f32,
    /// Carried from the spec.  Every hit currently consumes the projectile.
    pub pierce: u32,
    pub expires_at: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    pub id: EntityId,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub width: f32,
    pub height: f32,
    pub card: MutationCard,
}

// ── Player & enemy ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: EntityId,
    pub body: Body,
    /// At most one attack plays at a time.
    pub attack_state: Option<AttackState>,
    pub xp: u32,
    pub level: u32,
    pub xp_to_next_level: u32,
    pub base_attack_a: AttackSpec,
    pub base_attack_b: AttackSpec,
}

impl Player {
    pub fn base_attack(&self, socket: Socket) -> &AttackSpec {
        match socket {
            Socket::A => &self.base_attack_a,
            Socket::B => &self.base_attack_b,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub body: Body,
    /// Last melee contact on the player.
    pub last_contact: Option<f32>,
    /// Last ranged shot (boss only).
    pub last_shot: f32,
}

// ── Input ─────────────────────────────────────────────────────────────────────

/// Normalised per-frame intent produced by the front-end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputIntent {
    /// -1, 0 or +1 (left / right).
    pub move_x: i8,
    /// -1, 0 or +1 (away / toward the camera).
    pub move_y: i8,
    pub jump: bool,
    pub attack_a: bool,
    pub attack_b: bool,
    pub equip_newest_a: bool,
    pub equip_newest_b: bool,
}

// ── Master game state ─────────────────────────────────────────────────────────

/// The entire snapshot.  `tick` takes it by value and hands back the next
/// one, so a half-updated frame is never visible to the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub boss: Option<Enemy>,
    pub projectiles: Vec<Projectile>,
    pub pickups: Vec<Pickup>,
    pub attack_instances: Vec<AttackInstance>,
    pub inventory: Inventory,
    pub wave: u32,
    pub status: GameStatus,
    /// Non-empty only while `status == ChoicePending`.
    pub level_up_choices: Vec<LevelUpOption>,
    /// Seconds of simulated play.  Stands still while paused.
    pub clock: f32,
    pub ids: IdAllocator,
    pub tuning: Tuning,
}

impl GameState {
    pub fn is_game_over(&self) -> bool {
        self.status == GameStatus::GameOver
    }
}
