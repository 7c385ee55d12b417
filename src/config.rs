/// Gameplay tuning.
///
/// Every field has a default, so a TOML file only needs the values it wants
/// to change.  Per-enemy profiles and card numbers live next to the code that
/// uses them; this struct holds the arena- and progression-wide knobs.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BrawlerError, Result};
use crate::inventory::DEFAULT_BACKPACK_CAPACITY;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Lateral extent of the arena.
    pub arena_width: f32,
    /// Depth band bodies are kept inside.
    pub play_band_min: f32,
    pub play_band_max: f32,
    /// Vertical acceleration (negative pulls down).
    pub gravity: f32,

    pub player_max_hp: f32,
    pub player_move_speed: f32,
    pub player_jump_velocity: f32,

    /// XP needed for the first level-up.
    pub xp_first_level: u32,
    /// Each threshold is the previous one times this, rounded down.
    pub xp_growth: f32,

    /// Fraction of knockback velocity lost per second.
    pub knockback_friction: f32,
    /// Knockback components below this snap to zero.
    pub knockback_snap: f32,

    /// Chance that a regular enemy drops a card.
    pub drop_chance: f32,
    /// Every n-th wave is a boss wave.
    pub boss_wave_interval: u32,
    pub backpack_capacity: usize,
    pub initial_enemies: usize,
    /// Longest frame the simulation will integrate in one step.
    pub max_frame_dt: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            arena_width: 960.0,
            play_band_min: 280.0,
            play_band_max: 420.0,
            gravity: -1200.0,
            player_max_hp: 100.0,
            player_move_speed: 220.0,
            player_jump_velocity: 420.0,
            xp_first_level: 100,
            xp_growth: 1.2,
            knockback_friction: 5.0,
            knockback_snap: 1.0,
            drop_chance: 0.55,
            boss_wave_interval: 5,
            backpack_capacity: DEFAULT_BACKPACK_CAPACITY,
            initial_enemies: 3,
            max_frame_dt: 0.1,
        }
    }
}

impl Tuning {
    /// Load tuning from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse tuning from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let tuning: Tuning = toml::from_str(content)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(BrawlerError::InvalidTuning(msg.to_string()));

        if self.arena_width <= 0.0 {
            return invalid("arena_width must be positive");
        }
        if self.play_band_min >= self.play_band_max {
            return invalid("play_band_min must be below play_band_max");
        }
        if self.xp_first_level == 0 {
            return invalid("xp_first_level must be at least 1");
        }
        if self.xp_growth < 1.0 {
            return invalid("xp_growth must be at least 1.0");
        }
        if !(0.0..=1.0).contains(&self.drop_chance) {
            return invalid("drop_chance must be within [0, 1]");
        }
        if self.boss_wave_interval == 0 {
            return invalid("boss_wave_interval must be at least 1");
        }
        if self.knockback_friction < 0.0 || self.knockback_snap < 0.0 {
            return invalid("knockback_friction and knockback_snap must be non-negative");
        }
        if self.max_frame_dt <= 0.0 {
            return invalid("max_frame_dt must be positive");
        }
        Ok(())
    }
}
