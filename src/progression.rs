//! Level-up progression.
//!
//! `Running -> ChoicePending -> Running` on every threshold crossing, and
//! `Running -> GameOver` once the player drops.  `compute::tick` enters
//! `ChoicePending` with a fresh set of options; `select_choice` applies one
//! and resumes the run.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::entities::{GameState, GameStatus, Player};
use crate::error::{BrawlerError, Result};
use crate::inventory::Inventory;
use crate::mutations::{MutationCard, MutationKind, DROPPABLE};

/// Number of options offered per level-up.
pub const CHOICE_COUNT: usize = 3;

pub const MAX_HP_BONUS: f32 = 20.0;
pub const MOVE_SPEED_BONUS: f32 = 1.10;
pub const DAMAGE_BONUS: f32 = 1.15;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatUpgrade {
    MaxHp,
    MoveSpeed,
    DamageA,
    DamageB,
}

impl StatUpgrade {
    pub const ALL: [StatUpgrade; 4] = [
        StatUpgrade::MaxHp,
        StatUpgrade::MoveSpeed,
        StatUpgrade::DamageA,
        StatUpgrade::DamageB,
    ];
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LevelUpOption {
    /// A card the player does not own yet, at level 1.
    NewMutation(MutationCard),
    /// One level on a card the player already holds (shown at its current level).
    UpgradeMutation(MutationCard),
    StatUpgrade(StatUpgrade),
}

impl LevelUpOption {
    pub fn title(&self) -> String {
        match self {
            LevelUpOption::NewMutation(card) => format!("New: {}", card.id()),
            LevelUpOption::UpgradeMutation(card) => format!("Upgrade: {}", card.id()),
            LevelUpOption::StatUpgrade(_) => "Stat Boost".to_string(),
        }
    }

    pub fn description(&self, player: &Player) -> String {
        match self {
            LevelUpOption::NewMutation(_) => "Add a new mutation to your backpack.".to_string(),
            LevelUpOption::UpgradeMutation(card) => {
                format!("Increase {} to Level {}.", card.id(), card.level + 1)
            }
            LevelUpOption::StatUpgrade(StatUpgrade::MaxHp) => format!(
                "+{} Max HP (Current: {})",
                MAX_HP_BONUS, player.body.stats.max_hp
            ),
            LevelUpOption::StatUpgrade(StatUpgrade::MoveSpeed) => "+10% Move Speed".to_string(),
            LevelUpOption::StatUpgrade(StatUpgrade::DamageA) => {
                format!("+15% {} Damage", player.base_attack_a.name)
            }
            LevelUpOption::StatUpgrade(StatUpgrade::DamageB) => {
                format!("+15% {} Damage", player.base_attack_b.name)
            }
        }
    }
}

fn push_unique(choices: &mut Vec<LevelUpOption>, option: LevelUpOption) {
    if !choices.contains(&option) {
        choices.push(option);
    }
}

/// Build the options for one level-up: try for one upgrade, one new card
/// and one stat boost, pad with further new cards and stat boosts, then
/// shuffle and keep `CHOICE_COUNT`.  Options are pairwise distinct.
pub fn generate_choices<R: Rng + ?Sized>(inventory: &Inventory, rng: &mut R) -> Vec<LevelUpOption> {
    let owned: Vec<MutationCard> = inventory.owned().copied().collect();
    let mut unowned: Vec<MutationKind> = DROPPABLE
        .iter()
        .copied()
        .filter(|kind| !inventory.owns(*kind))
        .collect();

    let mut choices = Vec::with_capacity(CHOICE_COUNT + 2);
    if let Some(card) = owned.choose(rng) {
        push_unique(&mut choices, LevelUpOption::UpgradeMutation(*card));
    }
    if let Some(kind) = unowned.choose(rng) {
        push_unique(&mut choices, LevelUpOption::NewMutation(kind.card(1)));
    }
    if let Some(stat) = StatUpgrade::ALL.choose(rng) {
        push_unique(&mut choices, LevelUpOption::StatUpgrade(*stat));
    }

    unowned.shuffle(rng);
    let mut stats = StatUpgrade::ALL.to_vec();
    stats.shuffle(rng);
    let mut padding = unowned
        .into_iter()
        .map(|kind| LevelUpOption::NewMutation(kind.card(1)))
        .chain(stats.into_iter().map(LevelUpOption::StatUpgrade));
    while choices.len() < CHOICE_COUNT {
        match padding.next() {
            Some(option) => push_unique(&mut choices, option),
            None => break,
        }
    }

    choices.shuffle(rng);
    choices.truncate(CHOICE_COUNT);
    choices
}

/// Apply `option`, consume the XP threshold (keeping the remainder), bump
/// the level, grow the next threshold and fully heal.  Resumes the run.
pub fn apply_choice(state: &mut GameState, option: &LevelUpOption) {
    match option {
        LevelUpOption::NewMutation(card) => {
            state.inventory.add_card(*card);
        }
        LevelUpOption::UpgradeMutation(card) => {
            state.inventory.add_card(MutationCard::new(card.kind, 1));
        }
        LevelUpOption::StatUpgrade(stat) => apply_stat(&mut state.player, *stat),
    }

    let player = &mut state.player;
    player.xp = player.xp.saturating_sub(player.xp_to_next_level);
    player.level += 1;
    player.xp_to_next_level =
        ((player.xp_to_next_level as f32 * state.tuning.xp_growth).floor() as u32).max(1);
    player.body.stats.hp = player.body.stats.max_hp;

    state.status = GameStatus::Running;
    state.level_up_choices.clear();

    info!(
        level = player.level,
        next = player.xp_to_next_level,
        choice = %option.title(),
        "level up applied"
    );
}

fn apply_stat(player: &mut Player, stat: StatUpgrade) {
    match stat {
        StatUpgrade::MaxHp => {
            player.body.stats.max_hp += MAX_HP_BONUS;
            player.body.stats.hp += MAX_HP_BONUS;
        }
        StatUpgrade::MoveSpeed => player.body.stats.move_speed *= MOVE_SPEED_BONUS,
        StatUpgrade::DamageA => player.base_attack_a.base_damage *= DAMAGE_BONUS,
        StatUpgrade::DamageB => player.base_attack_b.base_damage *= DAMAGE_BONUS,
    }
}

/// Resolve a pending level-up with the option at `index`.
pub fn select_choice(state: &mut GameState, index: usize) -> Result<LevelUpOption> {
    if state.status != GameStatus::ChoicePending {
        return Err(BrawlerError::NoChoicePending);
    }
    let option = state
        .level_up_choices
        .get(index)
        .cloned()
        .ok_or(BrawlerError::ChoiceOutOfRange {
            index,
            available: state.level_up_choices.len(),
        })?;
    apply_choice(state, &option);
    Ok(option)
}
