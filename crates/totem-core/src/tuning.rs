//! Engine tuning knobs.
//!
//! Every behavioral constant the engines consume is collected here so a
//! deployment can override them from a config file without recompiling.
//! Defaults come from [`crate::constants`]; `serde(default)` on every field
//! means partial override files stay valid.

use serde::{Deserialize, Serialize};

use crate::constants;

/// Stat decay and neglect parameters.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct DecayTuning {
    /// Milli-points of hunger lost per day.
    pub hunger_per_day: u64,
    pub mood_per_day: u64,
    pub energy_per_day: u64,
    pub reputation_per_day: u64,
    /// Milli-point floor under which a stat counts toward neglect.
    pub neglect_threshold: u64,
    /// Continuous seconds below threshold before neglect is declared.
    pub neglect_grace_secs: u64,
}

impl Default for DecayTuning {
    fn default() -> Self {
        Self {
            hunger_per_day: constants::HUNGER_DECAY_PER_DAY,
            mood_per_day: constants::MOOD_DECAY_PER_DAY,
            energy_per_day: constants::ENERGY_DECAY_PER_DAY,
            reputation_per_day: constants::REPUTATION_DECAY_PER_DAY,
            neglect_threshold: constants::NEGLECT_THRESHOLD,
            neglect_grace_secs: constants::NEGLECT_GRACE_SECS,
        }
    }
}

/// Care action and streak parameters.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct CareTuning {
    pub streak_window_secs: u64,
    pub reputation_per_action: u64,
    pub reputation_streak_bonus: u64,
    pub reputation_max: u64,
}

impl Default for CareTuning {
    fn default() -> Self {
        Self {
            streak_window_secs: constants::STREAK_WINDOW_SECS,
            reputation_per_action: constants::REPUTATION_PER_ACTION,
            reputation_streak_bonus: constants::REPUTATION_STREAK_BONUS,
            reputation_max: constants::REPUTATION_MAX,
        }
    }
}

/// Staking bounds, reward rate, and penalty curve.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct StakeTuning {
    pub min_stake: u64,
    pub max_stake: u64,
    pub max_total_stake: u64,
    pub power_per_token: u64,
    pub reward_rate_per_power_per_day: u64,
    pub winning_tribe_bonus_bps: u64,
    pub neglect_penalty_bps_per_day: u64,
    pub neglect_penalty_cap_bps: u64,
    pub treasury_cut_bps: u64,
}

impl Default for StakeTuning {
    fn default() -> Self {
        Self {
            min_stake: constants::MIN_STAKE,
            max_stake: constants::MAX_STAKE,
            max_total_stake: constants::MAX_TOTAL_STAKE,
            power_per_token: constants::POWER_PER_TOKEN,
            reward_rate_per_power_per_day: constants::REWARD_RATE_PER_POWER_PER_DAY,
            winning_tribe_bonus_bps: constants::WINNING_TRIBE_BONUS_BPS,
            neglect_penalty_bps_per_day: constants::NEGLECT_PENALTY_BPS_PER_DAY,
            neglect_penalty_cap_bps: constants::NEGLECT_PENALTY_CAP_BPS,
            treasury_cut_bps: constants::TREASURY_CUT_BPS,
        }
    }
}

/// Raid and matchmaking parameters.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct RaidTuning {
    pub attack_cooldown_secs: u64,
    /// Upper bound of the deterministic damage bonus roll, in BPS.
    pub damage_variance_bps: u64,
    /// Matchmaking power band, in BPS around the challenger's power.
    pub power_band_bps: u64,
    pub default_opponent_limit: usize,
}

impl Default for RaidTuning {
    fn default() -> Self {
        Self {
            attack_cooldown_secs: constants::RAID_ATTACK_COOLDOWN_SECS,
            damage_variance_bps: constants::DAMAGE_VARIANCE_BPS,
            power_band_bps: constants::POWER_BAND_BPS,
            default_opponent_limit: constants::DEFAULT_OPPONENT_LIMIT,
        }
    }
}

/// Weekly scoring weights and freshness policy.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct ScoreTuning {
    pub weight_activity: u64,
    pub weight_social: u64,
    pub weight_consistency: u64,
    pub weight_event: u64,
    pub consistency_min_streak: u32,
    pub staleness_secs: u64,
    pub weeks_per_season: u64,
}

impl Default for ScoreTuning {
    fn default() -> Self {
        Self {
            weight_activity: constants::WEIGHT_ACTIVITY,
            weight_social: constants::WEIGHT_SOCIAL,
            weight_consistency: constants::WEIGHT_CONSISTENCY,
            weight_event: constants::WEIGHT_EVENT,
            consistency_min_streak: constants::CONSISTENCY_MIN_STREAK,
            staleness_secs: constants::SCORE_STALENESS_SECS,
            weeks_per_season: constants::WEEKS_PER_SEASON,
        }
    }
}

/// The full tuning set handed to the composition layer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Tuning {
    pub decay: DecayTuning,
    pub care: CareTuning,
    pub stake: StakeTuning,
    pub raid: RaidTuning,
    pub score: ScoreTuning,
}
