//! Reward accrual math.
//!
//! Rewards accrue linearly in time at a daily rate derived from power,
//! scaled up for the winning tribe and scaled down by a capped neglect
//! penalty. The whole product is evaluated in u128 and floored exactly once.

use totem_core::constants::{BPS_PRECISION, SECS_PER_DAY};
use totem_core::error::StakeError;
use totem_core::tuning::StakeTuning;

/// Itemized result of one claim computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClaimBreakdown {
    /// Accrued reward before the treasury cut, in raw units.
    pub gross: u64,
    /// Share burned to the pet's tribe treasury.
    pub treasury_cut: u64,
    /// Amount paid to the claimer (`gross - treasury_cut`).
    pub payout: u64,
    /// Neglect penalty that was applied, in BPS.
    pub penalty_bps: u64,
    /// Length of the accrual window, in seconds.
    pub elapsed_secs: u64,
}

/// Accrual penalty for a pet neglected for `days_neglected` full days.
/// Grows linearly and saturates at the configured cap.
pub fn neglect_penalty_bps(days_neglected: u64, tuning: &StakeTuning) -> u64 {
    days_neglected
        .saturating_mul(tuning.neglect_penalty_bps_per_day)
        .min(tuning.neglect_penalty_cap_bps)
}

/// Reward accrued by `power` over `elapsed_secs`.
///
/// `reward = power × rate × elapsed × bonus_bps × (BPS − penalty) / (DAY × BPS²)`
/// with one floor at the end. `penalty_bps` is clamped to `BPS_PRECISION`,
/// so the result can never go negative.
pub fn accrued_reward(
    power: u64,
    elapsed_secs: u64,
    is_winning_tribe: bool,
    penalty_bps: u64,
    tuning: &StakeTuning,
) -> Result<u64, StakeError> {
    if power == 0 || elapsed_secs == 0 {
        return Ok(0);
    }

    let bonus_bps = if is_winning_tribe {
        tuning.winning_tribe_bonus_bps
    } else {
        BPS_PRECISION
    };
    let retained_bps = BPS_PRECISION.saturating_sub(penalty_bps);

    let numerator = (power as u128)
        .checked_mul(tuning.reward_rate_per_power_per_day as u128)
        .and_then(|v| v.checked_mul(elapsed_secs as u128))
        .and_then(|v| v.checked_mul(bonus_bps as u128))
        .and_then(|v| v.checked_mul(retained_bps as u128))
        .ok_or(StakeError::ArithmeticOverflow)?;

    let denominator =
        (SECS_PER_DAY as u128) * (BPS_PRECISION as u128) * (BPS_PRECISION as u128);

    let reward = numerator / denominator;
    u64::try_from(reward).map_err(|_| StakeError::ArithmeticOverflow)
}
