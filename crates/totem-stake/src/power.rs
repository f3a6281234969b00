//! Stake power derivation.

use totem_core::constants::{BPS_PRECISION, TOKEN};
use totem_core::error::StakeError;
use totem_core::tuning::StakeTuning;
use totem_core::types::{Stage, Tribe};

/// Derive a pet's power from its stake, stage, and tribe.
///
/// `power = amount × stage_bps × tribe_bps × power_per_token / (BPS² × TOKEN)`
/// evaluated left-to-right in u128, with the floor division applied exactly
/// once at the end.
pub fn compute_power(
    amount_staked: u64,
    stage: Stage,
    tribe: Tribe,
    tuning: &StakeTuning,
) -> Result<u64, StakeError> {
    let numerator = (amount_staked as u128)
        .checked_mul(stage.power_multiplier_bps() as u128)
        .and_then(|v| v.checked_mul(tribe.power_multiplier_bps() as u128))
        .and_then(|v| v.checked_mul(tuning.power_per_token as u128))
        .ok_or(StakeError::ArithmeticOverflow)?;

    let denominator = (BPS_PRECISION as u128) * (BPS_PRECISION as u128) * (TOKEN as u128);
    let power = numerator / denominator;
    u64::try_from(power).map_err(|_| StakeError::ArithmeticOverflow)
}
