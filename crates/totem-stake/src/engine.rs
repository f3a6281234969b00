//! Stake lifecycle engine: stake, unstake, claim.
//!
//! Pure state-transition functions over snapshot rows; the caller commits
//! the returned successor with a conditional write, which is what makes a
//! duplicated claim after a timeout unable to pay twice — the second commit
//! loses the version race and is retried against a row whose accrual clock
//! has already been reset.

use totem_core::constants::SECS_PER_DAY;
use totem_core::error::StakeError;
use totem_core::tuning::StakeTuning;
use totem_core::types::{
    ActivityEvent, ActivityKind, Pet, Stake, StakeHistoryEntry, StakeOp, UserId,
    VitalsSnapshot,
};

use crate::power::compute_power;
use crate::rewards::{ClaimBreakdown, accrued_reward, neglect_penalty_bps};

/// Result of a stake or unstake transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StakeOutcome {
    pub stake: Stake,
    pub entry: StakeHistoryEntry,
    pub event: ActivityEvent,
}

/// Result of a claim transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimOutcome {
    pub stake: Stake,
    pub breakdown: ClaimBreakdown,
    pub entry: StakeHistoryEntry,
    pub event: ActivityEvent,
}

/// The staking engine. Pure and deterministic.
#[derive(Debug, Clone, Default)]
pub struct StakeEngine {
    tuning: StakeTuning,
}

impl StakeEngine {
    pub fn new(tuning: StakeTuning) -> Self {
        Self { tuning }
    }

    /// Add `amount` to the pet's stake, creating the row on first stake.
    ///
    /// `tx_ref` is the external chain transaction reference; it is recorded,
    /// never validated. Power is recomputed from the new total.
    pub fn stake(
        &self,
        existing: Option<&Stake>,
        pet: &Pet,
        user: UserId,
        amount: u64,
        tx_ref: &str,
        now: u64,
    ) -> Result<StakeOutcome, StakeError> {
        let t = &self.tuning;
        if amount < t.min_stake || amount > t.max_stake {
            return Err(StakeError::AmountOutOfBounds {
                amount,
                min: t.min_stake,
                max: t.max_stake,
            });
        }

        let have = existing.map_or(0, |s| s.amount_staked);
        let new_amount = have
            .checked_add(amount)
            .ok_or(StakeError::ArithmeticOverflow)?;
        if new_amount > t.max_total_stake {
            return Err(StakeError::StakeCapExceeded {
                have,
                adding: amount,
                cap: t.max_total_stake,
            });
        }

        let power = compute_power(new_amount, pet.stage, pet.tribe, t)?;
        let stake = Stake {
            user,
            pet: pet.id,
            amount_staked: new_amount,
            power,
            staked_at: existing.map_or(now, |s| s.staked_at),
            last_claim_at: existing.and_then(|s| s.last_claim_at),
        };

        Ok(StakeOutcome {
            stake,
            entry: StakeHistoryEntry { op: StakeOp::Stake, amount, tx_ref: tx_ref.into(), at: now },
            event: stake_event(pet, now),
        })
    }

    /// Remove `amount` from the pet's stake.
    ///
    /// Fails [`StakeError::InsufficientStake`] without touching the row when
    /// more is requested than is staked.
    pub fn unstake(
        &self,
        stake: &Stake,
        pet: &Pet,
        amount: u64,
        tx_ref: &str,
        now: u64,
    ) -> Result<StakeOutcome, StakeError> {
        if amount == 0 {
            return Err(StakeError::AmountOutOfBounds {
                amount,
                min: 1,
                max: self.tuning.max_stake,
            });
        }
        if amount > stake.amount_staked {
            return Err(StakeError::InsufficientStake {
                have: stake.amount_staked,
                need: amount,
            });
        }

        let new_amount = stake.amount_staked - amount;
        let power = compute_power(new_amount, pet.stage, pet.tribe, &self.tuning)?;

        let mut updated = stake.clone();
        updated.amount_staked = new_amount;
        updated.power = power;

        Ok(StakeOutcome {
            stake: updated,
            entry: StakeHistoryEntry {
                op: StakeOp::Unstake,
                amount,
                tx_ref: tx_ref.into(),
                at: now,
            },
            event: stake_event(pet, now),
        })
    }

    /// Claim rewards accrued since the later of `staked_at` and the last
    /// claim, resetting the accrual clock to `now`.
    ///
    /// The neglect penalty is derived from how long the pet has been
    /// neglected per `vitals`; the winning-tribe bonus is the caller's
    /// determination from last week's scores.
    pub fn claim(
        &self,
        stake: &Stake,
        pet: &Pet,
        vitals: &VitalsSnapshot,
        is_winning_tribe: bool,
        tx_ref: &str,
        now: u64,
    ) -> Result<ClaimOutcome, StakeError> {
        let elapsed_secs = now.saturating_sub(stake.accrual_start());

        let days_neglected = match vitals.neglected_since {
            Some(since) if vitals.is_neglected => now.saturating_sub(since) / SECS_PER_DAY,
            _ => 0,
        };
        let penalty_bps = neglect_penalty_bps(days_neglected, &self.tuning);

        let gross =
            accrued_reward(stake.power, elapsed_secs, is_winning_tribe, penalty_bps, &self.tuning)?;
        let treasury_cut = mul_bps(gross, self.tuning.treasury_cut_bps)?;
        let payout = gross - treasury_cut;

        let mut updated = stake.clone();
        updated.last_claim_at = Some(now);

        Ok(ClaimOutcome {
            stake: updated,
            breakdown: ClaimBreakdown { gross, treasury_cut, payout, penalty_bps, elapsed_secs },
            entry: StakeHistoryEntry {
                op: StakeOp::Claim,
                amount: payout,
                tx_ref: tx_ref.into(),
                at: now,
            },
            event: stake_event(pet, now),
        })
    }
}

fn stake_event(pet: &Pet, now: u64) -> ActivityEvent {
    ActivityEvent {
        user: pet.owner,
        tribe: pet.tribe,
        kind: ActivityKind::StakeChange,
        care_streak: pet.care_streak,
        at: now,
    }
}

fn mul_bps(value: u64, bps: u64) -> Result<u64, StakeError> {
    let product = (value as u128)
        .checked_mul(bps as u128)
        .ok_or(StakeError::ArithmeticOverflow)?
        / totem_core::constants::BPS_PRECISION as u128;
    u64::try_from(product).map_err(|_| StakeError::ArithmeticOverflow)
}
