//! Stat decay engine implementing the [`VitalsCalculator`] trait.
//!
//! Decay is linear per elapsed second at a per-day rate, evaluated with
//! u128 intermediates. Elapsed time is `now.saturating_sub(last_updated_at)`:
//! a backwards clock behaves as zero elapsed and can never un-decay a stat.

use totem_core::constants::SECS_PER_DAY;
use totem_core::error::VitalsError;
use totem_core::traits::VitalsCalculator;
use totem_core::tuning::DecayTuning;
use totem_core::types::{Pet, VitalsSnapshot};

/// The production vitals calculator.
///
/// Implements [`VitalsCalculator`] with:
/// - Independent per-stat linear decay rates
/// - Zero-elapsed identity and monotone decrease
/// - Analytic threshold-crossing reconstruction for the neglect predicate
#[derive(Debug, Clone, Default)]
pub struct StatDecay {
    tuning: DecayTuning,
}

impl StatDecay {
    pub fn new(tuning: DecayTuning) -> Self {
        Self { tuning }
    }

    /// The stat value after `elapsed_secs` of decay at `rate_per_day`.
    fn decay(value: u64, rate_per_day: u64, elapsed_secs: u64) -> Result<u64, VitalsError> {
        if elapsed_secs == 0 || rate_per_day == 0 || value == 0 {
            return Ok(value);
        }
        let lost = (rate_per_day as u128)
            .checked_mul(elapsed_secs as u128)
            .ok_or(VitalsError::ArithmeticOverflow)?
            / SECS_PER_DAY as u128;
        Ok(value.saturating_sub(lost.min(u64::MAX as u128) as u64))
    }

    /// The instant this stat's neglect grace period expires, assuming no
    /// further care, or `None` if it never will.
    ///
    /// For a stat already at or below the threshold, the crossing instant is
    /// reconstructed backwards along the linear trajectory; for a stat still
    /// above it, forwards. A zero rate pins the crossing to the snapshot
    /// time when already below, and means "never" otherwise.
    fn neglect_onset(&self, stored: u64, rate_per_day: u64, last_updated_at: u64) -> Option<u64> {
        let threshold = self.tuning.neglect_threshold;
        let grace = self.tuning.neglect_grace_secs;

        if stored <= threshold {
            let below_for = if rate_per_day == 0 {
                0
            } else {
                secs_to_decay(threshold - stored, rate_per_day)
            };
            Some(last_updated_at.saturating_sub(below_for).saturating_add(grace))
        } else if rate_per_day == 0 {
            None
        } else {
            let until_cross = secs_to_decay(stored - threshold, rate_per_day);
            Some(last_updated_at.saturating_add(until_cross).saturating_add(grace))
        }
    }
}

/// Seconds of decay needed to lose `delta` milli-points at `rate_per_day`.
fn secs_to_decay(delta: u64, rate_per_day: u64) -> u64 {
    let secs = (delta as u128) * SECS_PER_DAY as u128 / rate_per_day as u128;
    secs.min(u64::MAX as u128) as u64
}

impl VitalsCalculator for StatDecay {
    fn decayed_stats(&self, pet: &Pet, now: u64) -> Result<VitalsSnapshot, VitalsError> {
        let elapsed = now.saturating_sub(pet.last_updated_at);
        let t = &self.tuning;

        let hunger = Self::decay(pet.hunger, t.hunger_per_day, elapsed)?;
        let mood = Self::decay(pet.mood, t.mood_per_day, elapsed)?;
        let energy = Self::decay(pet.energy, t.energy_per_day, elapsed)?;
        let reputation = Self::decay(pet.reputation, t.reputation_per_day, elapsed)?;

        // Neglect is sticky: once flagged, only a care action clears it.
        let (is_neglected, neglected_since) = if pet.is_neglected {
            (true, pet.neglected_since)
        } else {
            let onset = [
                (pet.hunger, t.hunger_per_day),
                (pet.mood, t.mood_per_day),
            ]
            .into_iter()
            .filter_map(|(stored, rate)| self.neglect_onset(stored, rate, pet.last_updated_at))
            .min();

            match onset {
                Some(at) if at <= now => (true, Some(at)),
                _ => (false, None),
            }
        };

        Ok(VitalsSnapshot { hunger, mood, energy, reputation, is_neglected, neglected_since })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use totem_core::constants::{
        HUNGER_DECAY_PER_DAY, NEGLECT_GRACE_SECS, NEGLECT_THRESHOLD, SECS_PER_DAY, STAT_MAX,
    };
    use totem_core::types::{PetId, Tribe, UserId};

    fn engine() -> StatDecay {
        StatDecay::default()
    }

    fn pet_at(created: u64) -> Pet {
        Pet::new(PetId(1), UserId(1), Tribe::Fofo, 0xa5a5, created)
    }

    // --- identity and basic decay ---

    #[test]
    fn identity_at_zero_elapsed() {
        let pet = pet_at(1_000);
        let snap = engine().decayed_stats(&pet, 1_000).unwrap();
        assert_eq!(snap.hunger, pet.hunger);
        assert_eq!(snap.mood, pet.mood);
        assert_eq!(snap.energy, pet.energy);
        assert_eq!(snap.reputation, pet.reputation);
        assert!(!snap.is_neglected);
    }

    #[test]
    fn one_day_drops_exactly_the_daily_rate() {
        let pet = pet_at(0);
        let snap = engine().decayed_stats(&pet, SECS_PER_DAY).unwrap();
        assert_eq!(snap.hunger, STAT_MAX - HUNGER_DECAY_PER_DAY);
    }

    #[test]
    fn backwards_clock_behaves_as_zero_elapsed() {
        let pet = pet_at(10_000);
        let snap = engine().decayed_stats(&pet, 5_000).unwrap();
        assert_eq!(snap.hunger, pet.hunger);
        assert_eq!(snap.energy, pet.energy);
    }

    #[test]
    fn stats_clamp_at_zero() {
        let pet = pet_at(0);
        // A year of total neglect.
        let snap = engine().decayed_stats(&pet, 365 * SECS_PER_DAY).unwrap();
        assert_eq!(snap.hunger, 0);
        assert_eq!(snap.mood, 0);
        assert_eq!(snap.energy, 0);
    }

    #[test]
    fn zero_rate_freezes_a_stat() {
        let tuning = DecayTuning { energy_per_day: 0, ..DecayTuning::default() };
        let pet = pet_at(0);
        let snap = StatDecay::new(tuning).decayed_stats(&pet, 30 * SECS_PER_DAY).unwrap();
        assert_eq!(snap.energy, STAT_MAX);
        assert!(snap.hunger < STAT_MAX);
    }

    // --- neglect ---

    /// Seconds for hunger to decay from full to the neglect threshold.
    fn secs_until_hunger_threshold() -> u64 {
        (STAT_MAX - NEGLECT_THRESHOLD) * SECS_PER_DAY / HUNGER_DECAY_PER_DAY
    }

    #[test]
    fn not_neglected_before_grace_expires() {
        let pet = pet_at(0);
        let at_threshold = secs_until_hunger_threshold();
        let snap = engine()
            .decayed_stats(&pet, at_threshold + NEGLECT_GRACE_SECS - 1)
            .unwrap();
        assert!(!snap.is_neglected);
        assert_eq!(snap.neglected_since, None);
    }

    #[test]
    fn neglected_once_grace_expires() {
        let pet = pet_at(0);
        let onset = secs_until_hunger_threshold() + NEGLECT_GRACE_SECS;
        let snap = engine().decayed_stats(&pet, onset + 1).unwrap();
        assert!(snap.is_neglected);
        assert_eq!(snap.neglected_since, Some(onset));
    }

    #[test]
    fn neglect_onset_reconstructed_from_below_threshold_snapshot() {
        // Snapshot taken when hunger was already one grace-period's worth of
        // decay below the threshold: neglected immediately at snapshot time.
        let below = NEGLECT_GRACE_SECS * HUNGER_DECAY_PER_DAY / SECS_PER_DAY;
        let mut pet = pet_at(100_000);
        pet.hunger = NEGLECT_THRESHOLD - below;
        let snap = engine().decayed_stats(&pet, 100_000 + 1).unwrap();
        assert!(snap.is_neglected);
        assert_eq!(snap.neglected_since, Some(100_000));
    }

    #[test]
    fn neglect_is_sticky_until_cleared() {
        let mut pet = pet_at(0);
        pet.is_neglected = true;
        pet.neglected_since = Some(50);
        // Full stats, zero elapsed: flag persists anyway.
        let snap = engine().decayed_stats(&pet, 0).unwrap();
        assert!(snap.is_neglected);
        assert_eq!(snap.neglected_since, Some(50));
    }

    #[test]
    fn mood_alone_can_trigger_neglect() {
        let mut pet = pet_at(0);
        pet.hunger = STAT_MAX;
        pet.mood = NEGLECT_THRESHOLD;
        let tuning = DecayTuning { hunger_per_day: 0, ..DecayTuning::default() };
        let snap = StatDecay::new(tuning)
            .decayed_stats(&pet, NEGLECT_GRACE_SECS)
            .unwrap();
        assert!(snap.is_neglected);
    }

    #[test]
    fn energy_never_triggers_neglect() {
        let mut pet = pet_at(0);
        pet.energy = 0;
        let tuning = DecayTuning {
            hunger_per_day: 0,
            mood_per_day: 0,
            ..DecayTuning::default()
        };
        let snap = StatDecay::new(tuning)
            .decayed_stats(&pet, 10 * SECS_PER_DAY)
            .unwrap();
        assert!(!snap.is_neglected);
    }

    #[test]
    fn is_neglected_helper_matches_snapshot() {
        let pet = pet_at(0);
        let e = engine();
        let far = 30 * SECS_PER_DAY;
        assert_eq!(
            e.is_neglected(&pet, far).unwrap(),
            e.decayed_stats(&pet, far).unwrap().is_neglected
        );
    }

    // --- proptest invariants ---

    proptest! {
        #[test]
        fn decay_monotone_in_time(
            t1 in 0u64..=10 * SECS_PER_DAY,
            t2 in 0u64..=10 * SECS_PER_DAY,
        ) {
            let pet = pet_at(0);
            let (lo, hi) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
            let a = engine().decayed_stats(&pet, lo).unwrap();
            let b = engine().decayed_stats(&pet, hi).unwrap();
            prop_assert!(b.hunger <= a.hunger);
            prop_assert!(b.mood <= a.mood);
            prop_assert!(b.energy <= a.energy);
            prop_assert!(b.reputation <= a.reputation);
        }

        #[test]
        fn decayed_stats_always_in_range(
            hunger in 0u64..=STAT_MAX,
            mood in 0u64..=STAT_MAX,
            energy in 0u64..=STAT_MAX,
            elapsed in 0u64..=400 * SECS_PER_DAY,
        ) {
            let mut pet = pet_at(0);
            pet.hunger = hunger;
            pet.mood = mood;
            pet.energy = energy;
            let snap = engine().decayed_stats(&pet, elapsed).unwrap();
            prop_assert!(snap.hunger <= STAT_MAX);
            prop_assert!(snap.mood <= STAT_MAX);
            prop_assert!(snap.energy <= STAT_MAX);
        }

        #[test]
        fn determinism_same_inputs_same_outputs(
            elapsed in 0u64..=100 * SECS_PER_DAY,
        ) {
            let pet = pet_at(0);
            let a = engine().decayed_stats(&pet, elapsed).unwrap();
            let b = engine().decayed_stats(&pet, elapsed).unwrap();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn neglect_monotone_once_set(
            elapsed in 0u64..=30 * SECS_PER_DAY,
            extra in 0u64..=30 * SECS_PER_DAY,
        ) {
            // If neglected at t, still neglected at t + extra (without care).
            let pet = pet_at(0);
            let early = engine().decayed_stats(&pet, elapsed).unwrap();
            let late = engine().decayed_stats(&pet, elapsed + extra).unwrap();
            if early.is_neglected {
                prop_assert!(late.is_neglected);
                prop_assert_eq!(early.neglected_since, late.neglected_since);
            }
        }
    }
}
