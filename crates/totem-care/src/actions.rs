//! Care action state machine.
//!
//! Each action kind cycles `Available → OnCooldown → Available` with its own
//! duration. Applying an action always replays decay up to `now` first so
//! deltas land on fresh state, never a stale snapshot. One activity event is
//! emitted per applied action for the weekly scoring aggregator.

use totem_core::constants::STAT_MAX;
use totem_core::error::CareError;
use totem_core::traits::VitalsCalculator;
use totem_core::tuning::{CareTuning, DecayTuning, Tuning};
use totem_core::types::{
    ActionKind, ActivityEvent, ActivityKind, Pet, VitalsSnapshot,
};

use crate::evolution::{self, Evolution};

/// Result of one applied care action. The caller persists `pet` (and the
/// event) with a conditional write; nothing is committed here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionOutcome {
    /// Successor pet row, stats current as of `now`.
    pub pet: Pet,
    /// Stage transition fired by the post-check, if any.
    pub evolution: Option<Evolution>,
    /// Activity record for the scoring aggregator.
    pub event: ActivityEvent,
}

/// The care action engine. Pure and deterministic.
#[derive(Debug, Clone)]
pub struct CareEngine {
    tuning: CareTuning,
    /// Milli-point floor both gated stats must clear to lift neglect.
    neglect_threshold: u64,
}

impl CareEngine {
    pub fn new(care: CareTuning, decay: &DecayTuning) -> Self {
        Self { tuning: care, neglect_threshold: decay.neglect_threshold }
    }

    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self::new(tuning.care.clone(), &tuning.decay)
    }

    /// Validate and apply one care action at `now`.
    ///
    /// Fails [`CareError::ActionOnCooldown`] with the exact cooldown end if
    /// the kind's own cooldown has not elapsed. On success the returned pet
    /// has decayed-then-boosted stats, an updated streak, and has had the
    /// evolution post-check run (at most one stage per call).
    pub fn perform_action(
        &self,
        pet: &Pet,
        vitals: &dyn VitalsCalculator,
        kind: ActionKind,
        now: u64,
    ) -> Result<ActionOutcome, CareError> {
        if let Some(ends_at) = pet.cooldown_ends_at(kind) {
            if now < ends_at {
                return Err(CareError::ActionOnCooldown { kind, ends_at });
            }
        }

        let snap = vitals.decayed_stats(pet, now)?;
        let deltas = kind.stat_deltas();

        let streak = match pet.last_care_at {
            Some(prev) if now.saturating_sub(prev) <= self.tuning.streak_window_secs => {
                pet.care_streak.saturating_add(1)
            }
            _ => 1,
        };

        let reputation_gain = self
            .tuning
            .reputation_per_action
            .saturating_add(self.tuning.reputation_streak_bonus.saturating_mul(u64::from(streak - 1)));

        let hunger = apply_delta(snap.hunger, deltas.hunger);
        let mood = apply_delta(snap.mood, deltas.mood);
        let energy = apply_delta(snap.energy, deltas.energy);
        let reputation = snap
            .reputation
            .saturating_add(reputation_gain)
            .min(self.tuning.reputation_max);

        // Neglect lifts only once both gated stats are back over the floor.
        let (is_neglected, neglected_since) =
            if snap.is_neglected && hunger > self.neglect_threshold && mood > self.neglect_threshold {
                (false, None)
            } else {
                (snap.is_neglected, snap.neglected_since)
            };

        let mut updated = pet.clone();
        updated.hunger = hunger;
        updated.mood = mood;
        updated.energy = energy;
        updated.reputation = reputation;
        updated.is_neglected = is_neglected;
        updated.neglected_since = neglected_since;
        updated.care_streak = streak;
        updated.total_actions = pet.total_actions.saturating_add(1);
        updated.last_action_at[kind.index()] = Some(now);
        updated.last_care_at = Some(now);
        updated.last_updated_at = now;

        let evolution = evolution::try_advance(&mut updated);

        let event = ActivityEvent {
            user: pet.owner,
            tribe: pet.tribe,
            kind: ActivityKind::Care(kind),
            care_streak: streak,
            at: now,
        };

        Ok(ActionOutcome { pet: updated, evolution, event })
    }

    /// Current derived stats without applying anything. Convenience for
    /// read-only pet views.
    pub fn current_vitals(
        &self,
        pet: &Pet,
        vitals: &dyn VitalsCalculator,
        now: u64,
    ) -> Result<VitalsSnapshot, CareError> {
        Ok(vitals.decayed_stats(pet, now)?)
    }
}

impl Default for CareEngine {
    fn default() -> Self {
        Self::new(CareTuning::default(), &DecayTuning::default())
    }
}

/// Apply a signed milli-point delta, clamping into `[0, STAT_MAX]`.
fn apply_delta(value: u64, delta: i64) -> u64 {
    let result = value as i128 + delta as i128;
    result.clamp(0, STAT_MAX as i128) as u64
}
