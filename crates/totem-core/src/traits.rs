//! Trait interfaces for the Totem engine.
//!
//! These traits define the contracts between crates:
//! - [`Clock`] — the single injected time source (no ambient clock reads)
//! - [`VitalsCalculator`] — pure stat decay math (totem-vitals implements)
//! - [`PetStore`], [`StakeStore`], [`RaidStore`], [`SeasonStore`],
//!   [`EventStore`] — persistence contracts with per-row conditional
//!   updates (totem-den's `MemoryStore` implements; a persistent backend
//!   is the external collaborator's concern)
//!
//! Store writes are optimistic: callers read a [`Versioned`] snapshot,
//! compute the successor row, and commit with `put_*_if(expected_version)`.
//! A [`CasOutcome::Conflict`] means another writer won; re-read and retry.
//! The one semantic atomic operation is [`RaidStore::decrement_boss_hp`],
//! which must clamp and transition to defeated under a single serialization
//! point so concurrent attackers can never observe stale HP.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{StoreError, VitalsError};
use crate::types::{
    ActivityEvent, BossRaid, CasOutcome, Guild, HpDecrement, Pet, PetId, RaidId,
    RaidParticipant, Season, Stake, StakeHistoryEntry, Tribe, UserId, Versioned,
    VitalsSnapshot, Week,
};

/// Monotonic wall-clock source. Implementations must be cheap to call.
pub trait Clock: Send + Sync {
    /// Current time as unix seconds.
    fn now_unix(&self) -> u64;
}

/// Production clock backed by the system time. The only place in the
/// workspace that touches ambient time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Settable clock for tests: freeze, then advance explicitly.
#[derive(Debug, Default)]
pub struct FrozenClock(AtomicU64);

impl FrozenClock {
    pub fn at(now: u64) -> Self {
        Self(AtomicU64::new(now))
    }

    pub fn set(&self, now: u64) {
        self.0.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for FrozenClock {
    fn now_unix(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Pure computation of decayed pet stats.
///
/// Deterministic and idempotent: the same `(pet, now)` always yields the
/// same snapshot, and `now == pet.last_updated_at` returns the stored
/// values unchanged. Implemented by totem-vitals.
pub trait VitalsCalculator: Send + Sync {
    /// Current stats of `pet` at `now`, including the neglect predicate.
    fn decayed_stats(&self, pet: &Pet, now: u64) -> Result<VitalsSnapshot, VitalsError>;

    /// Whether the pet is neglected at `now`.
    ///
    /// Default implementation delegates to [`decayed_stats`](Self::decayed_stats).
    fn is_neglected(&self, pet: &Pet, now: u64) -> Result<bool, VitalsError> {
        Ok(self.decayed_stats(pet, now)?.is_neglected)
    }
}

/// Pet rows with per-row conditional updates.
pub trait PetStore: Send + Sync {
    /// Look up a pet. Returns `None` if unknown.
    fn pet(&self, id: PetId) -> Result<Option<Versioned<Pet>>, StoreError>;

    /// Insert a new pet. Fails `Internal` if the id already exists.
    fn insert_pet(&self, pet: Pet) -> Result<Versioned<Pet>, StoreError>;

    /// Conditionally replace a pet row.
    fn put_pet_if(&self, expected_version: u64, pet: Pet) -> Result<CasOutcome, StoreError>;

    /// Snapshot of every pet. Used by matchmaking and guild aggregation.
    /// Default implementation returns empty vec (override for production).
    fn iter_pets(&self) -> Result<Vec<Versioned<Pet>>, StoreError> {
        Ok(Vec::new())
    }

    /// The pet owned by `owner`, if any. Pets are 1:1 with users.
    ///
    /// Default implementation scans [`iter_pets`](Self::iter_pets).
    fn pet_by_owner(&self, owner: UserId) -> Result<Option<Versioned<Pet>>, StoreError> {
        Ok(self.iter_pets()?.into_iter().find(|v| v.row.owner == owner))
    }
}

/// Stake rows (one active stake per pet) plus append-only history.
pub trait StakeStore: Send + Sync {
    fn stake(&self, pet: PetId) -> Result<Option<Versioned<Stake>>, StoreError>;

    /// Conditionally write a stake row. `expected_version == 0` creates the
    /// row and fails with [`CasOutcome::Conflict`] if one already exists.
    fn put_stake_if(&self, expected_version: u64, stake: Stake) -> Result<CasOutcome, StoreError>;

    fn push_history(&self, pet: PetId, entry: StakeHistoryEntry) -> Result<(), StoreError>;

    fn history(&self, pet: PetId) -> Result<Vec<StakeHistoryEntry>, StoreError>;

    /// Snapshot of every active stake.
    /// Default implementation returns empty vec (override for production).
    fn iter_stakes(&self) -> Result<Vec<Versioned<Stake>>, StoreError> {
        Ok(Vec::new())
    }
}

/// Raid rows, participants, and the mandated atomic HP decrement.
pub trait RaidStore: Send + Sync {
    fn raid(&self, id: RaidId) -> Result<Option<Versioned<BossRaid>>, StoreError>;

    /// Idempotent create: returns the existing row if `raid.id` is known.
    fn upsert_raid(&self, raid: BossRaid) -> Result<Versioned<BossRaid>, StoreError>;

    fn put_raid_if(&self, expected_version: u64, raid: BossRaid) -> Result<CasOutcome, StoreError>;

    /// Atomic decrement-if-and-clamp of the boss health pool.
    ///
    /// Applies `min(amount, hp_current)`, transitions Active → Defeated
    /// exactly once when HP reaches zero (recording `attacker` as the
    /// killing blow), and reports what happened. Once the raid is no longer
    /// Active the decrement applies 0. This is the one operation that must
    /// be serializable across participants regardless of row partitioning.
    fn decrement_boss_hp(
        &self,
        id: RaidId,
        attacker: UserId,
        amount: u64,
    ) -> Result<HpDecrement, StoreError>;

    fn participant(
        &self,
        raid: RaidId,
        user: UserId,
    ) -> Result<Option<Versioned<RaidParticipant>>, StoreError>;

    /// Conditionally write a participant row; `expected_version == 0` creates.
    fn put_participant_if(
        &self,
        expected_version: u64,
        participant: RaidParticipant,
    ) -> Result<CasOutcome, StoreError>;

    /// All participants of a raid, unordered.
    fn participants(&self, raid: RaidId) -> Result<Vec<RaidParticipant>, StoreError>;
}

/// Weeks, seasons, and guild aggregates.
pub trait SeasonStore: Send + Sync {
    fn week(&self, index: u64) -> Result<Option<Versioned<Week>>, StoreError>;

    /// The single `is_active` week, if any.
    fn active_week(&self) -> Result<Option<Versioned<Week>>, StoreError>;

    /// Idempotent create keyed by `week.index`: returns the existing row if
    /// present, never resets scores.
    fn upsert_week(&self, week: Week) -> Result<Versioned<Week>, StoreError>;

    fn put_week_if(&self, expected_version: u64, week: Week) -> Result<CasOutcome, StoreError>;

    fn season(&self, index: u64) -> Result<Option<Versioned<Season>>, StoreError>;

    fn upsert_season(&self, season: Season) -> Result<Versioned<Season>, StoreError>;

    fn put_season_if(&self, expected_version: u64, season: Season)
        -> Result<CasOutcome, StoreError>;

    /// Guild row for a tribe. All four rows exist from store creation.
    fn guild(&self, tribe: Tribe) -> Result<Versioned<Guild>, StoreError>;

    fn put_guild_if(&self, expected_version: u64, guild: Guild) -> Result<CasOutcome, StoreError>;
}

/// Append-only activity event log consumed by the scoring aggregator.
pub trait EventStore: Send + Sync {
    fn record_event(&self, event: ActivityEvent) -> Result<(), StoreError>;

    /// Events with `start <= at < end`, in insertion order.
    fn events_between(&self, start: u64, end: u64) -> Result<Vec<ActivityEvent>, StoreError>;
}
