//! Domain rows and fixed enumerations.
//!
//! Every enumeration here is a closed sum type with *total* mapping
//! functions — an unmatched tribe, stage, or action kind is a compile-time
//! error, never a runtime lookup miss. All timestamps are unix seconds; the
//! engine never reads a clock itself (see [`crate::traits::Clock`]).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{
    ADULT_MIN_ACTIONS, ADULT_MIN_STREAK, ELDER_MIN_ACTIONS, ELDER_MIN_STREAK,
    FEED_COOLDOWN_SECS, JUVENILE_MIN_ACTIONS, PLAY_COOLDOWN_SECS, SLEEP_COOLDOWN_SECS,
    SOCIALIZE_COOLDOWN_SECS, STAT_SCALE,
};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Opaque user identifier assigned by the authentication collaborator.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub u64);

/// Pet identifier. Pets are 1:1 with users but addressed independently.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PetId(pub u64);

/// Raid identifier, one per raid period.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RaidId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user:{}", self.0)
    }
}

impl fmt::Display for PetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pet:{}", self.0)
    }
}

impl fmt::Display for RaidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "raid:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Fixed enumerations
// ---------------------------------------------------------------------------

/// One of the four fixed factions a pet belongs to permanently.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tribe {
    Fofo,
    Caos,
    Chad,
    Degen,
}

impl Tribe {
    /// All tribes, in canonical order. Guild rows and score tables iterate this.
    pub const ALL: [Tribe; 4] = [Tribe::Fofo, Tribe::Caos, Tribe::Chad, Tribe::Degen];

    /// Power multiplier in basis points (10,000 = 1.0×).
    pub fn power_multiplier_bps(&self) -> u64 {
        match self {
            Self::Fofo => 10_000,
            Self::Caos => 10_500,
            Self::Chad => 11_000,
            Self::Degen => 10_250,
        }
    }

    /// Canonical lowercase name used in logs and serialized payloads.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fofo => "fofo",
            Self::Caos => "caos",
            Self::Chad => "chad",
            Self::Degen => "degen",
        }
    }

    /// Stable discriminant for canonical byte encodings.
    pub fn discriminant(&self) -> u8 {
        match self {
            Self::Fofo => 0,
            Self::Caos => 1,
            Self::Chad => 2,
            Self::Degen => 3,
        }
    }
}

impl fmt::Display for Tribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Life stage of a pet. Strictly ordered; a pet's stage only ever increases.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
pub enum Stage {
    #[default]
    Egg,
    Juvenile,
    Adult,
    Elder,
}

impl Stage {
    /// The next stage, or `None` at the terminal stage.
    pub fn next(&self) -> Option<Stage> {
        match self {
            Self::Egg => Some(Self::Juvenile),
            Self::Juvenile => Some(Self::Adult),
            Self::Adult => Some(Self::Elder),
            Self::Elder => None,
        }
    }

    /// Power multiplier in basis points (10,000 = 1.0×).
    pub fn power_multiplier_bps(&self) -> u64 {
        match self {
            Self::Egg => 10_000,
            Self::Juvenile => 12_500,
            Self::Adult => 15_000,
            Self::Elder => 20_000,
        }
    }

    /// Evolution entry requirements as `(min_total_actions, min_care_streak)`,
    /// or `None` for the starting stage.
    pub fn entry_requirements(&self) -> Option<(u64, u32)> {
        match self {
            Self::Egg => None,
            Self::Juvenile => Some((JUVENILE_MIN_ACTIONS, 0)),
            Self::Adult => Some((ADULT_MIN_ACTIONS, ADULT_MIN_STREAK)),
            Self::Elder => Some((ELDER_MIN_ACTIONS, ELDER_MIN_STREAK)),
        }
    }

    /// Stable discriminant for canonical byte encodings.
    pub fn discriminant(&self) -> u8 {
        match self {
            Self::Egg => 0,
            Self::Juvenile => 1,
            Self::Adult => 2,
            Self::Elder => 3,
        }
    }
}

/// A care action a user performs on their pet.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Feed,
    Play,
    Sleep,
    Socialize,
}

/// Stat changes applied by one care action, in milli-points.
/// Negative deltas are costs; all results clamp to `[0, STAT_MAX]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatDeltas {
    pub hunger: i64,
    pub mood: i64,
    pub energy: i64,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Feed,
        ActionKind::Play,
        ActionKind::Sleep,
        ActionKind::Socialize,
    ];

    /// Per-kind cooldown between performances of this action.
    pub fn cooldown_secs(&self) -> u64 {
        match self {
            Self::Feed => FEED_COOLDOWN_SECS,
            Self::Play => PLAY_COOLDOWN_SECS,
            Self::Sleep => SLEEP_COOLDOWN_SECS,
            Self::Socialize => SOCIALIZE_COOLDOWN_SECS,
        }
    }

    /// Fixed stat deltas applied on top of freshly decayed stats.
    pub fn stat_deltas(&self) -> StatDeltas {
        match self {
            Self::Feed => StatDeltas {
                hunger: 30 * STAT_SCALE as i64,
                mood: 2 * STAT_SCALE as i64,
                energy: 0,
            },
            Self::Play => StatDeltas {
                hunger: -(3 * STAT_SCALE as i64),
                mood: 25 * STAT_SCALE as i64,
                energy: -(10 * STAT_SCALE as i64),
            },
            Self::Sleep => StatDeltas {
                hunger: -(2 * STAT_SCALE as i64),
                mood: 0,
                energy: 40 * STAT_SCALE as i64,
            },
            Self::Socialize => StatDeltas {
                hunger: 0,
                mood: 15 * STAT_SCALE as i64,
                energy: -(5 * STAT_SCALE as i64),
            },
        }
    }

    /// Slot in [`Pet::last_action_at`].
    pub fn index(&self) -> usize {
        match self {
            Self::Feed => 0,
            Self::Play => 1,
            Self::Sleep => 2,
            Self::Socialize => 3,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Feed => "feed",
            Self::Play => "play",
            Self::Sleep => "sleep",
            Self::Socialize => "socialize",
        };
        f.write_str(name)
    }
}

/// Lifecycle of a boss raid. Terminal once non-[`Active`](Self::Active).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RaidStatus {
    Pending,
    Active,
    Defeated,
    Expired,
}

impl RaidStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Defeated | Self::Expired)
    }
}

// ---------------------------------------------------------------------------
// Pet
// ---------------------------------------------------------------------------

/// Persistent state of one pet. Owned by exactly one user.
///
/// Stats are stored in milli-points (`0..=STAT_MAX`); presentation divides
/// by [`STAT_SCALE`](crate::constants::STAT_SCALE). `last_updated_at` is the
/// snapshot time the stored stats are valid for — current values are always
/// derived through the vitals calculator, never read raw.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Pet {
    pub id: PetId,
    pub owner: UserId,
    pub tribe: Tribe,
    pub stage: Stage,
    /// Cosmetic variant within the current stage, deterministically rolled.
    pub form_id: u8,
    /// Fixed at creation; the sole entropy source for form selection.
    pub egg_seed: u64,
    pub hunger: u64,
    pub mood: u64,
    pub energy: u64,
    pub reputation: u64,
    pub is_neglected: bool,
    /// When the neglect grace period expired, if currently neglected.
    pub neglected_since: Option<u64>,
    pub care_streak: u32,
    pub total_actions: u64,
    /// Last-performed timestamp per action kind, indexed by [`ActionKind::index`].
    pub last_action_at: [Option<u64>; 4],
    /// Timestamp of the most recent care action of any kind.
    pub last_care_at: Option<u64>,
    pub created_at: u64,
    pub last_updated_at: u64,
}

impl Pet {
    /// A freshly hatched egg with full stats.
    pub fn new(id: PetId, owner: UserId, tribe: Tribe, egg_seed: u64, now: u64) -> Self {
        Self {
            id,
            owner,
            tribe,
            stage: Stage::Egg,
            form_id: 0,
            egg_seed,
            hunger: crate::constants::STAT_MAX,
            mood: crate::constants::STAT_MAX,
            energy: crate::constants::STAT_MAX,
            reputation: 0,
            is_neglected: false,
            neglected_since: None,
            care_streak: 0,
            total_actions: 0,
            last_action_at: [None; 4],
            last_care_at: None,
            created_at: now,
            last_updated_at: now,
        }
    }

    /// Cooldown end for one action kind, or `None` if never performed.
    pub fn cooldown_ends_at(&self, kind: ActionKind) -> Option<u64> {
        self.last_action_at[kind.index()].map(|at| at + kind.cooldown_secs())
    }
}

/// Point-in-time view of a pet's derived stats.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct VitalsSnapshot {
    pub hunger: u64,
    pub mood: u64,
    pub energy: u64,
    pub reputation: u64,
    pub is_neglected: bool,
    pub neglected_since: Option<u64>,
}

// ---------------------------------------------------------------------------
// Staking
// ---------------------------------------------------------------------------

/// The single active stake against a pet. Amounts in raw token units.
///
/// `power` is derived from `(amount_staked, stage, tribe)` and recomputed on
/// every mutating operation — it is never adjusted independently.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Stake {
    pub user: UserId,
    pub pet: PetId,
    pub amount_staked: u64,
    pub power: u64,
    pub staked_at: u64,
    pub last_claim_at: Option<u64>,
}

impl Stake {
    /// Start of the current reward accrual window.
    pub fn accrual_start(&self) -> u64 {
        self.last_claim_at.unwrap_or(self.staked_at).max(self.staked_at)
    }
}

/// Kind of a staking history entry.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StakeOp {
    Stake,
    Unstake,
    Claim,
}

/// Append-only staking history record. `tx_ref` is an opaque reference to
/// the external chain transaction; the engine never validates it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct StakeHistoryEntry {
    pub op: StakeOp,
    pub amount: u64,
    pub tx_ref: String,
    pub at: u64,
}

// ---------------------------------------------------------------------------
// Boss raids
// ---------------------------------------------------------------------------

/// The shared boss health pool for one raid period.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BossRaid {
    pub id: RaidId,
    pub boss_name: String,
    pub boss_hp_max: u64,
    /// Monotonically non-increasing while `status == Active`.
    pub boss_hp_current: u64,
    pub status: RaidStatus,
    pub starts_at: u64,
    pub ends_at: u64,
    /// Set exactly once, by the attack that brings HP to zero.
    pub killing_blow: Option<UserId>,
}

impl BossRaid {
    pub fn new(id: RaidId, boss_name: impl Into<String>, hp: u64, starts_at: u64, ends_at: u64) -> Self {
        Self {
            id,
            boss_name: boss_name.into(),
            boss_hp_max: hp,
            boss_hp_current: hp,
            status: RaidStatus::Pending,
            starts_at,
            ends_at,
            killing_blow: None,
        }
    }
}

/// Per-user raid participation, keyed by `(RaidId, UserId)`.
///
/// `total_damage` is the authoritative sum of damage the engine has accepted
/// for this participant — only ever incremented, never recomputed.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RaidParticipant {
    pub raid: RaidId,
    pub user: UserId,
    pub total_damage: u64,
    pub attack_count: u64,
    pub last_attack_at: Option<u64>,
    pub joined_at: u64,
}

impl RaidParticipant {
    pub fn new(raid: RaidId, user: UserId, now: u64) -> Self {
        Self {
            raid,
            user,
            total_damage: 0,
            attack_count: 0,
            last_attack_at: None,
            joined_at: now,
        }
    }
}

/// Outcome of one attack, returned to the caller.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttackOutcome {
    /// Damage accepted by the boss (0 once the raid is already defeated).
    pub damage: u64,
    pub is_killing_blow: bool,
    pub boss_hp_remaining: u64,
}

// ---------------------------------------------------------------------------
// Guilds and seasons
// ---------------------------------------------------------------------------

/// Tribe treasury and membership aggregate. Exactly four rows exist.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Guild {
    pub tribe: Tribe,
    /// Raw token units; only ever increased by claim burns and contributions.
    pub treasury: u64,
    /// Sum of member stake power, recomputed on demand.
    pub total_power: u64,
    pub member_count: u32,
}

impl Guild {
    pub fn empty(tribe: Tribe) -> Self {
        Self { tribe, treasury: 0, total_power: 0, member_count: 0 }
    }
}

/// One tribe's weekly score row.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct TribeScore {
    pub activity: u64,
    pub social: u64,
    pub consistency: u64,
    pub event: u64,
    pub total: u64,
}

/// A scoring week, bounded `[starts_at, ends_at)`. At most one active at a time.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Week {
    /// ISO weeks elapsed since the unix epoch week.
    pub index: u64,
    pub starts_at: u64,
    pub ends_at: u64,
    pub is_active: bool,
    /// One row per tribe, indexed in [`Tribe::ALL`] order.
    pub scores: [TribeScore; 4],
    /// Set once at close; `None` means not closed yet or an exact tie.
    pub winner: Option<Tribe>,
    /// When `scores` was last computed, for the staleness policy.
    pub computed_at: Option<u64>,
}

impl Week {
    pub fn score_for(&self, tribe: Tribe) -> &TribeScore {
        &self.scores[tribe.discriminant() as usize]
    }
}

/// A season aggregating consecutive completed weeks.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Season {
    pub index: u64,
    /// Week indices belonging to this season.
    pub weeks: Vec<u64>,
    /// Resolved from weekly win counts at season close; `None` on tie.
    pub winner: Option<Tribe>,
}

// ---------------------------------------------------------------------------
// Activity events
// ---------------------------------------------------------------------------

/// Category of a recorded activity event.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivityKind {
    Care(ActionKind),
    RaidJoin,
    RaidAttack,
    StakeChange,
}

/// One activity record, emitted by every mutating care/raid/stake operation
/// and consumed only by the weekly scoring aggregator.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ActivityEvent {
    pub user: UserId,
    pub tribe: Tribe,
    pub kind: ActivityKind,
    /// The pet's care streak at the time of the event.
    pub care_streak: u32,
    pub at: u64,
}

// ---------------------------------------------------------------------------
// Versioned rows and conditional-update outcomes
// ---------------------------------------------------------------------------

/// A stored row plus its optimistic-concurrency version.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Versioned<T> {
    pub row: T,
    pub version: u64,
}

impl<T> Versioned<T> {
    pub fn new(row: T, version: u64) -> Self {
        Self { row, version }
    }
}

/// Outcome of a version-conditional put.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CasOutcome {
    /// The row was written; the new version is returned.
    Committed { new_version: u64 },
    /// The stored version no longer matches; nothing was written.
    Conflict,
}

impl CasOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}

/// Result of the store's atomic clamped HP decrement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HpDecrement {
    /// Damage actually applied (`min(requested, hp_before)`).
    pub applied: u64,
    pub hp_after: u64,
    /// True only for the single decrement that brought HP to zero.
    pub defeated_now: bool,
}
