//! Raid damage engine.
//!
//! Attacks run in three steps, each against the store's conditional-update
//! primitives so concurrent attackers serialize correctly:
//!
//! 1. **Reserve** the attack on the participant row (cooldown check + count
//!    bump) with a version-conditional put — two duplicate requests race on
//!    the version and the loser re-reads straight into the cooldown error.
//! 2. **Decrement** boss HP through [`RaidStore::decrement_boss_hp`], the
//!    store's atomic clamp-and-transition. Damage arriving after HP hit
//!    zero applies 0 and is a no-op outcome, not an error.
//! 3. **Fold** the accepted damage into the participant's running total.
//!    This is a pure increment, retried until committed, so recorded
//!    per-participant damage always sums to exactly the HP removed.

use tracing::debug;

use totem_core::constants::BPS_PRECISION;
use totem_core::error::{RaidError, StoreError};
use totem_core::traits::RaidStore;
use totem_core::tuning::RaidTuning;
use totem_core::types::{
    ActivityEvent, ActivityKind, AttackOutcome, BossRaid, CasOutcome, Pet, RaidId,
    RaidParticipant, RaidStatus, UserId,
};

/// Result of a join request. Joining twice is idempotent: the existing row
/// comes back with `newly_joined == false` and no event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinOutcome {
    pub participant: RaidParticipant,
    pub newly_joined: bool,
    pub event: Option<ActivityEvent>,
}

/// Deterministic damage for one attack.
///
/// Base damage is the attacker's current power; on top, a bounded bonus in
/// `[0, damage_variance_bps]` BPS is derived from a BLAKE3 digest of
/// `(raid, user, attack_index)`. Reproducible by construction: replaying
/// the same attack sequence rolls the same damage.
pub fn damage_roll(
    power: u64,
    raid: RaidId,
    user: UserId,
    attack_index: u64,
    tuning: &RaidTuning,
) -> Result<u64, RaidError> {
    let bonus_bps = if tuning.damage_variance_bps == 0 {
        0
    } else {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&raid.0.to_le_bytes());
        hasher.update(&user.0.to_le_bytes());
        hasher.update(&attack_index.to_le_bytes());
        let digest = hasher.finalize();
        let mut word = [0u8; 8];
        word.copy_from_slice(&digest.as_bytes()[..8]);
        u64::from_le_bytes(word) % (tuning.damage_variance_bps + 1)
    };

    let damage = (power as u128)
        .checked_mul((BPS_PRECISION + bonus_bps) as u128)
        .ok_or(RaidError::ArithmeticOverflow)?
        / BPS_PRECISION as u128;
    u64::try_from(damage).map_err(|_| RaidError::ArithmeticOverflow)
}

/// The raid engine. Holds tuning only; all state lives behind [`RaidStore`].
#[derive(Debug, Clone, Default)]
pub struct RaidEngine {
    tuning: RaidTuning,
}

impl RaidEngine {
    pub fn new(tuning: RaidTuning) -> Self {
        Self { tuning }
    }

    /// Pending → Active at `starts_at`, Active → Expired at `ends_at` with
    /// HP remaining. Returns the successor row to commit, or `None` if no
    /// transition is due. Terminal states never transition.
    pub fn lifecycle_transition(raid: &BossRaid, now: u64) -> Option<BossRaid> {
        match raid.status {
            RaidStatus::Pending if now >= raid.starts_at && now < raid.ends_at => {
                let mut next = raid.clone();
                next.status = RaidStatus::Active;
                Some(next)
            }
            RaidStatus::Active if now >= raid.ends_at => {
                let mut next = raid.clone();
                next.status = RaidStatus::Expired;
                Some(next)
            }
            _ => None,
        }
    }

    /// Join a raid. Refused while the raid is not active or the pet is
    /// neglected; idempotent per `(raid, user)`.
    pub fn join(
        &self,
        store: &dyn RaidStore,
        raid_id: RaidId,
        pet: &Pet,
        is_neglected: bool,
        now: u64,
    ) -> Result<JoinOutcome, RaidError> {
        let vraid = store
            .raid(raid_id)?
            .ok_or(StoreError::RaidNotFound(raid_id))?;
        if vraid.row.status != RaidStatus::Active || now >= vraid.row.ends_at {
            return Err(RaidError::RaidNotActive { status: vraid.row.status });
        }
        if is_neglected {
            return Err(RaidError::NeglectedPet);
        }

        let user = pet.owner;
        if let Some(existing) = store.participant(raid_id, user)? {
            return Ok(JoinOutcome {
                participant: existing.row,
                newly_joined: false,
                event: None,
            });
        }

        let fresh = RaidParticipant::new(raid_id, user, now);
        match store.put_participant_if(0, fresh.clone())? {
            CasOutcome::Committed { .. } => Ok(JoinOutcome {
                participant: fresh,
                newly_joined: true,
                event: Some(ActivityEvent {
                    user,
                    tribe: pet.tribe,
                    kind: ActivityKind::RaidJoin,
                    care_streak: pet.care_streak,
                    at: now,
                }),
            }),
            CasOutcome::Conflict => {
                // A concurrent join won the create; fall back to it.
                let existing = store
                    .participant(raid_id, user)?
                    .ok_or(StoreError::ConflictRace)?;
                Ok(JoinOutcome {
                    participant: existing.row,
                    newly_joined: false,
                    event: None,
                })
            }
        }
    }

    /// Attack the boss with the user's current pet power.
    pub fn attack(
        &self,
        store: &dyn RaidStore,
        raid_id: RaidId,
        user: UserId,
        power: u64,
        now: u64,
    ) -> Result<AttackOutcome, RaidError> {
        let vraid = store
            .raid(raid_id)?
            .ok_or(StoreError::RaidNotFound(raid_id))?;
        let raid = &vraid.row;
        match raid.status {
            // A defeated raid is a no-op outcome for late attackers.
            RaidStatus::Defeated => {
                return Ok(AttackOutcome {
                    damage: 0,
                    is_killing_blow: false,
                    boss_hp_remaining: raid.boss_hp_current,
                });
            }
            RaidStatus::Active if now < raid.ends_at => {}
            RaidStatus::Active => {
                return Err(RaidError::RaidNotActive { status: RaidStatus::Expired });
            }
            status => return Err(RaidError::RaidNotActive { status }),
        }

        // Reserve the attack slot: one internal retry on a lost version race,
        // after which the re-read sees the winner's timestamp and fails the
        // cooldown check instead of double-attacking.
        let mut retried = false;
        let (attack_index, mut folded, mut version) = loop {
            let vp = store
                .participant(raid_id, user)?
                .ok_or(RaidError::NotJoined { raid: raid_id, user })?;
            if let Some(last) = vp.row.last_attack_at {
                let ends_at = last + self.tuning.attack_cooldown_secs;
                if now < ends_at {
                    return Err(RaidError::AttackOnCooldown { ends_at });
                }
            }
            let mut reserved = vp.row.clone();
            reserved.attack_count += 1;
            reserved.last_attack_at = Some(now);
            match store.put_participant_if(vp.version, reserved.clone())? {
                CasOutcome::Committed { new_version } => {
                    break (vp.row.attack_count, reserved, new_version);
                }
                CasOutcome::Conflict if !retried => retried = true,
                CasOutcome::Conflict => return Err(StoreError::ConflictRace.into()),
            }
        };

        let damage = damage_roll(power, raid_id, user, attack_index, &self.tuning)?;
        let dec = store.decrement_boss_hp(raid_id, user, damage)?;

        if dec.defeated_now {
            debug!(%raid_id, %user, damage = dec.applied, "boss defeated, killing blow recorded");
        }

        if dec.applied > 0 {
            // Pure increment of the accepted damage; retried until committed
            // so the participant ledger exactly mirrors HP removed.
            loop {
                folded.total_damage += dec.applied;
                match store.put_participant_if(version, folded.clone())? {
                    CasOutcome::Committed { .. } => break,
                    CasOutcome::Conflict => {
                        let vp = store
                            .participant(raid_id, user)?
                            .ok_or(StoreError::ConflictRace)?;
                        folded = vp.row;
                        version = vp.version;
                    }
                }
            }
        }

        Ok(AttackOutcome {
            damage: dec.applied,
            is_killing_blow: dec.defeated_now,
            boss_hp_remaining: dec.hp_after,
        })
    }
}
