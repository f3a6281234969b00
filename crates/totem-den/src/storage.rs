//! In-memory store with per-row conditional updates.
//!
//! Every entity family lives in its own [`DashMap`], so row locks are
//! per-key: concurrent operations on different pets (or different raids)
//! never contend. Writes are version-CAS — a put only lands if the caller
//! read the version it is replacing — and the boss HP decrement runs
//! entirely under the raid row's entry lock, which is what makes it a
//! monotone decrement-if-and-clamp no attacker can observe stale HP
//! through.
//!
//! Suitable for tests and single-process deployments; a persistent backend
//! implements the same traits out of tree.

use std::hash::Hash;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;

use totem_core::error::StoreError;
use totem_core::traits::{EventStore, PetStore, RaidStore, SeasonStore, StakeStore};
use totem_core::types::{
    ActivityEvent, BossRaid, CasOutcome, Guild, HpDecrement, Pet, PetId, RaidId,
    RaidParticipant, RaidStatus, Season, Stake, StakeHistoryEntry, Tribe, UserId, Versioned,
    Week,
};

/// DashMap-backed store implementing every Totem store trait.
pub struct MemoryStore {
    pets: DashMap<PetId, Versioned<Pet>>,
    stakes: DashMap<PetId, Versioned<Stake>>,
    stake_history: DashMap<PetId, Vec<StakeHistoryEntry>>,
    raids: DashMap<RaidId, Versioned<BossRaid>>,
    participants: DashMap<(RaidId, UserId), Versioned<RaidParticipant>>,
    weeks: DashMap<u64, Versioned<Week>>,
    seasons: DashMap<u64, Versioned<Season>>,
    guilds: DashMap<Tribe, Versioned<Guild>>,
    events: RwLock<Vec<ActivityEvent>>,
}

impl MemoryStore {
    /// Empty store with the four fixed guild rows seeded.
    pub fn new() -> Self {
        let guilds = DashMap::new();
        for tribe in Tribe::ALL {
            guilds.insert(tribe, Versioned::new(Guild::empty(tribe), 1));
        }
        Self {
            pets: DashMap::new(),
            stakes: DashMap::new(),
            stake_history: DashMap::new(),
            raids: DashMap::new(),
            participants: DashMap::new(),
            weeks: DashMap::new(),
            seasons: DashMap::new(),
            guilds,
            events: RwLock::new(Vec::new()),
        }
    }

    /// The non-terminal raid whose window contains `now`, lowest id first.
    pub fn raid_in_window(&self, now: u64) -> Option<Versioned<BossRaid>> {
        self.raids
            .iter()
            .filter(|entry| {
                let raid = &entry.value().row;
                !raid.status.is_terminal() && now >= raid.starts_at && now < raid.ends_at
            })
            .min_by_key(|entry| entry.value().row.id)
            .map(|entry| entry.value().clone())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Version-conditional put into a DashMap of [`Versioned`] rows.
///
/// `expected_version == 0` means "create": it commits only into a vacant
/// slot. Any version mismatch is a [`CasOutcome::Conflict`], never an error.
fn cas_put<K, V>(
    map: &DashMap<K, Versioned<V>>,
    key: K,
    expected_version: u64,
    row: V,
) -> CasOutcome
where
    K: Eq + Hash,
{
    match map.entry(key) {
        Entry::Occupied(mut occupied) => {
            let stored = occupied.get_mut();
            if stored.version == expected_version {
                stored.row = row;
                stored.version += 1;
                CasOutcome::Committed { new_version: stored.version }
            } else {
                CasOutcome::Conflict
            }
        }
        Entry::Vacant(vacant) => {
            if expected_version == 0 {
                vacant.insert(Versioned::new(row, 1));
                CasOutcome::Committed { new_version: 1 }
            } else {
                CasOutcome::Conflict
            }
        }
    }
}

impl PetStore for MemoryStore {
    fn pet(&self, id: PetId) -> Result<Option<Versioned<Pet>>, StoreError> {
        Ok(self.pets.get(&id).map(|v| v.clone()))
    }

    fn insert_pet(&self, pet: Pet) -> Result<Versioned<Pet>, StoreError> {
        match self.pets.entry(pet.id) {
            Entry::Occupied(_) => {
                Err(StoreError::Internal(format!("{} already exists", pet.id)))
            }
            Entry::Vacant(vacant) => {
                let v = Versioned::new(pet, 1);
                vacant.insert(v.clone());
                Ok(v)
            }
        }
    }

    fn put_pet_if(&self, expected_version: u64, pet: Pet) -> Result<CasOutcome, StoreError> {
        Ok(cas_put(&self.pets, pet.id, expected_version, pet))
    }

    fn iter_pets(&self) -> Result<Vec<Versioned<Pet>>, StoreError> {
        Ok(self.pets.iter().map(|entry| entry.value().clone()).collect())
    }
}

impl StakeStore for MemoryStore {
    fn stake(&self, pet: PetId) -> Result<Option<Versioned<Stake>>, StoreError> {
        Ok(self.stakes.get(&pet).map(|v| v.clone()))
    }

    fn put_stake_if(&self, expected_version: u64, stake: Stake) -> Result<CasOutcome, StoreError> {
        Ok(cas_put(&self.stakes, stake.pet, expected_version, stake))
    }

    fn push_history(&self, pet: PetId, entry: StakeHistoryEntry) -> Result<(), StoreError> {
        self.stake_history.entry(pet).or_default().push(entry);
        Ok(())
    }

    fn history(&self, pet: PetId) -> Result<Vec<StakeHistoryEntry>, StoreError> {
        Ok(self.stake_history.get(&pet).map(|v| v.clone()).unwrap_or_default())
    }

    fn iter_stakes(&self) -> Result<Vec<Versioned<Stake>>, StoreError> {
        Ok(self.stakes.iter().map(|entry| entry.value().clone()).collect())
    }
}

impl RaidStore for MemoryStore {
    fn raid(&self, id: RaidId) -> Result<Option<Versioned<BossRaid>>, StoreError> {
        Ok(self.raids.get(&id).map(|v| v.clone()))
    }

    fn upsert_raid(&self, raid: BossRaid) -> Result<Versioned<BossRaid>, StoreError> {
        match self.raids.entry(raid.id) {
            Entry::Occupied(occupied) => Ok(occupied.get().clone()),
            Entry::Vacant(vacant) => {
                let v = Versioned::new(raid, 1);
                vacant.insert(v.clone());
                Ok(v)
            }
        }
    }

    fn put_raid_if(&self, expected_version: u64, raid: BossRaid) -> Result<CasOutcome, StoreError> {
        Ok(cas_put(&self.raids, raid.id, expected_version, raid))
    }

    fn decrement_boss_hp(
        &self,
        id: RaidId,
        attacker: UserId,
        amount: u64,
    ) -> Result<HpDecrement, StoreError> {
        // The entry guard serializes every decrement against this raid row.
        let mut guard = self.raids.get_mut(&id).ok_or(StoreError::RaidNotFound(id))?;
        let stored = guard.value_mut();
        if stored.row.status != RaidStatus::Active {
            return Ok(HpDecrement {
                applied: 0,
                hp_after: stored.row.boss_hp_current,
                defeated_now: false,
            });
        }

        let applied = amount.min(stored.row.boss_hp_current);
        stored.row.boss_hp_current -= applied;
        let defeated_now = applied > 0 && stored.row.boss_hp_current == 0;
        if defeated_now {
            stored.row.status = RaidStatus::Defeated;
            stored.row.killing_blow = Some(attacker);
        }
        if applied > 0 {
            stored.version += 1;
        }
        Ok(HpDecrement { applied, hp_after: stored.row.boss_hp_current, defeated_now })
    }

    fn participant(
        &self,
        raid: RaidId,
        user: UserId,
    ) -> Result<Option<Versioned<RaidParticipant>>, StoreError> {
        Ok(self.participants.get(&(raid, user)).map(|v| v.clone()))
    }

    fn put_participant_if(
        &self,
        expected_version: u64,
        participant: RaidParticipant,
    ) -> Result<CasOutcome, StoreError> {
        let key = (participant.raid, participant.user);
        Ok(cas_put(&self.participants, key, expected_version, participant))
    }

    fn participants(&self, raid: RaidId) -> Result<Vec<RaidParticipant>, StoreError> {
        Ok(self
            .participants
            .iter()
            .filter(|entry| entry.key().0 == raid)
            .map(|entry| entry.value().row.clone())
            .collect())
    }
}

impl SeasonStore for MemoryStore {
    fn week(&self, index: u64) -> Result<Option<Versioned<Week>>, StoreError> {
        Ok(self.weeks.get(&index).map(|v| v.clone()))
    }

    fn active_week(&self) -> Result<Option<Versioned<Week>>, StoreError> {
        Ok(self
            .weeks
            .iter()
            .filter(|entry| entry.value().row.is_active)
            .min_by_key(|entry| entry.value().row.index)
            .map(|entry| entry.value().clone()))
    }

    fn upsert_week(&self, week: Week) -> Result<Versioned<Week>, StoreError> {
        match self.weeks.entry(week.index) {
            Entry::Occupied(occupied) => Ok(occupied.get().clone()),
            Entry::Vacant(vacant) => {
                let v = Versioned::new(week, 1);
                vacant.insert(v.clone());
                Ok(v)
            }
        }
    }

    fn put_week_if(&self, expected_version: u64, week: Week) -> Result<CasOutcome, StoreError> {
        Ok(cas_put(&self.weeks, week.index, expected_version, week))
    }

    fn season(&self, index: u64) -> Result<Option<Versioned<Season>>, StoreError> {
        Ok(self.seasons.get(&index).map(|v| v.clone()))
    }

    fn upsert_season(&self, season: Season) -> Result<Versioned<Season>, StoreError> {
        match self.seasons.entry(season.index) {
            Entry::Occupied(occupied) => Ok(occupied.get().clone()),
            Entry::Vacant(vacant) => {
                let v = Versioned::new(season, 1);
                vacant.insert(v.clone());
                Ok(v)
            }
        }
    }

    fn put_season_if(
        &self,
        expected_version: u64,
        season: Season,
    ) -> Result<CasOutcome, StoreError> {
        Ok(cas_put(&self.seasons, season.index, expected_version, season))
    }

    fn guild(&self, tribe: Tribe) -> Result<Versioned<Guild>, StoreError> {
        self.guilds
            .get(&tribe)
            .map(|v| v.clone())
            .ok_or_else(|| StoreError::Internal(format!("guild row missing for {tribe}")))
    }

    fn put_guild_if(&self, expected_version: u64, guild: Guild) -> Result<CasOutcome, StoreError> {
        Ok(cas_put(&self.guilds, guild.tribe, expected_version, guild))
    }
}

impl EventStore for MemoryStore {
    fn record_event(&self, event: ActivityEvent) -> Result<(), StoreError> {
        self.events.write().push(event);
        Ok(())
    }

    fn events_between(&self, start: u64, end: u64) -> Result<Vec<ActivityEvent>, StoreError> {
        Ok(self
            .events
            .read()
            .iter()
            .filter(|e| e.at >= start && e.at < end)
            .cloned()
            .collect())
    }
}
