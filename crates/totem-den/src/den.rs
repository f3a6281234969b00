//! The operation surface request handlers call.
//!
//! [`Den`] wires the injected clock, the store, and the pure engines
//! together. Every mutating operation follows the same shape: read
//! versioned snapshots, run the pure engine, commit with a conditional
//! write. A lost version race is retried once against fresh state, then
//! surfaced as `ConflictRace` — safe to retry, since a failed attempt
//! commits nothing.
//!
//! Callers are assumed to be authenticated and rate-limited upstream; the
//! den enforces business preconditions only.

use std::sync::Arc;

use tracing::{debug, info};

use totem_care::{ActionOutcome, CareEngine};
use totem_core::constants::{BOSS_BASE_HP, RAID_PERIOD_SECS};
use totem_core::error::{StakeError, StoreError, TotemError};
use totem_core::traits::{
    Clock, EventStore, PetStore, RaidStore, SeasonStore, StakeStore, VitalsCalculator,
};
use totem_core::tuning::Tuning;
use totem_core::types::{
    ActionKind, ActivityEvent, ActivityKind, AttackOutcome, BossRaid, CasOutcome, Guild, Pet,
    PetId, RaidId, Season, Stake, StakeHistoryEntry, Tribe, UserId, VitalsSnapshot, Week,
};
use totem_raid::{Candidate, Opponent, RaidEngine};
use totem_season::{ScoreEngine, blank_week, resolve_season_winner, week_index, week_label};
use totem_stake::{ClaimOutcome, StakeEngine};
use totem_vitals::StatDecay;

use crate::storage::MemoryStore;

/// Boss roster, cycled by raid period.
const BOSS_NAMES: &[&str] = &["Gorgomoth", "Null Whale", "The Rugpuller", "Gas Gremlin"];

/// Engine composition root.
pub struct Den {
    store: Arc<MemoryStore>,
    clock: Arc<dyn Clock>,
    vitals: Arc<dyn VitalsCalculator>,
    care: CareEngine,
    stake: StakeEngine,
    raid: RaidEngine,
    score: ScoreEngine,
    tuning: Tuning,
}

impl Den {
    pub fn new(store: Arc<MemoryStore>, clock: Arc<dyn Clock>, tuning: Tuning) -> Self {
        Self {
            vitals: Arc::new(StatDecay::new(tuning.decay.clone())),
            care: CareEngine::from_tuning(&tuning),
            stake: StakeEngine::new(tuning.stake.clone()),
            raid: RaidEngine::new(tuning.raid.clone()),
            score: ScoreEngine::new(tuning.score.clone()),
            store,
            clock,
            tuning,
        }
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    // ------------------------------------------------------------------
    // Pets
    // ------------------------------------------------------------------

    /// Hatch a new pet. Identity and the egg seed come from the caller;
    /// owner uniqueness is the registration flow's concern upstream.
    pub fn create_pet(
        &self,
        id: PetId,
        owner: UserId,
        tribe: Tribe,
        egg_seed: u64,
    ) -> Result<Pet, TotemError> {
        let now = self.clock.now_unix();
        let pet = Pet::new(id, owner, tribe, egg_seed, now);
        let stored = self.store.insert_pet(pet)?;
        info!(pet = %id, %owner, %tribe, "pet hatched");
        Ok(stored.row)
    }

    /// A pet's stored row plus its derived stats at the current instant.
    pub fn pet(&self, id: PetId) -> Result<(Pet, VitalsSnapshot), TotemError> {
        let vpet = self.store.pet(id)?.ok_or(StoreError::PetNotFound(id))?;
        let now = self.clock.now_unix();
        let snap = self.vitals.decayed_stats(&vpet.row, now)?;
        Ok((vpet.row, snap))
    }

    /// Perform one care action. Serializes per pet via the row version:
    /// overlapping calls on the same pet cannot both commit against the
    /// same snapshot, so cooldown checks never race.
    pub fn perform_action(
        &self,
        pet_id: PetId,
        kind: ActionKind,
    ) -> Result<ActionOutcome, TotemError> {
        let mut retried = false;
        loop {
            let vpet = self.store.pet(pet_id)?.ok_or(StoreError::PetNotFound(pet_id))?;
            let now = self.clock.now_unix();
            let out = self.care.perform_action(&vpet.row, self.vitals.as_ref(), kind, now)?;
            match self.store.put_pet_if(vpet.version, out.pet.clone())? {
                CasOutcome::Committed { .. } => {
                    self.store.record_event(out.event.clone())?;
                    if let Some(evo) = &out.evolution {
                        info!(pet = %pet_id, from = ?evo.from, to = ?evo.to, form = evo.form_id, "pet evolved");
                    }
                    debug!(pet = %pet_id, %kind, streak = out.pet.care_streak, "action applied");
                    return Ok(out);
                }
                CasOutcome::Conflict if !retried => retried = true,
                CasOutcome::Conflict => return Err(StoreError::ConflictRace.into()),
            }
        }
    }

    // ------------------------------------------------------------------
    // Staking
    // ------------------------------------------------------------------

    /// Stake tokens against a pet. `tx_ref` references the already-settled
    /// chain transaction; reconciliation happens out of tree.
    pub fn stake_tokens(
        &self,
        user: UserId,
        pet_id: PetId,
        amount: u64,
        tx_ref: &str,
    ) -> Result<Stake, TotemError> {
        let mut retried = false;
        loop {
            let vpet = self.store.pet(pet_id)?.ok_or(StoreError::PetNotFound(pet_id))?;
            let existing = self.store.stake(pet_id)?;
            let now = self.clock.now_unix();
            let out = self.stake.stake(
                existing.as_ref().map(|v| &v.row),
                &vpet.row,
                user,
                amount,
                tx_ref,
                now,
            )?;
            let expected = existing.as_ref().map_or(0, |v| v.version);
            match self.store.put_stake_if(expected, out.stake.clone())? {
                CasOutcome::Committed { .. } => {
                    self.store.push_history(pet_id, out.entry)?;
                    self.store.record_event(out.event)?;
                    info!(%user, pet = %pet_id, amount, power = out.stake.power, "stake added");
                    return Ok(out.stake);
                }
                CasOutcome::Conflict if !retried => retried = true,
                CasOutcome::Conflict => return Err(StoreError::ConflictRace.into()),
            }
        }
    }

    /// Withdraw part or all of a stake.
    pub fn unstake_tokens(
        &self,
        user: UserId,
        pet_id: PetId,
        amount: u64,
        tx_ref: &str,
    ) -> Result<Stake, TotemError> {
        let mut retried = false;
        loop {
            let vpet = self.store.pet(pet_id)?.ok_or(StoreError::PetNotFound(pet_id))?;
            let vstake = self
                .store
                .stake(pet_id)?
                .filter(|v| v.row.user == user)
                .ok_or(StakeError::NothingStaked)?;
            let now = self.clock.now_unix();
            let out = self.stake.unstake(&vstake.row, &vpet.row, amount, tx_ref, now)?;
            match self.store.put_stake_if(vstake.version, out.stake.clone())? {
                CasOutcome::Committed { .. } => {
                    self.store.push_history(pet_id, out.entry)?;
                    self.store.record_event(out.event)?;
                    info!(%user, pet = %pet_id, amount, "stake withdrawn");
                    return Ok(out.stake);
                }
                CasOutcome::Conflict if !retried => retried = true,
                CasOutcome::Conflict => return Err(StoreError::ConflictRace.into()),
            }
        }
    }

    /// Claim accrued rewards. The accrual window end is the committed row's
    /// `last_claim_at`; because the commit is version-conditional, a
    /// duplicated claim retried after a timeout cannot pay twice.
    pub fn claim_rewards(
        &self,
        user: UserId,
        pet_id: PetId,
        tx_ref: &str,
    ) -> Result<ClaimOutcome, TotemError> {
        let mut retried = false;
        loop {
            let vpet = self.store.pet(pet_id)?.ok_or(StoreError::PetNotFound(pet_id))?;
            let vstake = self
                .store
                .stake(pet_id)?
                .filter(|v| v.row.user == user)
                .ok_or(StakeError::NothingStaked)?;
            let now = self.clock.now_unix();
            let snap = self.vitals.decayed_stats(&vpet.row, now).map_err(StakeError::from)?;
            let is_winning_tribe = self.previous_week_winner(now)? == Some(vpet.row.tribe);
            let out =
                self.stake.claim(&vstake.row, &vpet.row, &snap, is_winning_tribe, tx_ref, now)?;
            match self.store.put_stake_if(vstake.version, out.stake.clone())? {
                CasOutcome::Committed { .. } => {
                    self.credit_treasury(vpet.row.tribe, out.breakdown.treasury_cut)?;
                    self.store.push_history(pet_id, out.entry.clone())?;
                    self.store.record_event(out.event.clone())?;
                    info!(
                        %user,
                        pet = %pet_id,
                        payout = out.breakdown.payout,
                        penalty_bps = out.breakdown.penalty_bps,
                        winning = is_winning_tribe,
                        "rewards claimed"
                    );
                    return Ok(out);
                }
                CasOutcome::Conflict if !retried => retried = true,
                CasOutcome::Conflict => return Err(StoreError::ConflictRace.into()),
            }
        }
    }

    /// Staking history feed for a pet.
    pub fn stake_history(&self, pet_id: PetId) -> Result<Vec<StakeHistoryEntry>, TotemError> {
        Ok(self.store.history(pet_id)?)
    }

    /// Treasury credit is a pure increment, retried until it lands.
    fn credit_treasury(&self, tribe: Tribe, amount: u64) -> Result<(), TotemError> {
        if amount == 0 {
            return Ok(());
        }
        loop {
            let vguild = self.store.guild(tribe)?;
            let mut guild = vguild.row.clone();
            guild.treasury = guild.treasury.saturating_add(amount);
            if self.store.put_guild_if(vguild.version, guild)?.is_committed() {
                return Ok(());
            }
        }
    }

    // ------------------------------------------------------------------
    // Raids
    // ------------------------------------------------------------------

    /// The current raid, spawned and activated on demand. Get-or-create is
    /// an idempotent upsert keyed by the raid period index.
    pub fn current_raid(&self) -> Result<BossRaid, TotemError> {
        let now = self.clock.now_unix();
        let vraid = match self.store.raid_in_window(now) {
            Some(v) => v,
            None => {
                let period = now / RAID_PERIOD_SECS;
                let starts_at = period * RAID_PERIOD_SECS;
                let name = BOSS_NAMES[(period % BOSS_NAMES.len() as u64) as usize];
                let raid = BossRaid::new(
                    RaidId(period),
                    name,
                    BOSS_BASE_HP,
                    starts_at,
                    starts_at + RAID_PERIOD_SECS,
                );
                let v = self.store.upsert_raid(raid)?;
                if v.version == 1 {
                    info!(raid = %v.row.id, boss = %v.row.boss_name, hp = v.row.boss_hp_max, "raid spawned");
                }
                v
            }
        };

        // Pending → Active once the window opens.
        if let Some(next) = RaidEngine::lifecycle_transition(&vraid.row, now) {
            return match self.store.put_raid_if(vraid.version, next.clone())? {
                CasOutcome::Committed { .. } => Ok(next),
                // Another caller transitioned first; their row is current.
                CasOutcome::Conflict => {
                    let v = self
                        .store
                        .raid(vraid.row.id)?
                        .ok_or(StoreError::RaidNotFound(vraid.row.id))?;
                    Ok(v.row)
                }
            };
        }
        Ok(vraid.row)
    }

    /// Join the current raid with the user's pet. Neglected pets are gated.
    pub fn join_raid(&self, user: UserId, raid_id: RaidId) -> Result<bool, TotemError> {
        let vpet = self
            .store
            .pet_by_owner(user)?
            .ok_or(StoreError::NoPetForUser(user))?;
        let now = self.clock.now_unix();
        let neglected = self.vitals.is_neglected(&vpet.row, now)?;
        let out = self.raid.join(self.store.as_ref(), raid_id, &vpet.row, neglected, now)?;
        if let Some(event) = out.event {
            self.store.record_event(event)?;
            debug!(%user, raid = %raid_id, "joined raid");
        }
        Ok(out.newly_joined)
    }

    /// Attack the boss with the power of the user's staked pet.
    pub fn attack_boss(&self, user: UserId, raid_id: RaidId) -> Result<AttackOutcome, TotemError> {
        let vpet = self
            .store
            .pet_by_owner(user)?
            .ok_or(StoreError::NoPetForUser(user))?;
        let power = self.store.stake(vpet.row.id)?.map_or(0, |v| v.row.power);
        let now = self.clock.now_unix();
        let out = self.raid.attack(self.store.as_ref(), raid_id, user, power, now)?;
        if out.damage > 0 {
            self.store.record_event(ActivityEvent {
                user,
                tribe: vpet.row.tribe,
                kind: ActivityKind::RaidAttack,
                care_streak: vpet.row.care_streak,
                at: now,
            })?;
        }
        if out.is_killing_blow {
            info!(%user, raid = %raid_id, damage = out.damage, "killing blow");
        }
        Ok(out)
    }

    // ------------------------------------------------------------------
    // Matchmaking
    // ------------------------------------------------------------------

    /// Up to `limit` opponents within the power band of the user's pet,
    /// closest first. An empty list is a valid answer.
    pub fn find_opponents(
        &self,
        user: UserId,
        pet_id: PetId,
        limit: Option<usize>,
    ) -> Result<Vec<Opponent>, TotemError> {
        let vpet = self.store.pet(pet_id)?.ok_or(StoreError::PetNotFound(pet_id))?;
        if vpet.row.owner != user {
            return Err(StoreError::PetNotFound(pet_id).into());
        }
        let now = self.clock.now_unix();
        if self.vitals.is_neglected(&vpet.row, now)? {
            return Err(totem_core::error::MatchError::NeglectedChallenger.into());
        }
        let challenger_power = self.store.stake(pet_id)?.map_or(0, |v| v.row.power);

        let mut candidates = Vec::new();
        for other in self.store.iter_pets()? {
            let power = self.store.stake(other.row.id)?.map_or(0, |v| v.row.power);
            let is_neglected = self.vitals.is_neglected(&other.row, now)?;
            candidates.push(Candidate {
                pet: other.row.id,
                user: other.row.owner,
                power,
                is_neglected,
            });
        }

        Ok(totem_raid::find_opponents(
            pet_id,
            challenger_power,
            &candidates,
            self.tuning.raid.power_band_bps,
            limit.unwrap_or(self.tuning.raid.default_opponent_limit),
        ))
    }

    // ------------------------------------------------------------------
    // Weeks, seasons, guilds
    // ------------------------------------------------------------------

    /// The current week with fresh-enough scores. Rolls any finished week
    /// closed first, then recomputes cached scores past the staleness
    /// threshold.
    pub fn week_scores(&self) -> Result<Week, TotemError> {
        let now = self.clock.now_unix();
        self.roll_finished_weeks(now)?;

        let index = week_index(now);
        let vweek = self.store.upsert_week(blank_week(index))?;
        if !self.score.is_stale(&vweek.row, now) {
            return Ok(vweek.row);
        }

        let scores =
            self.score
                .compute_week_scores(
                    &self.store.events_between(vweek.row.starts_at, vweek.row.ends_at)?,
                    vweek.row.starts_at,
                    vweek.row.ends_at,
                )?;
        let mut refreshed = vweek.row.clone();
        refreshed.scores = scores;
        refreshed.computed_at = Some(now);
        match self.store.put_week_if(vweek.version, refreshed.clone())? {
            CasOutcome::Committed { .. } => Ok(refreshed),
            // Another reader refreshed concurrently; scores are idempotent,
            // so their row is as good as ours.
            CasOutcome::Conflict => Ok(self
                .store
                .week(index)?
                .ok_or(StoreError::WeekNotFound(index))?
                .row),
        }
    }

    /// Close a week: freeze final scores, resolve the winner, attach it to
    /// its season. Idempotent once closed.
    pub fn close_week(&self, index: u64) -> Result<Week, TotemError> {
        let mut retried = false;
        loop {
            let vweek = self.store.week(index)?.ok_or(StoreError::WeekNotFound(index))?;
            if !vweek.row.is_active {
                return Ok(vweek.row);
            }
            let now = self.clock.now_unix();
            let scores = self.score.compute_week_scores(
                &self.store.events_between(vweek.row.starts_at, vweek.row.ends_at)?,
                vweek.row.starts_at,
                vweek.row.ends_at,
            )?;
            let closed = self.score.close_week(&vweek.row, scores, now)?;
            match self.store.put_week_if(vweek.version, closed.clone())? {
                CasOutcome::Committed { .. } => {
                    self.attach_week_to_season(index)?;
                    info!(
                        week = %week_label(closed.starts_at),
                        winner = closed.winner.map(|t| t.name()).unwrap_or("none"),
                        "week closed"
                    );
                    return Ok(closed);
                }
                CasOutcome::Conflict if !retried => retried = true,
                CasOutcome::Conflict => return Err(StoreError::ConflictRace.into()),
            }
        }
    }

    /// Resolve a season's winner from its closed weeks' win counts.
    pub fn close_season(&self, index: u64) -> Result<Season, TotemError> {
        let weeks_per_season = self.tuning.score.weeks_per_season.max(1);
        let first = index * weeks_per_season;

        let mut weeks = Vec::new();
        for week_index in first..first + weeks_per_season {
            if let Some(vweek) = self.store.week(week_index)? {
                if vweek.row.is_active {
                    return Err(totem_core::error::ScoreError::WeekStillActive {
                        index: week_index,
                    }
                    .into());
                }
                weeks.push(vweek.row);
            }
        }

        let winner = resolve_season_winner(&weeks);
        let mut retried = false;
        loop {
            let vseason = self.store.upsert_season(Season {
                index,
                weeks: Vec::new(),
                winner: None,
            })?;
            let mut season = vseason.row.clone();
            season.weeks = weeks.iter().map(|w| w.index).collect();
            season.winner = winner;
            match self.store.put_season_if(vseason.version, season.clone())? {
                CasOutcome::Committed { .. } => {
                    info!(
                        season = index,
                        winner = winner.map(|t| t.name()).unwrap_or("none"),
                        "season closed"
                    );
                    return Ok(season);
                }
                CasOutcome::Conflict if !retried => retried = true,
                CasOutcome::Conflict => return Err(StoreError::ConflictRace.into()),
            }
        }
    }

    /// Guild aggregate with membership and power recomputed on demand.
    pub fn guild(&self, tribe: Tribe) -> Result<Guild, TotemError> {
        let mut total_power = 0u64;
        let mut member_count = 0u32;
        for vstake in self.store.iter_stakes()? {
            if vstake.row.amount_staked == 0 {
                continue;
            }
            let Some(vpet) = self.store.pet(vstake.row.pet)? else { continue };
            if vpet.row.tribe == tribe {
                total_power = total_power.saturating_add(vstake.row.power);
                member_count += 1;
            }
        }

        loop {
            let vguild = self.store.guild(tribe)?;
            let mut guild = vguild.row.clone();
            guild.total_power = total_power;
            guild.member_count = member_count;
            if guild == vguild.row {
                return Ok(guild);
            }
            if self.store.put_guild_if(vguild.version, guild.clone())?.is_committed() {
                return Ok(guild);
            }
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Record a closed week in its season row. Append-if-missing, so
    /// re-closing a week never duplicates it.
    fn attach_week_to_season(&self, week: u64) -> Result<(), TotemError> {
        let season_index = self.score.season_index(week);
        loop {
            let vseason = self.store.upsert_season(Season {
                index: season_index,
                weeks: Vec::new(),
                winner: None,
            })?;
            if vseason.row.weeks.contains(&week) {
                return Ok(());
            }
            let mut season = vseason.row.clone();
            season.weeks.push(week);
            season.weeks.sort_unstable();
            if self.store.put_season_if(vseason.version, season)?.is_committed() {
                return Ok(());
            }
        }
    }

    /// Last week's winner, for the claim bonus.
    fn previous_week_winner(&self, now: u64) -> Result<Option<Tribe>, TotemError> {
        let current = week_index(now);
        if current == 0 {
            return Ok(None);
        }
        Ok(self.store.week(current - 1)?.and_then(|v| v.row.winner))
    }

    /// Close every active week whose window has ended. Keeps the "at most
    /// one active week" invariant without a background scheduler.
    fn roll_finished_weeks(&self, now: u64) -> Result<(), TotemError> {
        while let Some(vweek) = self.store.active_week()? {
            if vweek.row.ends_at > now {
                break;
            }
            self.close_week(vweek.row.index)?;
        }
        Ok(())
    }
}
