//! Week scoring aggregator.
//!
//! Weeks are Monday-aligned UTC windows `[starts_at, ends_at)` addressed by
//! a monotone index, so "get-or-create the current week" is an idempotent
//! upsert keyed by that index. Each tribe's score is a weighted sum of four
//! independently counted sub-scores over the window's activity events.

use chrono::{DateTime, Datelike};

use totem_core::error::ScoreError;
use totem_core::tuning::ScoreTuning;
use totem_core::types::{ActionKind, ActivityEvent, ActivityKind, Tribe, TribeScore, Week};

/// 1970-01-05T00:00:00Z, the first Monday of the unix era. Week windows are
/// counted from here so they land on ISO week boundaries.
const EPOCH_MONDAY: u64 = 4 * 86_400;

const SECS_PER_WEEK: u64 = totem_core::constants::SECS_PER_WEEK;

/// The Monday-aligned week index containing `now`.
pub fn week_index(now: u64) -> u64 {
    now.saturating_sub(EPOCH_MONDAY) / SECS_PER_WEEK
}

/// `[starts_at, ends_at)` bounds of a week index.
pub fn week_window(index: u64) -> (u64, u64) {
    let starts_at = EPOCH_MONDAY + index * SECS_PER_WEEK;
    (starts_at, starts_at + SECS_PER_WEEK)
}

/// Human-readable ISO label ("2026-W32") for a week starting at `starts_at`.
pub fn week_label(starts_at: u64) -> String {
    match DateTime::from_timestamp(starts_at as i64, 0) {
        Some(dt) => {
            let iso = dt.date_naive().iso_week();
            format!("{}-W{:02}", iso.year(), iso.week())
        }
        None => format!("week@{starts_at}"),
    }
}

/// A fresh, active, unscored week row for an index.
pub fn blank_week(index: u64) -> Week {
    let (starts_at, ends_at) = week_window(index);
    Week {
        index,
        starts_at,
        ends_at,
        is_active: true,
        scores: [TribeScore::default(); 4],
        winner: None,
        computed_at: None,
    }
}

/// The tribe with the strictly highest total, or `None` on an exact tie.
pub fn resolve_winner(scores: &[TribeScore; 4]) -> Option<Tribe> {
    let best = scores.iter().map(|s| s.total).max()?;
    let mut leaders = Tribe::ALL
        .iter()
        .filter(|t| scores[t.discriminant() as usize].total == best);
    let winner = *leaders.next()?;
    match leaders.next() {
        Some(_) => None,
        None => Some(winner),
    }
}

/// The tribe with the most weekly wins across `weeks`, or `None` on a tie
/// (including the degenerate case of no decided weeks at all).
pub fn resolve_season_winner(weeks: &[Week]) -> Option<Tribe> {
    let mut wins = [0u64; 4];
    for week in weeks {
        if let Some(tribe) = week.winner {
            wins[tribe.discriminant() as usize] += 1;
        }
    }
    let best = *wins.iter().max()?;
    if best == 0 {
        return None;
    }
    let mut leaders = Tribe::ALL.iter().filter(|t| wins[t.discriminant() as usize] == best);
    let winner = *leaders.next()?;
    match leaders.next() {
        Some(_) => None,
        None => Some(winner),
    }
}

/// The weekly scoring engine.
#[derive(Debug, Clone, Default)]
pub struct ScoreEngine {
    tuning: ScoreTuning,
}

impl ScoreEngine {
    pub fn new(tuning: ScoreTuning) -> Self {
        Self { tuning }
    }

    /// Aggregate one score row per tribe over `[window_start, window_end)`.
    ///
    /// Sub-scores per tribe: activity (all care actions), social (socialize
    /// actions), consistency (care actions at streak ≥ the configured
    /// minimum), event (raid joins and attacks) — each count × fixed weight.
    /// Deterministic and idempotent over an unchanged event set.
    pub fn compute_week_scores(
        &self,
        events: &[ActivityEvent],
        window_start: u64,
        window_end: u64,
    ) -> Result<[TribeScore; 4], ScoreError> {
        if window_start >= window_end {
            return Err(ScoreError::InvalidWindow { start: window_start, end: window_end });
        }

        let t = &self.tuning;
        let mut counts = [[0u64; 4]; 4]; // [tribe][activity, social, consistency, event]

        for event in events {
            if event.at < window_start || event.at >= window_end {
                continue;
            }
            let row = &mut counts[event.tribe.discriminant() as usize];
            match event.kind {
                ActivityKind::Care(kind) => {
                    row[0] += 1;
                    if kind == ActionKind::Socialize {
                        row[1] += 1;
                    }
                    if event.care_streak >= t.consistency_min_streak {
                        row[2] += 1;
                    }
                }
                ActivityKind::RaidJoin | ActivityKind::RaidAttack => row[3] += 1,
                ActivityKind::StakeChange => {}
            }
        }

        let mut scores = [TribeScore::default(); 4];
        for tribe in Tribe::ALL {
            let idx = tribe.discriminant() as usize;
            let [activity_n, social_n, consistency_n, event_n] = counts[idx];
            let score = &mut scores[idx];
            score.activity = weighted(activity_n, t.weight_activity)?;
            score.social = weighted(social_n, t.weight_social)?;
            score.consistency = weighted(consistency_n, t.weight_consistency)?;
            score.event = weighted(event_n, t.weight_event)?;
            score.total = score
                .activity
                .checked_add(score.social)
                .and_then(|v| v.checked_add(score.consistency))
                .and_then(|v| v.checked_add(score.event))
                .ok_or(ScoreError::ArithmeticOverflow)?;
        }
        Ok(scores)
    }

    /// Whether a cached score row is due for recomputation.
    pub fn is_stale(&self, week: &Week, now: u64) -> bool {
        match week.computed_at {
            None => true,
            Some(at) => now.saturating_sub(at) > self.tuning.staleness_secs,
        }
    }

    /// Close a week: freeze scores, resolve the winner, deactivate.
    ///
    /// Fails [`ScoreError::WeekStillActive`] before `ends_at`. An exact tie
    /// at the top closes the week with no winner.
    pub fn close_week(
        &self,
        week: &Week,
        scores: [TribeScore; 4],
        now: u64,
    ) -> Result<Week, ScoreError> {
        if now < week.ends_at {
            return Err(ScoreError::WeekStillActive { index: week.index });
        }
        let mut closed = week.clone();
        closed.scores = scores;
        closed.winner = resolve_winner(&scores);
        closed.is_active = false;
        closed.computed_at = Some(now);
        Ok(closed)
    }

    /// Which season a week index belongs to.
    pub fn season_index(&self, week_index: u64) -> u64 {
        week_index / self.tuning.weeks_per_season.max(1)
    }
}

fn weighted(count: u64, weight: u64) -> Result<u64, ScoreError> {
    count.checked_mul(weight).ok_or(ScoreError::ArithmeticOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use totem_core::constants::{
        CONSISTENCY_MIN_STREAK, SCORE_STALENESS_SECS, WEIGHT_ACTIVITY, WEIGHT_CONSISTENCY,
        WEIGHT_EVENT, WEIGHT_SOCIAL,
    };
    use totem_core::types::UserId;

    fn engine() -> ScoreEngine {
        ScoreEngine::default()
    }

    fn care(tribe: Tribe, kind: ActionKind, streak: u32, at: u64) -> ActivityEvent {
        ActivityEvent { user: UserId(1), tribe, kind: ActivityKind::Care(kind), care_streak: streak, at }
    }

    fn raid_attack(tribe: Tribe, at: u64) -> ActivityEvent {
        ActivityEvent { user: UserId(1), tribe, kind: ActivityKind::RaidAttack, care_streak: 0, at }
    }

    // --- windows ---

    #[test]
    fn week_windows_are_monday_aligned_and_contiguous() {
        let (s0, e0) = week_window(0);
        assert_eq!(s0, EPOCH_MONDAY);
        let (s1, _) = week_window(1);
        assert_eq!(e0, s1);
        // 2024-01-01 was a Monday; its timestamp starts a week exactly.
        let jan1_2024 = 1_704_067_200;
        let idx = week_index(jan1_2024);
        assert_eq!(week_window(idx).0, jan1_2024);
    }

    #[test]
    fn week_index_constant_within_window() {
        let (start, end) = week_window(2_900);
        assert_eq!(week_index(start), 2_900);
        assert_eq!(week_index(end - 1), 2_900);
        assert_eq!(week_index(end), 2_901);
    }

    #[test]
    fn week_label_iso_format() {
        let jan1_2024 = 1_704_067_200;
        assert_eq!(week_label(jan1_2024), "2024-W01");
    }

    #[test]
    fn blank_week_is_active_unscored() {
        let week = blank_week(10);
        assert!(week.is_active);
        assert_eq!(week.winner, None);
        assert_eq!(week.computed_at, None);
        assert_eq!(week.scores, [TribeScore::default(); 4]);
    }

    // --- scoring ---

    #[test]
    fn sub_scores_count_their_own_categories() {
        let events = vec![
            care(Tribe::Fofo, ActionKind::Feed, 1, 10),
            care(Tribe::Fofo, ActionKind::Socialize, 1, 11),
            care(Tribe::Fofo, ActionKind::Play, CONSISTENCY_MIN_STREAK, 12),
            raid_attack(Tribe::Fofo, 13),
        ];
        let scores = engine().compute_week_scores(&events, 0, 100).unwrap();
        let fofo = &scores[Tribe::Fofo.discriminant() as usize];
        assert_eq!(fofo.activity, 3 * WEIGHT_ACTIVITY);
        assert_eq!(fofo.social, WEIGHT_SOCIAL);
        assert_eq!(fofo.consistency, WEIGHT_CONSISTENCY);
        assert_eq!(fofo.event, WEIGHT_EVENT);
        assert_eq!(fofo.total, fofo.activity + fofo.social + fofo.consistency + fofo.event);
        // Other tribes untouched.
        assert_eq!(scores[Tribe::Chad.discriminant() as usize], TribeScore::default());
    }

    #[test]
    fn events_outside_window_ignored() {
        let events = vec![
            care(Tribe::Caos, ActionKind::Feed, 1, 5),
            care(Tribe::Caos, ActionKind::Feed, 1, 100), // at == end: excluded
            care(Tribe::Caos, ActionKind::Feed, 1, 101),
        ];
        let scores = engine().compute_week_scores(&events, 0, 100).unwrap();
        assert_eq!(scores[Tribe::Caos.discriminant() as usize].activity, WEIGHT_ACTIVITY);
    }

    #[test]
    fn stake_changes_do_not_score() {
        let events = vec![ActivityEvent {
            user: UserId(1),
            tribe: Tribe::Degen,
            kind: ActivityKind::StakeChange,
            care_streak: 9,
            at: 10,
        }];
        let scores = engine().compute_week_scores(&events, 0, 100).unwrap();
        assert_eq!(scores[Tribe::Degen.discriminant() as usize], TribeScore::default());
    }

    #[test]
    fn recompute_is_idempotent() {
        let events: Vec<_> = (0..50)
            .map(|i| care(Tribe::ALL[i % 4], ActionKind::Feed, (i % 6) as u32, i as u64))
            .collect();
        let a = engine().compute_week_scores(&events, 0, 100).unwrap();
        let b = engine().compute_week_scores(&events, 0, 100).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_window_rejected() {
        let err = engine().compute_week_scores(&[], 100, 100).unwrap_err();
        assert!(matches!(err, ScoreError::InvalidWindow { .. }));
    }

    // --- winners ---

    #[test]
    fn strictly_highest_total_wins() {
        let mut scores = [TribeScore::default(); 4];
        scores[Tribe::Chad.discriminant() as usize].total = 100;
        scores[Tribe::Fofo.discriminant() as usize].total = 99;
        assert_eq!(resolve_winner(&scores), Some(Tribe::Chad));
    }

    #[test]
    fn exact_tie_has_no_winner() {
        let mut scores = [TribeScore::default(); 4];
        scores[Tribe::Chad.discriminant() as usize].total = 100;
        scores[Tribe::Caos.discriminant() as usize].total = 100;
        assert_eq!(resolve_winner(&scores), None);
    }

    #[test]
    fn all_zero_is_a_four_way_tie() {
        assert_eq!(resolve_winner(&[TribeScore::default(); 4]), None);
    }

    // --- close ---

    #[test]
    fn close_before_end_rejected() {
        let week = blank_week(5);
        let err = engine()
            .close_week(&week, [TribeScore::default(); 4], week.ends_at - 1)
            .unwrap_err();
        assert_eq!(err, ScoreError::WeekStillActive { index: 5 });
    }

    #[test]
    fn close_freezes_scores_and_winner() {
        let week = blank_week(5);
        let mut scores = [TribeScore::default(); 4];
        scores[Tribe::Degen.discriminant() as usize].total = 42;
        let closed = engine().close_week(&week, scores, week.ends_at).unwrap();
        assert!(!closed.is_active);
        assert_eq!(closed.winner, Some(Tribe::Degen));
        assert_eq!(closed.computed_at, Some(week.ends_at));
    }

    // --- staleness ---

    #[test]
    fn staleness_policy() {
        let mut week = blank_week(1);
        let e = engine();
        assert!(e.is_stale(&week, 0));
        week.computed_at = Some(1_000);
        assert!(!e.is_stale(&week, 1_000 + SCORE_STALENESS_SECS));
        assert!(e.is_stale(&week, 1_001 + SCORE_STALENESS_SECS));
    }

    // --- seasons ---

    fn decided_week(index: u64, winner: Option<Tribe>) -> Week {
        let mut week = blank_week(index);
        week.is_active = false;
        week.winner = winner;
        week
    }

    #[test]
    fn season_winner_is_most_weekly_wins() {
        let weeks = vec![
            decided_week(0, Some(Tribe::Chad)),
            decided_week(1, Some(Tribe::Chad)),
            decided_week(2, Some(Tribe::Fofo)),
            decided_week(3, None),
        ];
        assert_eq!(resolve_season_winner(&weeks), Some(Tribe::Chad));
    }

    #[test]
    fn season_tie_has_no_winner() {
        let weeks = vec![
            decided_week(0, Some(Tribe::Chad)),
            decided_week(1, Some(Tribe::Fofo)),
        ];
        assert_eq!(resolve_season_winner(&weeks), None);
    }

    #[test]
    fn season_with_no_decided_weeks_has_no_winner() {
        let weeks = vec![decided_week(0, None), decided_week(1, None)];
        assert_eq!(resolve_season_winner(&weeks), None);
    }

    #[test]
    fn season_index_groups_weeks() {
        let e = engine();
        assert_eq!(e.season_index(0), 0);
        assert_eq!(e.season_index(11), 0);
        assert_eq!(e.season_index(12), 1);
    }

    proptest! {
        #[test]
        fn totals_always_sum_of_parts(
            n_feed in 0u64..200,
            n_social in 0u64..200,
            n_raid in 0u64..200,
        ) {
            let mut events = Vec::new();
            for i in 0..n_feed {
                events.push(care(Tribe::Fofo, ActionKind::Feed, 1, i));
            }
            for i in 0..n_social {
                events.push(care(Tribe::Fofo, ActionKind::Socialize, CONSISTENCY_MIN_STREAK, i));
            }
            for i in 0..n_raid {
                events.push(raid_attack(Tribe::Fofo, i));
            }
            let scores = engine().compute_week_scores(&events, 0, 1_000).unwrap();
            let s = &scores[Tribe::Fofo.discriminant() as usize];
            prop_assert_eq!(s.total, s.activity + s.social + s.consistency + s.event);
        }
    }
}
