//! # totem-season — weekly tribe scoring and season resolution.
//!
//! Scores are a pure, idempotent aggregation over the activity event log:
//! recomputing an unchanged window always yields identical rows, which is
//! what makes the cached-with-staleness read path safe. Winner resolution
//! is strict — an exact tie deliberately leaves no winner.

pub mod scoring;

pub use scoring::{
    ScoreEngine, blank_week, resolve_season_winner, resolve_winner, week_index, week_label,
    week_window,
};
