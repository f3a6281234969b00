//! # totem-care — care actions and evolution.
//!
//! The action state machine validates one care action against a pet's
//! per-kind cooldowns, replays decay up to `now` so deltas apply to fresh
//! state, maintains streaks and reputation, clears neglect when earned,
//! and runs the evolution resolver as a post-check. Pure: the caller
//! persists the returned successor row.

pub mod actions;
pub mod evolution;

pub use actions::{ActionOutcome, CareEngine};
pub use evolution::{Evolution, form_roll};
