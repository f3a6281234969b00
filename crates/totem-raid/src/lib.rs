//! # totem-raid — shared boss fights and matchmaking.
//!
//! The damage engine is the most contended path in the system: many users
//! attack one boss within milliseconds. Correctness rests on the store's
//! atomic decrement-if-and-clamp — the sum of recorded participant damage
//! can never exceed `boss_hp_max`, and exactly one attack is ever flagged
//! as the killing blow. Damage variance is an explicit, bounded,
//! deterministic roll — never an unbounded or unseeded random call.

pub mod engine;
pub mod matchmaking;

pub use engine::{JoinOutcome, RaidEngine, damage_roll};
pub use matchmaking::{Candidate, Opponent, find_opponents};
