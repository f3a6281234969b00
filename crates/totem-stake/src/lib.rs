//! # totem-stake — staking power and reward accrual.
//!
//! All monetary math is integer-only in raw smallest-unit amounts with u128
//! intermediates; floating-point currency arithmetic is forbidden in this
//! crate. Power is a pure function of `(amount_staked, stage, tribe)` with a
//! single floor division applied once at the end — never per factor — so
//! rounding error cannot compound.

pub mod engine;
pub mod power;
pub mod rewards;

pub use engine::{ClaimOutcome, StakeEngine, StakeOutcome};
pub use power::compute_power;
pub use rewards::{ClaimBreakdown, accrued_reward, neglect_penalty_bps};
