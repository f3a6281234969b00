//! # totem-vitals — time-based stat decay and neglect detection.
//!
//! All calculations use integer arithmetic only for determinism.
//!
//! - **Linear decay**: each stat loses a fixed number of milli-points per
//!   day of elapsed time, computed in u128 intermediates and clamped at 0.
//! - **Identity**: evaluating a pet at its own `last_updated_at` returns
//!   the stored stats unchanged.
//! - **Analytic neglect**: because the trajectory is linear, the instant a
//!   stat crossed the neglect threshold is reconstructed from the stored
//!   snapshot, so the grace-period check needs no extra bookkeeping writes.

pub mod engine;

pub use engine::StatDecay;
