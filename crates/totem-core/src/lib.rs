//! # totem-core — types and traits for the Totem creature economy.
//!
//! Defines the shared vocabulary of the engine:
//! - Domain rows ([`types`]): pets, stakes, raids, guilds, weeks.
//! - Fixed enumerations with total mapping functions (tribes, stages,
//!   action kinds, raid status).
//! - Protocol constants ([`constants`]): stat scale, decay rates,
//!   cooldowns, monetary precision.
//! - Error taxonomy ([`error`]) with a total [`error::ErrorClass`] mapping.
//! - Trait seams ([`traits`]): clock, vitals calculator, and the store
//!   contracts every persistence backend implements.
//! - Engine tuning ([`tuning`]): serde-loadable overrides for every knob.
//!
//! All monetary values are raw integers in smallest token units
//! (1 TOTEM = 10^9 units); all stats are integers in milli-points.
//! Nothing in this workspace does floating-point currency arithmetic.

pub mod constants;
pub mod error;
pub mod traits;
pub mod tuning;
pub mod types;
