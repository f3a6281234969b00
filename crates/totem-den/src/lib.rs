//! # totem-den — engine composition and storage.
//!
//! The [`Den`](den::Den) wires an injected clock, the in-memory store, and
//! the pure engines into the operation surface an external request layer
//! calls. Every mutating op is a read → pure-compute → conditional-commit
//! cycle: on a lost version race it re-reads and retries once, then
//! surfaces [`StoreError::ConflictRace`](totem_core::error::StoreError) —
//! which is always safe for the caller to retry, because nothing is
//! committed on a failed attempt.
//!
//! [`storage::MemoryStore`] keeps every row in DashMap shards keyed per
//! entity, so operations on different pets never contend; the boss HP
//! decrement runs under the raid row's own entry lock.

pub mod config;
pub mod den;
pub mod storage;

pub use config::{DenConfig, load_tuning};
pub use den::Den;
pub use storage::MemoryStore;
