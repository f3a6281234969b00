//! Shared test helpers: a den on a frozen clock plus row factories.

use std::sync::Arc;

use totem_core::traits::{FrozenClock, RaidStore};
use totem_core::tuning::Tuning;
use totem_core::types::{BossRaid, Pet, PetId, RaidId, RaidStatus, Tribe, UserId};
use totem_den::{Den, MemoryStore};

/// A test timestamp far from the epoch so previous-week lookups exist.
pub const T0: u64 = 1_750_000_000;

/// Den + frozen clock + store handle, all sharing state.
pub struct Harness {
    pub den: Den,
    pub clock: Arc<FrozenClock>,
    pub store: Arc<MemoryStore>,
}

/// Build a den over a fresh store with the default tuning, frozen at `now`.
pub fn harness_at(now: u64) -> Harness {
    init_tracing();
    let clock = Arc::new(FrozenClock::at(now));
    let store = Arc::new(MemoryStore::new());
    let den = Den::new(store.clone(), clock.clone(), Tuning::default());
    Harness { den, clock, store }
}

/// Route engine logs through the test harness when `RUST_LOG` asks for them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

impl Harness {
    /// Hatch a pet for user `id` with a deterministic seed.
    pub fn hatch(&self, id: u64, tribe: Tribe) -> Pet {
        self.den
            .create_pet(PetId(id), UserId(id), tribe, id.wrapping_mul(0x9e37_79b9))
            .unwrap()
    }

    /// Install an already-active raid with a custom HP pool.
    pub fn spawn_raid(&self, id: u64, hp: u64, now: u64) -> RaidId {
        let mut raid = BossRaid::new(RaidId(id), "Gorgomoth", hp, now, now + 86_400);
        raid.status = RaidStatus::Active;
        self.store.upsert_raid(raid).unwrap();
        RaidId(id)
    }
}
