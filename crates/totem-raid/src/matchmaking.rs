//! Matchmaking selector.
//!
//! Pure ranking over a prepared candidate snapshot: the composition layer
//! gathers `(pet, power, neglect)` triples from the stores, this module
//! filters to the challenger's power band and orders by closeness. An empty
//! result is a valid answer, not an error.

use totem_core::constants::BPS_PRECISION;
use totem_core::types::{PetId, UserId};

/// One pet offered to the selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub pet: PetId,
    pub user: UserId,
    pub power: u64,
    pub is_neglected: bool,
}

/// A selected opponent, closest power first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Opponent {
    pub pet: PetId,
    pub user: UserId,
    pub power: u64,
    /// `|power - challenger_power|`.
    pub power_delta: u64,
}

/// Select up to `limit` opponents for a challenger.
///
/// Excludes the challenger's own pet, neglected pets, and anything outside
/// `±band_bps` of `challenger_power`. Results sort by ascending power delta
/// with the pet id as a stable tiebreak.
pub fn find_opponents(
    challenger_pet: PetId,
    challenger_power: u64,
    candidates: &[Candidate],
    band_bps: u64,
    limit: usize,
) -> Vec<Opponent> {
    let halfwidth = (challenger_power as u128) * (band_bps as u128) / BPS_PRECISION as u128;
    let lo = (challenger_power as u128).saturating_sub(halfwidth);
    let hi = challenger_power as u128 + halfwidth;

    let mut selected: Vec<Opponent> = candidates
        .iter()
        .filter(|c| c.pet != challenger_pet && !c.is_neglected)
        .filter(|c| {
            let p = c.power as u128;
            p >= lo && p <= hi
        })
        .map(|c| Opponent {
            pet: c.pet,
            user: c.user,
            power: c.power,
            power_delta: c.power.abs_diff(challenger_power),
        })
        .collect();

    selected.sort_by(|a, b| a.power_delta.cmp(&b.power_delta).then(a.pet.cmp(&b.pet)));
    selected.truncate(limit);
    selected
}
