//! Evolution resolver.
//!
//! Stage advancement is a deterministic threshold check over
//! `(total_actions, care_streak)`; cosmetic form selection is a pure
//! function of `(tribe, stage, egg_seed)`, so the same pet always evolves
//! into the same cosmetic line. Transitions are one-directional and at most
//! one stage advances per call; a pet at the terminal stage is a no-op.

use totem_core::constants::FORMS_PER_STAGE;
use totem_core::types::{Pet, Stage, Tribe};

/// A stage transition that fired during an action post-check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Evolution {
    pub from: Stage,
    pub to: Stage,
    pub form_id: u8,
}

/// Deterministic cosmetic form for a `(tribe, stage, egg_seed)` triple.
///
/// BLAKE3 over the fixed-width canonical encoding, reduced modulo
/// [`FORMS_PER_STAGE`]. Never a runtime random call.
pub fn form_roll(tribe: Tribe, stage: Stage, egg_seed: u64) -> u8 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[tribe.discriminant(), stage.discriminant()]);
    hasher.update(&egg_seed.to_le_bytes());
    let digest = hasher.finalize();
    digest.as_bytes()[0] % FORMS_PER_STAGE
}

/// Advance `pet` by at most one stage if its care metrics meet the next
/// stage's entry requirements. Returns the transition that fired, if any.
pub fn try_advance(pet: &mut Pet) -> Option<Evolution> {
    let next = pet.stage.next()?;
    let (min_actions, min_streak) = next.entry_requirements()?;

    if pet.total_actions < min_actions || pet.care_streak < min_streak {
        return None;
    }

    let from = pet.stage;
    let form_id = form_roll(pet.tribe, next, pet.egg_seed);
    pet.stage = next;
    pet.form_id = form_id;
    Some(Evolution { from, to: next, form_id })
}
