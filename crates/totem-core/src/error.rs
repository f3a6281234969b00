//! Error types for the Totem engine.
//!
//! Expected business-rule failures are typed `Err` values, never panics.
//! Every domain error maps totally onto [`ErrorClass`], the boundary
//! taxonomy request handlers translate into transport-level responses.

use thiserror::Error;

use crate::types::{ActionKind, PetId, RaidId, RaidStatus, UserId};

/// Boundary classification of every engine error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad input shape or range — the caller's fault, not retryable as-is.
    Validation,
    /// A referenced entity does not exist.
    NotFound,
    /// A business precondition failed (cooldown, insufficient stake, gate).
    Precondition,
    /// Lost a concurrent conditional update — safe to retry once.
    Conflict,
    /// Unexpected internal fault; logged, never exposes internals.
    Internal,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VitalsError {
    #[error("arithmetic overflow")] ArithmeticOverflow,
}

impl VitalsError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::ArithmeticOverflow => ErrorClass::Internal,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CareError {
    #[error("{kind} on cooldown until {ends_at}")]
    ActionOnCooldown { kind: ActionKind, ends_at: u64 },
    #[error(transparent)]
    Vitals(#[from] VitalsError),
}

impl CareError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::ActionOnCooldown { .. } => ErrorClass::Precondition,
            Self::Vitals(e) => e.class(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StakeError {
    #[error("amount {amount} outside bounds [{min}, {max}]")]
    AmountOutOfBounds { amount: u64, min: u64, max: u64 },
    #[error("stake cap exceeded: have {have}, adding {adding}, cap {cap}")]
    StakeCapExceeded { have: u64, adding: u64, cap: u64 },
    #[error("insufficient stake: have {have}, need {need}")]
    InsufficientStake { have: u64, need: u64 },
    #[error("no active stake for this pet")]
    NothingStaked,
    #[error("arithmetic overflow")]
    ArithmeticOverflow,
    #[error(transparent)]
    Vitals(#[from] VitalsError),
}

impl StakeError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::AmountOutOfBounds { .. } => ErrorClass::Validation,
            Self::StakeCapExceeded { .. } | Self::InsufficientStake { .. } => {
                ErrorClass::Precondition
            }
            Self::NothingStaked => ErrorClass::NotFound,
            Self::ArithmeticOverflow => ErrorClass::Internal,
            Self::Vitals(e) => e.class(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RaidError {
    #[error("raid is not active (status {status:?})")]
    RaidNotActive { status: RaidStatus },
    #[error("{user} has not joined {raid}")]
    NotJoined { raid: RaidId, user: UserId },
    #[error("attack on cooldown until {ends_at}")]
    AttackOnCooldown { ends_at: u64 },
    #[error("neglected pets cannot join raids")]
    NeglectedPet,
    #[error("arithmetic overflow")]
    ArithmeticOverflow,
    #[error(transparent)]
    Vitals(#[from] VitalsError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RaidError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::RaidNotActive { .. }
            | Self::NotJoined { .. }
            | Self::AttackOnCooldown { .. }
            | Self::NeglectedPet => ErrorClass::Precondition,
            Self::ArithmeticOverflow => ErrorClass::Internal,
            Self::Vitals(e) => e.class(),
            Self::Store(e) => e.class(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("neglected pets cannot battle")]
    NeglectedChallenger,
    #[error(transparent)]
    Vitals(#[from] VitalsError),
}

impl MatchError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NeglectedChallenger => ErrorClass::Precondition,
            Self::Vitals(e) => e.class(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoreError {
    #[error("no active week")]
    NoActiveWeek,
    #[error("week {index} is still active")]
    WeekStillActive { index: u64 },
    #[error("invalid window: start {start} >= end {end}")]
    InvalidWindow { start: u64, end: u64 },
    #[error("arithmetic overflow")]
    ArithmeticOverflow,
}

impl ScoreError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NoActiveWeek => ErrorClass::NotFound,
            Self::WeekStillActive { .. } => ErrorClass::Precondition,
            Self::InvalidWindow { .. } => ErrorClass::Validation,
            Self::ArithmeticOverflow => ErrorClass::Internal,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("pet not found: {0}")]
    PetNotFound(PetId),
    #[error("no pet registered for {0}")]
    NoPetForUser(UserId),
    #[error("raid not found: {0}")]
    RaidNotFound(RaidId),
    #[error("week not found: {0}")]
    WeekNotFound(u64),
    #[error("lost a concurrent conditional update")]
    ConflictRace,
    #[error("store fault: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::PetNotFound(_)
            | Self::NoPetForUser(_)
            | Self::RaidNotFound(_)
            | Self::WeekNotFound(_) => ErrorClass::NotFound,
            Self::ConflictRace => ErrorClass::Conflict,
            Self::Internal(_) => ErrorClass::Internal,
        }
    }
}

/// Top-level error aggregating every domain, for callers that funnel all
/// engine operations through one surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TotemError {
    #[error(transparent)] Vitals(#[from] VitalsError),
    #[error(transparent)] Care(#[from] CareError),
    #[error(transparent)] Stake(#[from] StakeError),
    #[error(transparent)] Raid(#[from] RaidError),
    #[error(transparent)] Match(#[from] MatchError),
    #[error(transparent)] Score(#[from] ScoreError),
    #[error(transparent)] Store(#[from] StoreError),
}

impl TotemError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Vitals(e) => e.class(),
            Self::Care(e) => e.class(),
            Self::Stake(e) => e.class(),
            Self::Raid(e) => e.class(),
            Self::Match(e) => e.class(),
            Self::Score(e) => e.class(),
            Self::Store(e) => e.class(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldown_is_precondition() {
        let err = CareError::ActionOnCooldown { kind: ActionKind::Feed, ends_at: 99 };
        assert_eq!(err.class(), ErrorClass::Precondition);
        assert!(err.to_string().contains("99"));
    }

    #[test]
    fn insufficient_stake_message_carries_amounts() {
        let err = StakeError::InsufficientStake { have: 100, need: 500 };
        assert_eq!(err.class(), ErrorClass::Precondition);
        assert!(err.to_string().contains("have 100"));
        assert!(err.to_string().contains("need 500"));
    }

    #[test]
    fn bounds_violation_is_validation() {
        let err = StakeError::AmountOutOfBounds { amount: 1, min: 10, max: 20 };
        assert_eq!(err.class(), ErrorClass::Validation);
    }

    #[test]
    fn conflict_race_is_retryable_class() {
        assert_eq!(StoreError::ConflictRace.class(), ErrorClass::Conflict);
    }

    #[test]
    fn top_level_class_delegates() {
        let err: TotemError = RaidError::NeglectedPet.into();
        assert_eq!(err.class(), ErrorClass::Precondition);
        let err: TotemError = StoreError::PetNotFound(PetId(7)).into();
        assert_eq!(err.class(), ErrorClass::NotFound);
    }

    #[test]
    fn internal_fault_hides_nothing_but_class() {
        let err = StoreError::Internal("row deserialize".into());
        assert_eq!(err.class(), ErrorClass::Internal);
    }
}
