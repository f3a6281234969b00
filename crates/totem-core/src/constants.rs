//! Protocol constants. All monetary values in units (1 TOTEM = 10^9 units);
//! all pet stats in milli-points (1 display point = 1,000 milli-points).

/// Smallest-unit scale of the staking token.
pub const TOKEN: u64 = 1_000_000_000;

/// Basis-point precision: 10,000 BPS = 1.0×.
pub const BPS_PRECISION: u64 = 10_000;

/// Milli-points per display stat point.
pub const STAT_SCALE: u64 = 1_000;

/// Upper clamp for every decaying stat (100 display points).
pub const STAT_MAX: u64 = 100 * STAT_SCALE;

pub const SECS_PER_HOUR: u64 = 3_600;
pub const SECS_PER_DAY: u64 = 86_400;
pub const SECS_PER_WEEK: u64 = 7 * SECS_PER_DAY;

// --- Stat decay (milli-points per day) ---

pub const HUNGER_DECAY_PER_DAY: u64 = 30_000;
pub const MOOD_DECAY_PER_DAY: u64 = 24_000;
pub const ENERGY_DECAY_PER_DAY: u64 = 20_000;
pub const REPUTATION_DECAY_PER_DAY: u64 = 2_000;

/// Hunger or mood below this value starts the neglect countdown.
pub const NEGLECT_THRESHOLD: u64 = 20 * STAT_SCALE;

/// Continuous time below [`NEGLECT_THRESHOLD`] before a pet is neglected.
pub const NEGLECT_GRACE_SECS: u64 = 12 * SECS_PER_HOUR;

// --- Care actions ---

pub const FEED_COOLDOWN_SECS: u64 = 4 * SECS_PER_HOUR;
pub const PLAY_COOLDOWN_SECS: u64 = 2 * SECS_PER_HOUR;
pub const SLEEP_COOLDOWN_SECS: u64 = 8 * SECS_PER_HOUR;
pub const SOCIALIZE_COOLDOWN_SECS: u64 = 6 * SECS_PER_HOUR;

/// A care action within this window of the previous one extends the streak;
/// outside it the streak resets to 1.
pub const STREAK_WINDOW_SECS: u64 = 36 * SECS_PER_HOUR;

/// Reputation gained per care action (milli-points).
pub const REPUTATION_PER_ACTION: u64 = 250;

/// Additional reputation per streak step, on top of the base award.
pub const REPUTATION_STREAK_BONUS: u64 = 50;

/// Reputation clamp (same scale as the decaying stats).
pub const REPUTATION_MAX: u64 = STAT_MAX;

// --- Evolution thresholds ---

pub const JUVENILE_MIN_ACTIONS: u64 = 10;
pub const ADULT_MIN_ACTIONS: u64 = 40;
pub const ADULT_MIN_STREAK: u32 = 3;
pub const ELDER_MIN_ACTIONS: u64 = 120;
pub const ELDER_MIN_STREAK: u32 = 7;

/// Cosmetic forms available per (tribe, stage) pair.
pub const FORMS_PER_STAGE: u8 = 3;

// --- Staking ---

/// Minimum amount per stake or unstake transaction.
pub const MIN_STAKE: u64 = TOKEN;

/// Maximum amount per stake transaction.
pub const MAX_STAKE: u64 = 1_000_000 * TOKEN;

/// Cap on the total amount staked against a single pet.
pub const MAX_TOTAL_STAKE: u64 = 10_000_000 * TOKEN;

/// Power points per whole staked token at 1.0× multipliers.
pub const POWER_PER_TOKEN: u64 = 10;

/// Reward accrual in units per power point per day (0.001 TOTEM).
pub const REWARD_RATE_PER_POWER_PER_DAY: u64 = 1_000_000;

/// Claim multiplier for members of the previous week's winning tribe (1.25×).
pub const WINNING_TRIBE_BONUS_BPS: u64 = 12_500;

/// Accrual penalty per full day of neglect.
pub const NEGLECT_PENALTY_BPS_PER_DAY: u64 = 1_000;

/// Penalty cap: a fully neglected pet still accrues 20% of its rate.
pub const NEGLECT_PENALTY_CAP_BPS: u64 = 8_000;

/// Share of every claim burned to the pet's tribe treasury.
pub const TREASURY_CUT_BPS: u64 = 200;

// --- Boss raids ---

pub const RAID_ATTACK_COOLDOWN_SECS: u64 = SECS_PER_HOUR;

/// Upper bound of the deterministic damage bonus roll (+10% max).
pub const DAMAGE_VARIANCE_BPS: u64 = 1_000;

/// Length of one raid period; the current raid is keyed by this window.
pub const RAID_PERIOD_SECS: u64 = SECS_PER_DAY;

/// Health pool of a freshly spawned boss.
pub const BOSS_BASE_HP: u64 = 1_000_000;

// --- Matchmaking ---

/// Opponents must be within ±25% of the challenger's power.
pub const POWER_BAND_BPS: u64 = 2_500;

/// Default opponent list size.
pub const DEFAULT_OPPONENT_LIMIT: usize = 10;

// --- Weekly scoring ---

pub const WEIGHT_ACTIVITY: u64 = 10;
pub const WEIGHT_SOCIAL: u64 = 15;
pub const WEIGHT_CONSISTENCY: u64 = 20;
pub const WEIGHT_EVENT: u64 = 25;

/// Care streak at or above which an action counts toward consistency.
pub const CONSISTENCY_MIN_STREAK: u32 = 3;

/// Cached week scores older than this are recomputed on read.
pub const SCORE_STALENESS_SECS: u64 = 600;

/// Weeks per season.
pub const WEEKS_PER_SEASON: u64 = 12;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_scale_math() {
        assert_eq!(STAT_MAX, 100_000);
        assert_eq!(STAT_MAX / STAT_SCALE, 100);
        assert!(NEGLECT_THRESHOLD < STAT_MAX);
    }

    #[test]
    fn decay_rates_drain_within_a_week() {
        // Every decaying stat reaches zero from full in under a week of
        // total neglect, so weekly scoring always sees the consequence.
        for rate in [HUNGER_DECAY_PER_DAY, MOOD_DECAY_PER_DAY, ENERGY_DECAY_PER_DAY] {
            assert!(rate * 7 >= STAT_MAX, "rate {rate} too slow");
        }
    }

    #[test]
    fn penalty_cap_below_full() {
        assert!(NEGLECT_PENALTY_CAP_BPS < BPS_PRECISION);
        // Cap reached after 8 full days at the per-day rate.
        assert_eq!(NEGLECT_PENALTY_CAP_BPS / NEGLECT_PENALTY_BPS_PER_DAY, 8);
    }

    #[test]
    fn stake_bounds_ordered() {
        assert!(MIN_STAKE <= MAX_STAKE);
        assert!(MAX_STAKE <= MAX_TOTAL_STAKE);
    }

    #[test]
    fn variance_strictly_bounded() {
        assert!(DAMAGE_VARIANCE_BPS < BPS_PRECISION);
    }
}
