//! KTON rewards for fixed-term RING deposits.

use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::types::common::{Balance, Timestamp};

/// Length of a deposit month: 30 days, in milliseconds.
pub const MONTH_MILLIS: u64 = 30 * 24 * 60 * 60 * 1000;

/// Monthly growth factor of the reward curve is `GROWTH_NUMERATOR / GROWTH_DENOMINATOR`.
const GROWTH_NUMERATOR: u32 = 67;
const GROWTH_DENOMINATOR: u32 = 66;

/// Fixed-point precision applied to the fractional part of the growth factor.
const PRECISION: u32 = 1000;

const REWARD_DIVISOR: u32 = 1_970_000;

/// Shortest term for which even a 1 wei principal earns more than [`Balance::MAX`].
const SATURATING_TERM: i64 = 12_305;

/// The KTON reward for locking `principal` RING for `term_months`.
///
/// With `n = 67^term` and `d = 66^term`, the reward is
/// `(1000 * (n / d - 1) + 1000 * (n % d) / d) * principal / 1_970_000`, rounding down at every
/// division. All intermediate values are unbounded integers. Results which do not fit in a
/// [`Balance`] saturate.
pub fn calc_reward(principal: Balance, term_months: i64) -> Balance {
    if term_months <= 0 || principal.is_zero() {
        return Balance::ZERO;
    }
    if term_months >= SATURATING_TERM {
        return Balance::MAX;
    }
    // Bounded by `SATURATING_TERM` above.
    let term = term_months as u32;

    let n = BigUint::from(GROWTH_NUMERATOR).pow(term);
    let d = BigUint::from(GROWTH_DENOMINATOR).pow(term);
    let quotient = &n / &d;
    let remainder = &n % &d;
    let precision = BigUint::from(PRECISION);

    // `n > d` for any positive term, so `quotient >= 1`.
    let rate = &precision * (quotient - BigUint::one()) + &precision * remainder / &d;
    let reward = rate * to_big(principal) / BigUint::from(REWARD_DIVISOR);
    from_big(&reward)
}

/// The deposit term in months, as implied by its start and expiry times.
///
/// The span is divided by a 30-day month and rounded to the nearest integer, halves rounding up.
/// A deposit whose recorded start drifted from the moment the term was chosen can land one month
/// off near a boundary. The rounding is kept as is.
pub fn term_months(start: Timestamp, expired: Timestamp) -> i64 {
    let Some(span) = expired.checked_sub(start) else {
        return 0;
    };
    let months = (u128::from(span) + u128::from(MONTH_MILLIS / 2)) / u128::from(MONTH_MILLIS);
    months as i64
}

fn to_big(value: Balance) -> BigUint {
    BigUint::from_bytes_be(&value.to_be_bytes::<32>())
}

fn from_big(value: &BigUint) -> Balance {
    if value.is_zero() {
        return Balance::ZERO;
    }
    Balance::try_from_be_slice(&value.to_bytes_be()).unwrap_or(Balance::MAX)
}

#[cfg(test)]
mod test {
    use rand::{Rng, SeedableRng, rngs::StdRng};

    use super::*;
    use crate::types::common::UNIT;

    fn ring(amount: u128) -> Balance {
        Balance::from(amount * UNIT)
    }

    #[test]
    fn test_zero_inputs() {
        for term in [-12, -1, 0] {
            assert_eq!(calc_reward(ring(10_000), term), Balance::ZERO);
        }
        for term in [1, 12, 36, 1000] {
            assert_eq!(calc_reward(Balance::ZERO, term), Balance::ZERO);
        }
    }

    #[test]
    fn test_twelve_months() {
        // 67^12 / 66^12 has quotient 1, so the rate is floor(1000 * r / d) = 197 per mille, and
        // 10_000 RING * 197 / 1_970_000 comes out at exactly one KTON.
        assert_eq!(calc_reward(ring(10_000), 12), Balance::from(UNIT));
    }

    #[test]
    fn test_known_terms() {
        let cases = [
            (1, 76_142_131_979_695_431u128),
            (3, 233_502_538_071_065_989),
            (6, 477_157_360_406_091_370),
            (24, 2_203_045_685_279_187_817),
            (36, 3_644_670_050_761_421_319),
        ];
        for (term, expected) in cases {
            assert_eq!(calc_reward(ring(10_000), term), Balance::from(expected), "{term}");
        }

        // Small principals round down to nothing.
        assert_eq!(calc_reward(Balance::from(1000), 36), Balance::ZERO);
        assert_eq!(calc_reward(Balance::from(UNIT), 1), Balance::from(7_614_213_197_969u64));
    }

    #[test]
    fn test_monotonic_in_term() {
        let principal = ring(12_345);
        let mut prev = Balance::ZERO;
        for term in 0..=60 {
            let reward = calc_reward(principal, term);
            assert!(reward >= prev, "term {term}: {reward} < {prev}");
            prev = reward;
        }
    }

    #[test]
    fn test_monotonic_in_principal() {
        let mut rng = StdRng::seed_from_u64(0);
        for term in [1, 3, 12, 36] {
            let mut principals = (0..100)
                .map(|_| rng.gen_range(1..1_000_000_000u128) * UNIT)
                .collect::<Vec<_>>();
            principals.sort();
            principals.dedup();
            for pair in principals.windows(2) {
                let low = calc_reward(Balance::from(pair[0]), term);
                let high = calc_reward(Balance::from(pair[1]), term);
                assert!(high > low, "term {term}: {high} <= {low}");
            }
        }
    }

    #[test]
    fn test_saturation() {
        assert_eq!(calc_reward(Balance::from(1), SATURATING_TERM), Balance::MAX);
        assert_eq!(calc_reward(Balance::MAX, i64::MAX), Balance::MAX);
        assert!(calc_reward(Balance::from(1), SATURATING_TERM - 1) < Balance::MAX);
    }

    #[test]
    fn test_term_months() {
        assert_eq!(term_months(0, 0), 0);
        assert_eq!(term_months(100, 0), 0);
        assert_eq!(term_months(0, 12 * MONTH_MILLIS), 12);
        assert_eq!(term_months(1_000, 1_000 + 36 * MONTH_MILLIS), 36);

        // Known boundary: a deposit recorded a little late still rounds to the chosen term, but
        // half a month of drift flips it to the next one.
        assert_eq!(term_months(0, 3 * MONTH_MILLIS - 60_000), 3);
        assert_eq!(term_months(0, 3 * MONTH_MILLIS + MONTH_MILLIS / 2 - 1), 3);
        assert_eq!(term_months(0, 3 * MONTH_MILLIS + MONTH_MILLIS / 2), 4);
    }
}
