//! Staking power.

use crate::types::common::{Balance, Commission, Pool, Power};

/// Power of an account holding the entire bonded supply.
pub const MAX_POWER: u64 = 1_000_000_000;

/// Power of `ring` bonded RING and `kton` bonded KTON, given the global pools.
///
/// KTON is converted to RING at the (floored) ratio of the pools, and the result is expressed as a
/// share of [`MAX_POWER`] split evenly between the two assets:
/// `(ring + kton * (pool_ring / pool_kton)) * MAX_POWER / (pool_ring * 2)`.
///
/// An empty RING pool yields zero power, and an empty KTON pool makes KTON worthless.
pub fn calc_power(ring: Balance, kton: Balance, pool_ring: Balance, pool_kton: Balance) -> Power {
    if pool_ring.is_zero() {
        return Power::ZERO;
    }
    let divider = if pool_kton.is_zero() {
        Balance::ZERO
    } else {
        pool_ring / pool_kton
    };

    let numerator = ring
        .saturating_add(kton.saturating_mul(divider))
        .saturating_mul(Balance::from(MAX_POWER));
    numerator / pool_ring.saturating_mul(Balance::from(2))
}

/// Power gained by bonding an additional `add_ring` and `add_kton` right now.
///
/// The new stake grows the pools as well as the account's own bond, so this is the difference
/// between power after bonding (with the enlarged pools) and power of an empty bond in the current
/// pools. The divider is floored, so adding KTON across a change in the pool ratio can lower the
/// result.
pub fn calc_extra_power(add_ring: Balance, add_kton: Balance, pool: &Pool) -> Power {
    let after = calc_power(
        add_ring,
        add_kton,
        pool.ring.saturating_add(add_ring),
        pool.kton.saturating_add(add_kton),
    );
    let before = calc_power(Balance::ZERO, Balance::ZERO, pool.ring, pool.kton);
    after.saturating_sub(before)
}

/// Power left to nominators once the collator keeps its `commission`.
pub fn commission_weighted_power(power: Power, commission: Commission) -> Power {
    let scale = Power::from(Commission::SCALE);
    let kept = Power::from(Commission::SCALE - commission.basis_points());
    power.saturating_mul(kept) / scale
}
