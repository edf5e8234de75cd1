//! Pure calculators for deposit rewards and staking power.
//!
//! These are total functions: every input in their domain yields a value, with zero standing in
//! for undefined cases such as empty pools.

mod power;
mod reward;

pub use power::{MAX_POWER, calc_extra_power, calc_power, commission_weighted_power};
pub use reward::{MONTH_MILLIS, calc_reward, term_months};
