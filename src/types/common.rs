//! Primitive types.

use std::{
    collections::BTreeSet,
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    calc::{calc_reward, term_months},
    error::ensure,
};

pub use alloy_primitives::{Address, U256};

/// An amount of RING or KTON in wei (18 decimals).
pub type Balance = U256;

/// Voting power derived from bonded RING and KTON relative to the global pools.
pub type Power = U256;

/// A Unix timestamp in milliseconds since epoch.
pub type Timestamp = u64;

pub type BlockNumber = u64;

pub type DepositId = u64;

/// One RING (or KTON) in wei.
pub const UNIT: u128 = 1_000_000_000_000_000_000;

/// A collator commission, held in hundredths of a percent.
///
/// Parsed from the chain's percentage strings (`"10.00%"`) and always in the range `0..=100%`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Commission(u32);

impl Commission {
    /// Denominator of the internal representation (100% in hundredths of a percent).
    pub const SCALE: u32 = 10_000;

    pub const ZERO: Self = Self(0);

    /// A whole-number percentage, saturating at 100%.
    pub const fn from_percent(percent: u32) -> Self {
        if percent >= 100 {
            Self(Self::SCALE)
        } else {
            Self(percent * 100)
        }
    }

    /// The commission in hundredths of a percent.
    pub fn basis_points(&self) -> u32 {
        self.0
    }
}

impl Display for Commission {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Commission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::bad_request().context(format!("invalid commission {s:?}"));

        let s = s.trim();
        let s = s.strip_suffix('%').unwrap_or(s).trim_end();
        let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
        ensure!(
            !whole.is_empty() && whole.bytes().all(|b| b.is_ascii_digit()),
            invalid()
        );
        ensure!(frac.bytes().all(|b| b.is_ascii_digit()), invalid());

        let whole: u32 = whole.parse().map_err(|_| invalid())?;
        // Anything finer than a hundredth of a percent is truncated.
        let frac = frac
            .bytes()
            .chain(std::iter::repeat(b'0'))
            .take(2)
            .fold(0, |acc, b| acc * 10 + u32::from(b - b'0'));
        ensure!(whole <= 100, invalid());

        let value = whole * 100 + frac;
        ensure!(value <= Self::SCALE, invalid());
        Ok(Self(value))
    }
}

impl TryFrom<String> for Commission {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Commission> for String {
    fn from(value: Commission) -> Self {
        value.to_string()
    }
}

/// The global bonding pools.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Pool {
    /// Total RING bonded across the network.
    pub ring: Balance,

    /// Total KTON bonded across the network.
    pub kton: Balance,
}

impl Pool {
    pub fn new(ring: Balance, kton: Balance) -> Self {
        Self { ring, kton }
    }
}

/// Information about the current "time" on the chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChainTime {
    /// The latest block number.
    pub block: BlockNumber,

    /// The timestamp of the latest block.
    pub timestamp: Timestamp,
}

/// A deposit entry exactly as reported by the chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDeposit {
    pub id: DepositId,
    pub value: Balance,
    pub start_time: Timestamp,
    pub expired_time: Timestamp,
    pub in_use: bool,
}

/// A fixed-term lock of RING which earns a KTON reward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deposit {
    pub id: DepositId,

    pub owner: Address,

    /// The locked RING.
    pub principal: Balance,

    /// KTON earned over the full term.
    ///
    /// This is not stored on chain. It is derived from the principal and the term length every time
    /// the deposit is observed.
    pub reward: Balance,

    pub start_time: Timestamp,

    pub expired_time: Timestamp,

    /// Whether the deposit is currently bonded as staking collateral.
    pub in_use: bool,
}

/// Where a deposit is in its lifecycle, relative to some point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum DepositStatus {
    /// The term has not ended and the deposit is not bonded.
    Locked,

    /// The deposit is bonded. It must be unbonded before it can be withdrawn.
    InUse,

    /// The term has ended and the deposit is free to withdraw.
    Unlockable,
}

impl Deposit {
    /// Interpret a chain deposit entry belonging to `owner`.
    pub fn from_chain(owner: Address, raw: &RawDeposit) -> Self {
        let term = term_months(raw.start_time, raw.expired_time);
        Self {
            id: raw.id,
            owner,
            principal: raw.value,
            reward: calc_reward(raw.value, term),
            start_time: raw.start_time,
            expired_time: raw.expired_time,
            in_use: raw.in_use,
        }
    }

    /// The term of this deposit, in (rounded) 30-day months.
    pub fn term_months(&self) -> i64 {
        term_months(self.start_time, self.expired_time)
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expired_time
    }

    pub fn status(&self, now: Timestamp) -> DepositStatus {
        if self.in_use {
            DepositStatus::InUse
        } else if self.is_expired(now) {
            DepositStatus::Unlockable
        } else {
            DepositStatus::Locked
        }
    }

    /// Whether the deposit can be withdrawn directly at time `now`.
    pub fn can_withdraw(&self, now: Timestamp) -> bool {
        self.status(now) == DepositStatus::Unlockable
    }
}

/// An amount of RING or KTON waiting to be released at `target_block`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Unbonding {
    pub amount: Balance,
    pub target_block: BlockNumber,
}

/// A deposit waiting to be released from staking at `target_block`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositUnbonding {
    pub deposit_id: DepositId,
    pub target_block: BlockNumber,
}

/// An account's staking ledger, as reported by the chain.
///
/// Every observation is a full snapshot which replaces the previous one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingLedger {
    pub staked_ring: Balance,
    pub staked_kton: Balance,
    pub staked_deposits: BTreeSet<DepositId>,
    pub unstaking_ring: Vec<Unbonding>,
    pub unstaking_kton: Vec<Unbonding>,
    pub unstaking_deposits: Vec<DepositUnbonding>,
}

/// An unbonding amount, projected onto wall-clock time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnbondingEntry {
    pub amount: Balance,

    /// Set for unbonding deposits.
    pub deposit_id: Option<DepositId>,

    pub expired_at_block: BlockNumber,

    /// Estimated time of release.
    ///
    /// Never earlier than the time of projection: entries which are already expired report the
    /// projection time itself.
    pub expired_timestamp: Timestamp,

    pub is_expired: bool,
}
