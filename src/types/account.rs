//! Types that make up the view of an individual account.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::common::{
    Address, Balance, ChainTime, Deposit, DepositId, Pool, Power, Timestamp, UnbondingEntry,
};
use crate::calc::calc_power;

/// Bonded and unbonding amounts of one asset class.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AssetLedger {
    /// Amount currently bonded.
    pub bonded: Balance,

    /// Amounts on their way out of staking, in ledger order.
    pub unbonding: Vec<UnbondingEntry>,
}

impl AssetLedger {
    /// Everything in the unbonding queue, expired or not.
    pub fn total_unbonding(&self) -> Balance {
        sum(self.unbonding.iter().map(|entry| entry.amount))
    }

    /// Unbonding amounts whose delay has passed and which can be released.
    pub fn releasable(&self) -> Balance {
        sum(self
            .unbonding
            .iter()
            .filter(|entry| entry.is_expired)
            .map(|entry| entry.amount))
    }

    /// Unbonding amounts still inside their delay, which can be re-bonded instead.
    pub fn restakable(&self) -> Balance {
        sum(self
            .unbonding
            .iter()
            .filter(|entry| !entry.is_expired)
            .map(|entry| entry.amount))
    }
}

/// The full breakdown of an account's staked assets.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AssetDistribution {
    /// Directly bonded RING.
    pub ring: AssetLedger,

    /// Directly bonded KTON.
    pub kton: AssetLedger,

    /// RING locked in deposits which are bonded as staking collateral.
    ///
    /// `bonded` is the total value of the bonded deposits. Unbonding entries carry the deposit id
    /// and its value.
    pub deposits: AssetLedger,

    /// Ids of the deposits which are bonded.
    pub staked_deposit_ids: BTreeSet<DepositId>,
}

impl AssetDistribution {
    /// The "never staked" baseline.
    pub fn empty() -> Self {
        Self::default()
    }

    /// RING counted towards power: direct bonds plus bonded deposits.
    pub fn bonded_ring(&self) -> Balance {
        self.ring.bonded.saturating_add(self.deposits.bonded)
    }

    pub fn bonded_kton(&self) -> Balance {
        self.kton.bonded
    }

    /// The power of this account's bonds in the given pools.
    pub fn power(&self, pool: &Pool) -> Power {
        calc_power(self.bonded_ring(), self.bonded_kton(), pool.ring, pool.kton)
    }

    /// Largest amount of directly bonded RING which can be unbonded.
    pub fn max_unstake_ring(&self) -> Balance {
        self.ring.bonded
    }

    /// Largest amount of KTON which can be unbonded.
    pub fn max_unstake_kton(&self) -> Balance {
        self.kton.bonded
    }

    /// Whether the deposit is bonded and so can be unbonded.
    pub fn can_unstake_deposit(&self, id: DepositId) -> bool {
        self.staked_deposit_ids.contains(&id)
    }

    /// Everything this account has committed to staking and not yet released.
    pub fn total_committed_ring(&self) -> Balance {
        self.bonded_ring()
            .saturating_add(self.ring.total_unbonding())
            .saturating_add(self.deposits.total_unbonding())
    }
}

/// A complete snapshot of the derived state of one account.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AccountSnapshot {
    /// The account.
    pub address: Address,

    /// The account's deposits, with derived rewards, in chain order.
    pub deposits: Vec<Deposit>,

    /// The account's staked assets.
    pub distribution: AssetDistribution,

    /// The account's power in the current pools.
    pub power: Power,

    /// The chain time the unbonding projections are relative to.
    pub time: ChainTime,

    /// The wall-clock time the unbonding projections were computed at.
    pub projected_at: Timestamp,
}

fn sum(amounts: impl Iterator<Item = Balance>) -> Balance {
    amounts.fold(Balance::ZERO, Balance::saturating_add)
}
