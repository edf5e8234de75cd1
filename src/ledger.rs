//! Reconciliation of an account's staking ledger with its deposits.
//!
//! The chain reports ledgers and deposit lists through independent subscriptions, so the inputs
//! here are not guaranteed to be a consistent joint snapshot. A ledger may reference a deposit
//! which has not yet appeared in the deposit list; such a deposit is valued at zero until the
//! deposit list catches up.

use std::collections::BTreeMap;

use crate::types::{
    account::{AssetDistribution, AssetLedger},
    common::{Balance, Deposit, DepositId, RawDeposit, StakingLedger},
    global::NominatorStake,
};

mod unbonding;

pub use unbonding::{Horizon, QueuedUnbonding, project_unbonding};

/// Values of deposits, indexed by id.
#[derive(Clone, Debug, Default)]
struct DepositValues(BTreeMap<DepositId, Balance>);

impl DepositValues {
    fn new(deposits: &[Deposit]) -> Self {
        Self(
            deposits
                .iter()
                .map(|deposit| (deposit.id, deposit.principal))
                .collect(),
        )
    }

    fn from_chain(deposits: &[RawDeposit]) -> Self {
        Self(
            deposits
                .iter()
                .map(|deposit| (deposit.id, deposit.value))
                .collect(),
        )
    }

    /// The value of a deposit, or zero if the deposit is unknown.
    fn get(&self, id: DepositId) -> Balance {
        match self.0.get(&id) {
            Some(value) => *value,
            None => {
                tracing::debug!(id, "ledger references unknown deposit, valuing at zero");
                Balance::ZERO
            }
        }
    }

    /// The total value of a set of deposits.
    fn total<'a>(&self, ids: impl IntoIterator<Item = &'a DepositId>) -> Balance {
        ids.into_iter()
            .map(|id| self.get(*id))
            .fold(Balance::ZERO, Balance::saturating_add)
    }
}

/// Total value of the deposits in `deposits` which `ledger` has bonded.
pub fn deposits_in_staking(ledger: &StakingLedger, deposits: &[Deposit]) -> Balance {
    DepositValues::new(deposits).total(&ledger.staked_deposits)
}

/// The bonded amounts of a nominator, straight from its chain ledger and deposits.
pub fn nominator_stake(ledger: Option<&StakingLedger>, deposits: &[RawDeposit]) -> NominatorStake {
    let Some(ledger) = ledger else {
        return NominatorStake::default();
    };
    NominatorStake {
        staked_ring: ledger.staked_ring,
        staked_kton: ledger.staked_kton,
        staked_deposits_value: DepositValues::from_chain(deposits).total(&ledger.staked_deposits),
    }
}

/// Derive an account's [`AssetDistribution`] from its ledger and deposits.
///
/// A missing ledger is the valid "never staked" state, and yields the empty distribution whatever
/// the deposits are. The result depends only on the arguments, so it must be recomputed whenever
/// the ledger, the deposits or the horizon change.
pub fn reconcile(
    ledger: Option<&StakingLedger>,
    deposits: &[Deposit],
    horizon: &Horizon,
) -> AssetDistribution {
    let Some(ledger) = ledger else {
        return AssetDistribution::empty();
    };
    let values = DepositValues::new(deposits);

    let ring = AssetLedger {
        bonded: ledger.staked_ring,
        unbonding: project_unbonding(
            ledger.unstaking_ring.iter().map(QueuedUnbonding::from),
            horizon,
        ),
    };
    let kton = AssetLedger {
        bonded: ledger.staked_kton,
        unbonding: project_unbonding(
            ledger.unstaking_kton.iter().map(QueuedUnbonding::from),
            horizon,
        ),
    };
    let deposits = AssetLedger {
        bonded: values.total(&ledger.staked_deposits),
        unbonding: project_unbonding(
            ledger
                .unstaking_deposits
                .iter()
                .map(|unbonding| QueuedUnbonding {
                    amount: values.get(unbonding.deposit_id),
                    deposit_id: Some(unbonding.deposit_id),
                    target_block: unbonding.target_block,
                }),
            horizon,
        ),
    };

    AssetDistribution {
        ring,
        kton,
        deposits,
        staked_deposit_ids: ledger.staked_deposits.clone(),
    }
}
