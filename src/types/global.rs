//! Types that make up the network-wide collator view.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::common::{Address, Balance, ChainTime, Commission, Pool, Power, RawDeposit, StakingLedger};

/// A nominator's share of an active collator's exposure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct IndividualExposure {
    pub who: Address,
    pub value: Power,
}

/// The chain's materialized record of an active collator's backing for the current session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Exposure {
    /// Total power backing the collator, including its own.
    pub total: Power,

    /// Power from the collator's own stake.
    pub own: Power,

    /// Nominators and their shares.
    pub others: Vec<IndividualExposure>,
}

/// A nomination of `collator` by `nominator`, together with the nominator's bonds.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Nomination {
    pub nominator: Address,
    pub collator: Address,

    /// The nominator's ledger, if it has one.
    pub ledger: Option<StakingLedger>,

    /// The nominator's deposits.
    pub deposits: Vec<RawDeposit>,
}

/// The bonded amounts of a single nominator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct NominatorStake {
    pub staked_ring: Balance,
    pub staked_kton: Balance,
    pub staked_deposits_value: Balance,
}

/// How a collator's power figure was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum PowerSource {
    /// Read directly from the collator's exposure for the current session.
    Exposure,

    /// Estimated from the ledgers of its nominators, net of commission.
    ///
    /// The chain only materializes exposures for the active set, so this is an approximation which
    /// may differ from the exposure once the collator becomes active.
    Estimate,
}

/// An entry in the collator set.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CollatorRecord {
    pub address: Address,

    /// How much commission the collator charges.
    pub commission: Commission,

    /// Whether the collator is in the current session's validator set.
    pub is_active: bool,

    /// Blocks produced by this collator in the last session.
    pub last_session_blocks: u64,

    /// Total power delegated to this collator.
    pub total_staked_power: Power,

    pub power_source: PowerSource,

    pub nominators: BTreeSet<Address>,
}

/// The collator set, keyed by address.
///
/// Readers clone this freely; the immutable map shares structure with previous versions.
pub type CollatorSet = im::OrdMap<Address, CollatorRecord>;

/// A snapshot of the collator set, and the chain state it was derived from.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CollatorSetSnapshot {
    pub collators: Vec<CollatorRecord>,
    pub pool: Pool,
    pub time: ChainTime,
}
