//! Subscriptions to chain state.

use std::collections::BTreeMap;

use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    types::{
        common::{Address, Balance, ChainTime, Commission, RawDeposit, StakingLedger},
        global::{Exposure, Nomination},
    },
};

pub mod options;
pub mod replay;
pub mod testing;

/// A chain query which can be subscribed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum Topic {
    /// New block headers and their timestamps.
    ChainTime,

    /// The staking ledger of an account.
    Ledger(Address),

    /// The deposit list of an account.
    Deposits(Address),

    /// Total bonded RING.
    RingPool,

    /// Total bonded KTON.
    KtonPool,

    /// The validator set of the current session.
    SessionValidators,

    /// Declared commissions of all collators.
    Commissions,

    /// Exposures of the active collators.
    Exposures,

    /// All nominations, with the nominators' ledgers and deposits.
    Nominations,

    /// Blocks produced per collator in the last session.
    RewardPoints,
}

impl Topic {
    /// The topics the derived state of `account` depends on.
    pub fn all(account: Address) -> [Self; 10] {
        [
            Self::ChainTime,
            Self::Ledger(account),
            Self::Deposits(account),
            Self::RingPool,
            Self::KtonPool,
            Self::SessionValidators,
            Self::Commissions,
            Self::Exposures,
            Self::Nominations,
            Self::RewardPoints,
        ]
    }

    pub fn kind(&self) -> InputKind {
        match self {
            Self::ChainTime => InputKind::ChainTime,
            Self::Ledger(_) => InputKind::Ledger,
            Self::Deposits(_) => InputKind::Deposits,
            Self::RingPool => InputKind::RingPool,
            Self::KtonPool => InputKind::KtonPool,
            Self::SessionValidators => InputKind::SessionValidators,
            Self::Commissions => InputKind::Commissions,
            Self::Exposures => InputKind::Exposures,
            Self::Nominations => InputKind::Nominations,
            Self::RewardPoints => InputKind::RewardPoints,
        }
    }
}

/// The kinds of input the derived state is built from.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Deserialize,
    Serialize,
    derive_more::Display,
)]
pub enum InputKind {
    ChainTime,
    Ledger,
    Deposits,
    RingPool,
    KtonPool,
    SessionValidators,
    Commissions,
    Exposures,
    Nominations,
    RewardPoints,
}

impl InputKind {
    /// Inputs of the per-account view.
    pub const ACCOUNT: [Self; 5] = [
        Self::ChainTime,
        Self::Ledger,
        Self::Deposits,
        Self::RingPool,
        Self::KtonPool,
    ];

    /// Inputs of the collator set.
    pub const COLLATORS: [Self; 7] = [
        Self::RingPool,
        Self::KtonPool,
        Self::SessionValidators,
        Self::Commissions,
        Self::Exposures,
        Self::Nominations,
        Self::RewardPoints,
    ];
}

/// A single observation from a subscription.
///
/// Each observation is a full snapshot of its topic and replaces the previous one.
#[derive(Clone, PartialEq, Eq, derive_more::Debug)]
pub enum Input {
    ChainTime(ChainTime),

    /// [`None`] if the account has never staked.
    Ledger(Option<StakingLedger>),

    /// [`None`] if the account has no deposits.
    Deposits(Option<Vec<RawDeposit>>),

    RingPool(Balance),

    KtonPool(Balance),

    SessionValidators(Vec<Address>),

    #[debug("Commissions({})", _0.len())]
    Commissions(BTreeMap<Address, Commission>),

    #[debug("Exposures({})", _0.len())]
    Exposures(BTreeMap<Address, Exposure>),

    #[debug("Nominations({})", _0.len())]
    Nominations(Vec<Nomination>),

    #[debug("RewardPoints({})", _0.len())]
    RewardPoints(BTreeMap<Address, u64>),
}

impl Input {
    pub fn kind(&self) -> InputKind {
        match self {
            Self::ChainTime(_) => InputKind::ChainTime,
            Self::Ledger(_) => InputKind::Ledger,
            Self::Deposits(_) => InputKind::Deposits,
            Self::RingPool(_) => InputKind::RingPool,
            Self::KtonPool(_) => InputKind::KtonPool,
            Self::SessionValidators(_) => InputKind::SessionValidators,
            Self::Commissions(_) => InputKind::Commissions,
            Self::Exposures(_) => InputKind::Exposures,
            Self::Nominations(_) => InputKind::Nominations,
            Self::RewardPoints(_) => InputKind::RewardPoints,
        }
    }
}

/// Interface for subscribing to chain state.
///
/// Implementations own the transport, including any reconnection logic. A subscription yields an
/// error when the transport fails but may keep going afterwards; the consumer logs the error and
/// keeps the last good value. Dropping the stream unsubscribes.
pub trait ChainClient: Clone + Send + Sync + 'static {
    /// Subscribe to `topic`.
    ///
    /// The first item should be the current value, followed by a new item every time the value
    /// changes.
    fn subscribe(&self, topic: Topic) -> BoxStream<'static, Result<Input>>;
}
