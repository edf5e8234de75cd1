//! Projection of unbonding queues onto wall-clock time.

use crate::types::common::{
    Balance, BlockNumber, DepositId, Timestamp, Unbonding, UnbondingEntry,
};

/// The reference point an unbonding queue is projected from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Horizon {
    /// The latest block number.
    pub block: BlockNumber,

    /// Wall-clock time at which the projection is made, in milliseconds.
    pub now: Timestamp,

    /// Expected block time of the chain.
    pub seconds_per_block: u64,
}

/// An unbonding entry as queued in a ledger, before projection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueuedUnbonding {
    pub amount: Balance,
    pub deposit_id: Option<DepositId>,
    pub target_block: BlockNumber,
}

impl From<&Unbonding> for QueuedUnbonding {
    fn from(unbonding: &Unbonding) -> Self {
        Self {
            amount: unbonding.amount,
            deposit_id: None,
            target_block: unbonding.target_block,
        }
    }
}

/// Estimate when each entry of an unbonding queue is released.
///
/// Entries keep their queue order. Since expiry is relative to `horizon`, the result must be
/// recomputed whenever the block number advances.
pub fn project_unbonding(
    entries: impl IntoIterator<Item = QueuedUnbonding>,
    horizon: &Horizon,
) -> Vec<UnbondingEntry> {
    entries
        .into_iter()
        .map(|entry| {
            // Entries whose target block has passed have no time left; never project into the
            // past.
            let blocks_left = entry.target_block.saturating_sub(horizon.block);
            let millis_left = blocks_left
                .saturating_mul(horizon.seconds_per_block)
                .saturating_mul(1000);
            UnbondingEntry {
                amount: entry.amount,
                deposit_id: entry.deposit_id,
                expired_at_block: entry.target_block,
                expired_timestamp: horizon.now.saturating_add(millis_left),
                is_expired: horizon.block >= entry.target_block,
            }
        })
        .collect()
}
