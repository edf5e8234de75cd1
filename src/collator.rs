//! Aggregation of delegated power per collator.
//!
//! Active collators have an exposure for the current session, and their power is read from it
//! exactly. Waiting collators have no exposure, so their power is estimated from the ledgers of
//! their nominators in the current pools, net of the collator's commission. Both paths are kept:
//! the chain offers no exact aggregate for the waiting pool.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    calc::{calc_power, commission_weighted_power},
    ledger::nominator_stake,
    types::{
        common::{Address, Balance, Commission, Pool, Power},
        global::{CollatorRecord, CollatorSet, Exposure, Nomination, PowerSource},
    },
};

/// The latest value of every input to the collator set.
#[derive(Clone, Copy, Debug)]
pub struct CollatorInputs<'a> {
    /// Declared commissions of all registered collators.
    pub commissions: &'a BTreeMap<Address, Commission>,

    /// The current session's validators.
    pub session_validators: &'a BTreeSet<Address>,

    /// Exposures of the active collators.
    pub exposures: &'a BTreeMap<Address, Exposure>,

    /// All nominations, with the nominators' bonds.
    pub nominations: &'a [Nomination],

    /// Blocks produced per collator in the last session.
    pub reward_points: &'a BTreeMap<Address, u64>,

    pub pool: &'a Pool,
}

/// Rebuild the collator set from scratch.
///
/// Every registered collator and every session validator gets a record. A session validator whose
/// commission has not been observed yet is treated as charging none.
pub fn aggregate(inputs: &CollatorInputs) -> CollatorSet {
    let mut nominations: BTreeMap<Address, Vec<&Nomination>> = BTreeMap::new();
    for nomination in inputs.nominations {
        nominations
            .entry(nomination.collator)
            .or_default()
            .push(nomination);
    }

    let addresses = inputs
        .commissions
        .keys()
        .chain(inputs.session_validators)
        .copied()
        .collect::<BTreeSet<_>>();
    addresses
        .into_iter()
        .map(|address| {
            let commission = inputs
                .commissions
                .get(&address)
                .copied()
                .unwrap_or_default();
            let nominations = nominations
                .get(&address)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let (total_staked_power, power_source, nominators): (_, _, BTreeSet<_>) =
                match inputs.exposures.get(&address) {
                    Some(exposure) => (
                        exposure.total,
                        PowerSource::Exposure,
                        exposure.others.iter().map(|other| other.who).collect(),
                    ),
                    None => (
                        estimate_power(nominations, commission, inputs.pool),
                        PowerSource::Estimate,
                        nominations
                            .iter()
                            .map(|nomination| nomination.nominator)
                            .collect(),
                    ),
                };
            let record = CollatorRecord {
                address,
                commission,
                is_active: inputs.session_validators.contains(&address),
                last_session_blocks: inputs
                    .reward_points
                    .get(&address)
                    .copied()
                    .unwrap_or_default(),
                total_staked_power,
                power_source,
                nominators,
            };
            (address, record)
        })
        .collect()
}

/// Estimated power of a collator without an exposure.
///
/// The nominators' bonds are summed first and converted to power in one step, then the
/// collator's commission is taken off.
pub fn estimate_power(nominations: &[&Nomination], commission: Commission, pool: &Pool) -> Power {
    let (ring, kton) = nominations
        .iter()
        .map(|nomination| nominator_stake(nomination.ledger.as_ref(), &nomination.deposits))
        .fold((Balance::ZERO, Balance::ZERO), |(ring, kton), stake| {
            (
                ring.saturating_add(stake.staked_ring)
                    .saturating_add(stake.staked_deposits_value),
                kton.saturating_add(stake.staked_kton),
            )
        });
    let power = calc_power(ring, kton, pool.ring, pool.kton);
    commission_weighted_power(power, commission)
}
