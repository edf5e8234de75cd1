//! A chain client which replays a recorded snapshot of chain state.
//!
//! Every subscription yields the recorded value once and then stays open without yielding more,
//! which is how a live subscription behaves on a chain that is not producing blocks.

use std::{collections::BTreeMap, path::Path, sync::Arc};

use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};

use super::{ChainClient, Input, Topic};
use crate::{
    Result,
    error::{Error, ResultExt},
    types::{
        common::{Address, ChainTime, Commission, Pool, RawDeposit, StakingLedger},
        global::{Exposure, Nomination},
    },
};

/// A recorded snapshot of chain state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReplayFixture {
    pub time: ChainTime,
    pub pool: Pool,
    pub ledgers: BTreeMap<Address, StakingLedger>,
    pub deposits: BTreeMap<Address, Vec<RawDeposit>>,
    pub session_validators: Vec<Address>,
    pub commissions: BTreeMap<Address, Commission>,
    pub exposures: BTreeMap<Address, Exposure>,
    pub nominations: Vec<Nomination>,
    pub reward_points: BTreeMap<Address, u64>,
}

impl ReplayFixture {
    /// The recorded value of `topic`.
    pub fn get(&self, topic: Topic) -> Input {
        match topic {
            Topic::ChainTime => Input::ChainTime(self.time),
            Topic::Ledger(account) => Input::Ledger(self.ledgers.get(&account).cloned()),
            Topic::Deposits(account) => Input::Deposits(self.deposits.get(&account).cloned()),
            Topic::RingPool => Input::RingPool(self.pool.ring),
            Topic::KtonPool => Input::KtonPool(self.pool.kton),
            Topic::SessionValidators => Input::SessionValidators(self.session_validators.clone()),
            Topic::Commissions => Input::Commissions(self.commissions.clone()),
            Topic::Exposures => Input::Exposures(self.exposures.clone()),
            Topic::Nominations => Input::Nominations(self.nominations.clone()),
            Topic::RewardPoints => Input::RewardPoints(self.reward_points.clone()),
        }
    }
}

/// Chain client serving a [`ReplayFixture`].
#[derive(Clone, Debug)]
pub struct ReplayClient {
    fixture: Arc<ReplayFixture>,
}

impl ReplayClient {
    pub fn new(fixture: ReplayFixture) -> Self {
        Self {
            fixture: Arc::new(fixture),
        }
    }

    /// Load a fixture from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .context(|| Error::not_found().context(format!("reading {}", path.display())))?;
        let fixture = serde_json::from_slice(&bytes)
            .context(|| Error::bad_request().context(format!("parsing {}", path.display())))?;
        tracing::info!(path = %path.display(), "loaded replay fixture");
        Ok(Self::new(fixture))
    }

    pub fn fixture(&self) -> &ReplayFixture {
        &self.fixture
    }
}

impl ChainClient for ReplayClient {
    fn subscribe(&self, topic: Topic) -> BoxStream<'static, Result<Input>> {
        stream::once(futures::future::ready(Ok(self.fixture.get(topic))))
            .chain(stream::pending())
            .boxed()
    }
}
