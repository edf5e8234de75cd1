//! The composition root.
//!
//! A [`StakingContext`] is bound to one [`Target`] at a time: an account on a chain, reached
//! through an RPC endpoint. It runs one task per chain [`Topic`], and each task feeds the latest
//! observation of its topic into a shared [`State`], which recomputes whatever depends on it.
//!
//! Switching targets tears down every subscription before new ones are made. Every write into the
//! state is additionally tagged with the generation of the connection it came from, and the state
//! drops writes from any generation but the current one.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use async_lock::{RwLock, RwLockReadGuard};
use futures::stream::{BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::instrument;
use url::Url;

use crate::{
    Error, Result,
    calc::calc_extra_power,
    collator::{CollatorInputs, aggregate},
    input::chain::{ChainClient, Input, InputKind, Topic, options::ChainConfig},
    ledger::{Horizon, reconcile},
    metrics::{PrometheusMetrics, approximate, tokens},
    types::{
        account::{AccountSnapshot, AssetDistribution},
        common::{
            Address, Balance, ChainTime, Commission, Deposit, DepositId, Pool, Power,
            StakingLedger, Timestamp,
        },
        global::{CollatorRecord, CollatorSet, CollatorSetSnapshot, Exposure, Nomination},
    },
};

/// What a [`StakingContext`] is connected to.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Target {
    pub account: Address,
    pub chain: String,
    pub endpoint: Url,
}

/// Current wall-clock time in milliseconds.
pub fn now_millis() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as Timestamp)
        .unwrap_or_default()
}

/// The latest observation of every topic.
#[derive(Clone, Debug, Default)]
struct Inputs {
    time: ChainTime,
    ledger: Option<StakingLedger>,
    pool: Pool,
    session_validators: BTreeSet<Address>,
    commissions: BTreeMap<Address, Commission>,
    exposures: BTreeMap<Address, Exposure>,
    nominations: Vec<Nomination>,
    reward_points: BTreeMap<Address, u64>,
}

/// Chain inputs and everything derived from them, for the current target.
#[derive(Debug)]
pub struct State {
    config: ChainConfig,
    metrics: PrometheusMetrics,

    generation: u64,
    target: Option<Target>,
    initialized: BTreeSet<InputKind>,
    inputs: Inputs,

    deposits: Vec<Deposit>,
    distribution: AssetDistribution,
    projected_at: Timestamp,
    collators: CollatorSet,
}

impl State {
    pub fn new(config: ChainConfig, metrics: PrometheusMetrics) -> Self {
        Self {
            config,
            metrics,
            generation: 0,
            target: None,
            initialized: Default::default(),
            inputs: Default::default(),
            deposits: vec![],
            distribution: AssetDistribution::empty(),
            projected_at: 0,
            collators: Default::default(),
        }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn metrics(&self) -> &PrometheusMetrics {
        &self.metrics
    }

    /// The generation of the current connection.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    /// Switch to a new target, discarding everything observed for the old one.
    ///
    /// Returns the generation that writes for the new target must carry.
    fn reset(&mut self, target: Option<Target>) -> u64 {
        self.generation += 1;
        tracing::info!(generation = self.generation, ?target, "switching target");

        self.target = target;
        self.initialized.clear();
        self.inputs = Default::default();
        self.deposits.clear();
        self.distribution = AssetDistribution::empty();
        self.projected_at = 0;
        self.collators = Default::default();
        self.generation
    }

    /// Apply a new observation from a subscription of the given generation.
    ///
    /// `now` is the wall-clock time of the observation. Returns `false`, leaving the state
    /// untouched, if `generation` is not the current one.
    pub fn apply(&mut self, generation: u64, input: Input, now: Timestamp) -> bool {
        let account = match &self.target {
            Some(target) if generation == self.generation => target.account,
            _ => {
                tracing::debug!(
                    generation,
                    current = self.generation,
                    kind = %input.kind(),
                    "dropping stale input"
                );
                self.metrics.stale_inputs.inc();
                return false;
            }
        };
        tracing::debug!(?input, "applying input");

        let kind = input.kind();
        match input {
            Input::ChainTime(time) => {
                self.inputs.time = time;
                self.metrics.latest_block.set(time.block as f64);
                self.update_account(now);
            }
            Input::Ledger(ledger) => {
                self.inputs.ledger = ledger;
                self.update_account(now);
            }
            Input::Deposits(deposits) => {
                self.deposits = deposits
                    .unwrap_or_default()
                    .iter()
                    .map(|raw| Deposit::from_chain(account, raw))
                    .collect();
                self.update_account(now);
            }
            Input::RingPool(ring) => {
                self.inputs.pool.ring = ring;
                self.metrics.ring_pool.set(tokens(ring));
                self.update_collators();
            }
            Input::KtonPool(kton) => {
                self.inputs.pool.kton = kton;
                self.metrics.kton_pool.set(tokens(kton));
                self.update_collators();
            }
            Input::SessionValidators(validators) => {
                self.inputs.session_validators = validators.into_iter().collect();
                self.update_collators();
            }
            Input::Commissions(commissions) => {
                self.inputs.commissions = commissions;
                self.update_collators();
            }
            Input::Exposures(exposures) => {
                self.inputs.exposures = exposures;
                self.update_collators();
            }
            Input::Nominations(nominations) => {
                self.inputs.nominations = nominations;
                self.update_collators();
            }
            Input::RewardPoints(points) => {
                self.inputs.reward_points = points;
                self.update_collators();
            }
        }
        if self.initialized.insert(kind) {
            tracing::info!(%kind, "input initialized");
        }
        self.metrics.account_power.set(approximate(self.power()));
        true
    }

    fn update_account(&mut self, now: Timestamp) {
        let horizon = Horizon {
            block: self.inputs.time.block,
            now,
            seconds_per_block: self.config.seconds_per_block,
        };
        self.distribution = reconcile(self.inputs.ledger.as_ref(), &self.deposits, &horizon);
        self.projected_at = now;
    }

    fn update_collators(&mut self) {
        self.collators = aggregate(&CollatorInputs {
            commissions: &self.inputs.commissions,
            session_validators: &self.inputs.session_validators,
            exposures: &self.inputs.exposures,
            nominations: &self.inputs.nominations,
            reward_points: &self.inputs.reward_points,
            pool: &self.inputs.pool,
        });
        self.metrics.collator_count.set(self.collators.len() as f64);
        self.metrics.active_collators.set(
            self.collators
                .values()
                .filter(|record| record.is_active)
                .count() as f64,
        );
    }

    /// Whether an input of this kind has been observed since the target was selected.
    ///
    /// Once set this stays set for the lifetime of the connection, even if the subscription later
    /// fails.
    pub fn is_initialized(&self, kind: InputKind) -> bool {
        self.initialized.contains(&kind)
    }

    /// Whether every input of the account view has been observed.
    pub fn account_ready(&self) -> bool {
        InputKind::ACCOUNT
            .iter()
            .all(|kind| self.is_initialized(*kind))
    }

    /// Whether every input of the collator set has been observed.
    pub fn collators_ready(&self) -> bool {
        InputKind::COLLATORS
            .iter()
            .all(|kind| self.is_initialized(*kind))
    }

    pub fn time(&self) -> ChainTime {
        self.inputs.time
    }

    pub fn pool(&self) -> Pool {
        self.inputs.pool
    }

    /// The account's deposits, with derived rewards.
    pub fn deposits(&self) -> &[Deposit] {
        &self.deposits
    }

    /// Look up one of the account's deposits.
    pub fn deposit(&self, id: DepositId) -> Result<Deposit> {
        self.deposits
            .iter()
            .find(|deposit| deposit.id == id)
            .copied()
            .ok_or_else(|| Error::not_found().context(format!("unknown deposit {id}")))
    }

    pub fn distribution(&self) -> &AssetDistribution {
        &self.distribution
    }

    /// The account's power in the current pools.
    pub fn power(&self) -> Power {
        self.distribution.power(&self.inputs.pool)
    }

    /// The power the account would gain by bonding `add_ring` and `add_kton` now.
    pub fn extra_power(&self, add_ring: Balance, add_kton: Balance) -> Power {
        calc_extra_power(add_ring, add_kton, &self.inputs.pool)
    }

    /// A complete snapshot of the account view.
    pub fn account(&self) -> Result<AccountSnapshot> {
        let Some(target) = &self.target else {
            return Err(Error::not_initialized().context("no account selected"));
        };
        Ok(AccountSnapshot {
            address: target.account,
            deposits: self.deposits.clone(),
            distribution: self.distribution.clone(),
            power: self.power(),
            time: self.inputs.time,
            projected_at: self.projected_at,
        })
    }

    /// The collator set.
    ///
    /// This is cheap to clone, and the clone is unaffected by later updates.
    pub fn collators(&self) -> CollatorSet {
        self.collators.clone()
    }

    /// Look up a single collator.
    pub fn collator(&self, address: Address) -> Result<CollatorRecord> {
        self.collators
            .get(&address)
            .cloned()
            .ok_or_else(|| Error::not_found().context(format!("unknown collator {address}")))
    }

    /// The collator set along with the chain state it was derived from.
    pub fn collator_snapshot(&self) -> Result<CollatorSetSnapshot> {
        if self.target.is_none() {
            return Err(Error::not_initialized().context("no chain selected"));
        }
        Ok(CollatorSetSnapshot {
            collators: self.collators.values().cloned().collect(),
            pool: self.inputs.pool,
            time: self.inputs.time,
        })
    }
}

/// A running subscription task.
#[derive(Debug)]
pub struct Subscription {
    topic: Topic,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Stop the subscription and wait for its task to exit.
    pub async fn cancel(self) {
        self.task.abort();
        let _ = self.task.await;
    }
}

/// Live chain subscriptions for one target, and the state derived from them.
#[derive(Debug)]
pub struct StakingContext {
    state: Arc<RwLock<State>>,
    subscriptions: Vec<Subscription>,
}

impl StakingContext {
    pub fn new(config: ChainConfig) -> Self {
        Self::with_metrics(config, PrometheusMetrics::default())
    }

    pub fn with_metrics(config: ChainConfig, metrics: PrometheusMetrics) -> Self {
        Self {
            state: Arc::new(RwLock::new(State::new(config, metrics))),
            subscriptions: vec![],
        }
    }

    /// Shared handle to the derived state.
    pub fn state(&self) -> Arc<RwLock<State>> {
        self.state.clone()
    }

    /// Read the derived state.
    pub async fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().await
    }

    /// The topics with a running subscription.
    pub fn topics(&self) -> impl Iterator<Item = Topic> + '_ {
        self.subscriptions.iter().map(Subscription::topic)
    }

    /// Connect to `target` through `client`.
    ///
    /// Any existing subscriptions are torn down first, and everything derived from them is
    /// discarded. Returns the generation of the new connection.
    pub async fn connect(&mut self, client: &impl ChainClient, target: Target) -> u64 {
        self.teardown().await;

        let account = target.account;
        let generation = self.state.write().await.reset(Some(target));
        self.subscriptions = Topic::all(account)
            .into_iter()
            .map(|topic| Subscription {
                topic,
                task: tokio::spawn(follow(
                    self.state.clone(),
                    generation,
                    topic,
                    client.subscribe(topic),
                )),
            })
            .collect();
        generation
    }

    /// Tear down all subscriptions and forget the current target.
    pub async fn disconnect(&mut self) {
        self.teardown().await;
        self.state.write().await.reset(None);
    }

    async fn teardown(&mut self) {
        if self.subscriptions.is_empty() {
            return;
        }
        tracing::info!(count = self.subscriptions.len(), "tearing down subscriptions");
        for subscription in self.subscriptions.drain(..) {
            subscription.cancel().await;
        }
    }
}

impl Drop for StakingContext {
    fn drop(&mut self) {
        for subscription in &self.subscriptions {
            subscription.task.abort();
        }
    }
}

/// Feed observations of `topic` into the state until the subscription ends or goes stale.
#[instrument(skip(state, inputs))]
async fn follow(
    state: Arc<RwLock<State>>,
    generation: u64,
    topic: Topic,
    mut inputs: BoxStream<'static, Result<Input>>,
) {
    while let Some(input) = inputs.next().await {
        let input = match input {
            Ok(input) => input,
            Err(err) => {
                // Keep the last good value and wait for the transport to recover.
                tracing::error!("subscription error: {err}");
                continue;
            }
        };
        if !state.write().await.apply(generation, input, now_millis()) {
            tracing::debug!("subscription is stale, stopping");
            return;
        }
    }
    tracing::warn!("subscription ended");
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use tokio::time::sleep;

    use super::*;
    use crate::{
        error::ErrorKind,
        input::chain::testing::MockChainClient,
        types::{
            common::{RawDeposit, UNIT, Unbonding},
            global::{IndividualExposure, PowerSource},
        },
    };

    const NOW: Timestamp = 1_700_000_000_000;

    fn address(i: u8) -> Address {
        Address::repeat_byte(i)
    }

    fn target(account: Address) -> Target {
        Target {
            account,
            chain: "test".into(),
            endpoint: Url::parse("ws://localhost:9944").unwrap(),
        }
    }

    fn time(block: u64) -> Input {
        Input::ChainTime(ChainTime {
            block,
            timestamp: block * 12_000,
        })
    }

    /// A chain with pools `{ring: 10000, kton: 5000}` at block 1000.
    fn chain() -> MockChainClient {
        let client = MockChainClient::new();
        client.set(Topic::ChainTime, time(1000));
        client.set(Topic::RingPool, Input::RingPool(Balance::from(10_000)));
        client.set(Topic::KtonPool, Input::KtonPool(Balance::from(5000)));
        client.set(Topic::SessionValidators, Input::SessionValidators(vec![]));
        client.set(Topic::Commissions, Input::Commissions(Default::default()));
        client.set(Topic::Exposures, Input::Exposures(Default::default()));
        client.set(Topic::Nominations, Input::Nominations(vec![]));
        client.set(Topic::RewardPoints, Input::RewardPoints(Default::default()));
        client
    }

    fn ring_ledger(ring: u64) -> Input {
        Input::Ledger(Some(StakingLedger {
            staked_ring: Balance::from(ring),
            ..Default::default()
        }))
    }

    /// Poll the state until the predicate is satisfied.
    async fn wait_until(
        context: &StakingContext,
        p: impl Fn(&State) -> bool,
    ) -> RwLockReadGuard<'_, State> {
        for _ in 0..500 {
            let state = context.read().await;
            if p(&state) {
                return state;
            }
            drop(state);
            sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for state");
    }

    #[test_log::test(tokio::test(flavor = "multi_thread"))]
    async fn test_account_view() {
        let client = chain();
        client.set(Topic::Ledger(address(1)), ring_ledger(1000));
        client.set(Topic::Deposits(address(1)), Input::Deposits(None));

        let mut context = StakingContext::new(ChainConfig::default());
        context.connect(&client, target(address(1))).await;
        assert_eq!(context.topics().count(), 10);

        let state = wait_until(&context, State::account_ready).await;
        let account = state.account().unwrap();
        assert_eq!(account.address, address(1));
        assert_eq!(account.distribution.ring.bonded, Balance::from(1000));
        assert_eq!(account.power, Power::from(50_000_000));
        assert_eq!(account.time.block, 1000);
        assert!(account.deposits.is_empty());
        assert_eq!(
            state.extra_power(Balance::from(10_000), Balance::ZERO),
            crate::calc::calc_power(
                Balance::from(10_000),
                Balance::ZERO,
                Balance::from(20_000),
                Balance::from(5000)
            ) - crate::calc::calc_power(
                Balance::ZERO,
                Balance::ZERO,
                Balance::from(10_000),
                Balance::from(5000)
            )
        );
        drop(state);

        context.disconnect().await;
    }

    #[test_log::test(tokio::test(flavor = "multi_thread"))]
    async fn test_deposits_and_rewards() {
        let client = chain();
        let principal = Balance::from(10_000 * UNIT);
        client.set(
            Topic::Deposits(address(1)),
            Input::Deposits(Some(vec![RawDeposit {
                id: 4,
                value: principal,
                start_time: 0,
                expired_time: 12 * crate::calc::MONTH_MILLIS,
                in_use: true,
            }])),
        );
        // The ledger references a second deposit that is not in the list.
        client.set(
            Topic::Ledger(address(1)),
            Input::Ledger(Some(StakingLedger {
                staked_deposits: [4, 5].into_iter().collect(),
                ..Default::default()
            })),
        );

        let mut context = StakingContext::new(ChainConfig::default());
        context.connect(&client, target(address(1))).await;
        {
            let state = wait_until(&context, State::account_ready).await;
            let deposit = state.deposit(4).unwrap();
            assert_eq!(deposit.owner, address(1));
            assert_eq!(deposit.reward, Balance::from(UNIT));
            assert_eq!(state.distribution().deposits.bonded, principal);
            assert_eq!(state.deposit(5).unwrap_err().kind(), ErrorKind::NotFound);
        }

        // The deposit list catches up.
        client.set(
            Topic::Deposits(address(1)),
            Input::Deposits(Some(vec![
                RawDeposit {
                    id: 4,
                    value: principal,
                    start_time: 0,
                    expired_time: 12 * crate::calc::MONTH_MILLIS,
                    in_use: true,
                },
                RawDeposit {
                    id: 5,
                    value: Balance::from(UNIT),
                    start_time: 0,
                    expired_time: 3 * crate::calc::MONTH_MILLIS,
                    in_use: true,
                },
            ])),
        );
        let state = wait_until(&context, |state| state.deposits().len() == 2).await;
        assert_eq!(
            state.distribution().deposits.bonded,
            principal + Balance::from(UNIT)
        );
    }

    #[test_log::test(tokio::test(flavor = "multi_thread"))]
    async fn test_unbonding_follows_blocks() {
        let client = chain();
        client.set(
            Topic::Ledger(address(1)),
            Input::Ledger(Some(StakingLedger {
                unstaking_ring: vec![Unbonding {
                    amount: Balance::from(7),
                    target_block: 1100,
                }],
                ..Default::default()
            })),
        );
        client.set(Topic::Deposits(address(1)), Input::Deposits(None));

        let mut context = StakingContext::new(ChainConfig::default());
        let before = now_millis();
        context.connect(&client, target(address(1))).await;
        {
            let state = wait_until(&context, State::account_ready).await;
            let account = state.account().unwrap();
            let entry = account.distribution.ring.unbonding[0];
            assert!(!entry.is_expired);
            assert!(account.projected_at >= before);
            assert!(account.projected_at <= now_millis());
            assert_eq!(entry.expired_timestamp, account.projected_at + 1_200_000);
        }

        client.set(Topic::ChainTime, time(1100));
        let state = wait_until(&context, |state| state.time().block == 1100).await;
        let entry = state.distribution().ring.unbonding[0];
        assert!(entry.is_expired);
        assert_eq!(state.distribution().ring.releasable(), Balance::from(7));
    }

    #[test_log::test(tokio::test(flavor = "multi_thread"))]
    async fn test_collator_view() {
        let client = chain();
        client.set(
            Topic::SessionValidators,
            Input::SessionValidators(vec![address(10)]),
        );
        client.set(
            Topic::Commissions,
            Input::Commissions(
                [
                    (address(10), Commission::from_percent(5)),
                    (address(11), "10.00%".parse().unwrap()),
                ]
                .into_iter()
                .collect(),
            ),
        );
        client.set(
            Topic::Exposures,
            Input::Exposures(
                [(
                    address(10),
                    Exposure {
                        total: Power::from(500_000),
                        own: Power::ZERO,
                        others: vec![IndividualExposure {
                            who: address(1),
                            value: Power::from(500_000),
                        }],
                    },
                )]
                .into_iter()
                .collect(),
            ),
        );
        client.set(
            Topic::Nominations,
            Input::Nominations(vec![Nomination {
                nominator: address(2),
                collator: address(11),
                ledger: Some(StakingLedger {
                    staked_ring: Balance::from(2000),
                    ..Default::default()
                }),
                deposits: vec![],
            }]),
        );
        client.set(
            Topic::RewardPoints,
            Input::RewardPoints([(address(10), 30)].into_iter().collect()),
        );

        let mut context = StakingContext::new(ChainConfig::default());
        context.connect(&client, target(address(1))).await;
        let state = wait_until(&context, |state| {
            state.collators_ready() && state.collators().len() == 2
        })
        .await;

        let active = state.collator(address(10)).unwrap();
        assert_eq!(active.total_staked_power, Power::from(500_000));
        assert_eq!(active.power_source, PowerSource::Exposure);
        assert_eq!(active.last_session_blocks, 30);
        assert!(active.is_active);

        let waiting = state.collator(address(11)).unwrap();
        assert_eq!(waiting.total_staked_power, Power::from(90_000_000));
        assert_eq!(waiting.power_source, PowerSource::Estimate);
        assert!(!waiting.is_active);

        let err = state.collator(address(12)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let snapshot = state.collator_snapshot().unwrap();
        assert_eq!(snapshot.collators.len(), 2);
        assert_eq!(snapshot.pool, Pool::new(Balance::from(10_000), Balance::from(5000)));

        let metrics = state.metrics().export().unwrap();
        assert!(metrics.contains("collator_count 2"), "{metrics}");
        assert!(metrics.contains("active_collators 1"), "{metrics}");
    }

    #[test_log::test(tokio::test(flavor = "multi_thread"))]
    async fn test_errors_keep_last_value() {
        let client = chain();
        let mut context = StakingContext::new(ChainConfig::default());
        context.connect(&client, target(address(1))).await;
        wait_until(&context, |state| state.is_initialized(InputKind::RingPool)).await;

        client.fail(Topic::RingPool, Error::internal().context("connection reset"));
        client.fail(Topic::Ledger(address(1)), Error::internal());
        sleep(Duration::from_millis(100)).await;
        {
            let state = context.read().await;
            assert!(state.is_initialized(InputKind::RingPool));
            assert!(!state.is_initialized(InputKind::Ledger));
            assert_eq!(state.pool().ring, Balance::from(10_000));
        }

        // The subscription keeps going after an error.
        client.set(Topic::RingPool, Input::RingPool(Balance::from(20_000)));
        wait_until(&context, |state| state.pool().ring == Balance::from(20_000)).await;
    }

    #[test_log::test(tokio::test(flavor = "multi_thread"))]
    async fn test_reconnect_tears_down() {
        let client = chain();
        client.set(Topic::Ledger(address(1)), ring_ledger(1000));
        client.set(Topic::Ledger(address(2)), ring_ledger(3000));
        client.set(Topic::Deposits(address(1)), Input::Deposits(None));
        client.set(Topic::Deposits(address(2)), Input::Deposits(None));

        let mut context = StakingContext::new(ChainConfig::default());
        let first = context.connect(&client, target(address(1))).await;
        wait_until(&context, State::account_ready).await;
        assert_eq!(client.total_open_subscriptions(), 10);

        let second = context.connect(&client, target(address(2))).await;
        assert!(second > first);
        // The old subscriptions are closed before any new one is made.
        assert_eq!(client.open_subscriptions(Topic::Ledger(address(1))), 0);
        assert_eq!(client.open_subscriptions(Topic::Ledger(address(2))), 1);
        assert_eq!(client.total_open_subscriptions(), 10);
        assert_eq!(client.subscription_count(Topic::ChainTime), 2);

        // Updates for the old account go nowhere.
        client.set(Topic::Ledger(address(1)), ring_ledger(9999));
        let state = wait_until(&context, State::account_ready).await;
        assert_eq!(state.generation(), second);
        assert_eq!(state.account().unwrap().address, address(2));
        assert_eq!(state.distribution().ring.bonded, Balance::from(3000));
        drop(state);

        context.disconnect().await;
        assert_eq!(client.total_open_subscriptions(), 0);
        assert_eq!(context.topics().count(), 0);
        let state = context.read().await;
        assert_eq!(
            state.account().unwrap_err().kind(),
            ErrorKind::NotInitialized
        );
        assert_eq!(
            state.collator_snapshot().unwrap_err().kind(),
            ErrorKind::NotInitialized
        );
        assert!(!state.is_initialized(InputKind::ChainTime));
    }

    #[test]
    fn test_stale_generation_is_dropped() {
        let mut state = State::new(ChainConfig::default(), PrometheusMetrics::default());
        assert!(!state.apply(0, ring_ledger(1), NOW));

        let old = state.reset(Some(target(address(1))));
        assert!(state.apply(old, ring_ledger(1000), NOW));
        assert_eq!(state.distribution().ring.bonded, Balance::from(1000));

        let new = state.reset(Some(target(address(2))));
        assert_ne!(old, new);
        assert!(!state.apply(old, ring_ledger(5), NOW));
        assert_eq!(state.distribution().ring.bonded, Balance::ZERO);
        assert!(!state.is_initialized(InputKind::Ledger));
        assert_eq!(state.metrics().stale_inputs.get(), 2);

        assert!(state.apply(new, ring_ledger(7), NOW));
        assert_eq!(state.distribution().ring.bonded, Balance::from(7));
        assert_eq!(state.account().unwrap().projected_at, NOW);
    }

    #[test]
    fn test_never_staked() {
        let mut state = State::new(ChainConfig::default(), PrometheusMetrics::default());
        let generation = state.reset(Some(target(address(1))));
        state.apply(generation, ring_ledger(1000), NOW);
        state.apply(
            generation,
            Input::Deposits(Some(vec![RawDeposit {
                id: 1,
                value: Balance::from(UNIT),
                start_time: 0,
                expired_time: crate::calc::MONTH_MILLIS,
                in_use: false,
            }])),
            NOW,
        );
        state.apply(generation, Input::Ledger(None), NOW);

        // The ledger is gone but the deposits are still listed.
        assert!(state.is_initialized(InputKind::Ledger));
        assert_eq!(*state.distribution(), AssetDistribution::empty());
        assert_eq!(state.deposits().len(), 1);
        assert_eq!(state.power(), Power::ZERO);
    }
}
