//! Configuration options for the chain client.

use clap::Parser;
use url::Url;

use crate::{
    context::Target,
    types::common::{Address, Balance, UNIT},
};

const DEFAULT_RPC: &str = "ws://127.0.0.1:9944";

/// Configuration for a chain connection.
#[derive(Clone, Debug, Parser)]
pub struct ChainOptions {
    /// Name of the chain to connect to.
    #[clap(long, env = "STAKING_POWER_SERVICE_CHAIN", default_value = "local")]
    pub chain: String,

    /// RPC endpoint of the chain.
    #[clap(long, env = "STAKING_POWER_SERVICE_RPC", default_value = DEFAULT_RPC)]
    pub rpc: Url,

    /// Expected block time, used to estimate when unbonding amounts are released.
    #[clap(
        long,
        env = "STAKING_POWER_SERVICE_SECONDS_PER_BLOCK",
        default_value = "12"
    )]
    pub seconds_per_block: u64,

    /// Smallest amount of RING that can be locked in a new deposit, in wei.
    #[clap(
        long,
        env = "STAKING_POWER_SERVICE_MIN_LOCKING_AMOUNT",
        default_value = "1000000000000000000"
    )]
    pub min_locking_amount: Balance,
}

impl Default for ChainOptions {
    fn default() -> Self {
        Self {
            chain: "local".into(),
            rpc: Url::parse(DEFAULT_RPC).expect("default RPC endpoint is a valid URL"),
            seconds_per_block: 12,
            min_locking_amount: Balance::from(UNIT),
        }
    }
}

impl ChainOptions {
    /// The chain parameters the derived state is computed with.
    pub fn config(&self) -> ChainConfig {
        ChainConfig {
            chain: self.chain.clone(),
            seconds_per_block: self.seconds_per_block,
            min_locking_amount: self.min_locking_amount,
        }
    }

    /// A connection target for `account` on the configured chain.
    pub fn target(&self, account: Address) -> Target {
        Target {
            account,
            chain: self.chain.clone(),
            endpoint: self.rpc.clone(),
        }
    }
}

/// Static parameters of a chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainConfig {
    pub chain: String,
    pub seconds_per_block: u64,
    pub min_locking_amount: Balance,
}

impl Default for ChainConfig {
    fn default() -> Self {
        ChainOptions::default().config()
    }
}

impl ChainConfig {
    /// Whether `amount` is enough to open a new deposit.
    pub fn meets_min_locking(&self, amount: Balance) -> bool {
        amount >= self.min_locking_amount
    }
}
