use std::{path::PathBuf, process::exit, time::Duration};

use clap::Parser;
use serde::Serialize;
use staking_power_service::{
    Error, Result,
    context::{State, StakingContext},
    input::chain::{options::ChainOptions, replay::ReplayClient},
    types::{account::AccountSnapshot, common::Address, global::CollatorSetSnapshot},
};
use tokio::time::{sleep, timeout};
use tracing_subscriber::EnvFilter;

/// Derive the staking view of an account from recorded chain state.
#[derive(Debug, Parser)]
struct Options {
    /// Chain options.
    #[clap(flatten)]
    chain: ChainOptions,

    /// The account to derive the view for.
    #[clap(long, env = "STAKING_POWER_SERVICE_ACCOUNT")]
    account: Address,

    /// JSON snapshot of chain state to replay.
    #[clap(long, env = "STAKING_POWER_SERVICE_REPLAY")]
    replay: PathBuf,

    /// Give up if the view is not complete after this many seconds.
    #[clap(long, env = "STAKING_POWER_SERVICE_TIMEOUT", default_value = "10")]
    timeout_secs: u64,

    /// Also print metrics in the Prometheus text format.
    #[clap(long)]
    metrics: bool,
}

#[derive(Serialize)]
struct View {
    account: AccountSnapshot,
    collators: CollatorSetSnapshot,
}

impl Options {
    async fn run(self) -> Result<()> {
        let client = ReplayClient::load(&self.replay)?;
        let mut context = StakingContext::new(self.chain.config());
        context
            .connect(&client, self.chain.target(self.account))
            .await;

        let ready = |state: &State| state.account_ready() && state.collators_ready();
        timeout(Duration::from_secs(self.timeout_secs), async {
            while !ready(&*context.read().await) {
                sleep(Duration::from_millis(100)).await;
            }
        })
        .await
        .map_err(|_| Error::internal().context("timed out waiting for chain state"))?;

        {
            let state = context.read().await;
            let view = View {
                account: state.account()?,
                collators: state.collator_snapshot()?,
            };
            println!("{}", serde_json::to_string_pretty(&view)?);
            if self.metrics {
                let metrics = state
                    .metrics()
                    .export()
                    .map_err(|err| Error::internal().context(err))?;
                print!("{metrics}");
            }
        }

        context.disconnect().await;
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opt = Options::parse();
    if let Err(err) = opt.run().await {
        eprintln!("service failed: {err:#}");
        exit(1);
    }
}
