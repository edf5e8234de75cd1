//! Prometheus metrics for the staking power service.

use prometheus::{Encoder, Gauge, IntCounter, Opts, Registry, TextEncoder};

use crate::types::common::{Balance, UNIT};

/// Prometheus metrics for the staking power service.
#[derive(Clone, Debug)]
pub struct PrometheusMetrics {
    registry: Registry,

    // Chain metrics
    /// The latest block number observed.
    pub latest_block: Gauge,
    /// Total RING bonded across the network, in RING.
    pub ring_pool: Gauge,
    /// Total KTON bonded across the network, in KTON.
    pub kton_pool: Gauge,

    // Derived metrics
    /// Power of the connected account.
    pub account_power: Gauge,
    /// Number of collators in the collator set.
    pub collator_count: Gauge,
    /// Number of collators in the current session.
    pub active_collators: Gauge,
    /// Inputs dropped because they belonged to an earlier connection.
    pub stale_inputs: IntCounter,
}

impl Default for PrometheusMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn gauge(registry: &Registry, name: &str, help: &str) -> Gauge {
    let gauge = Gauge::with_opts(Opts::new(name, help))
        .unwrap_or_else(|err| panic!("failed to create {name} gauge: {err}"));
    registry
        .register(Box::new(gauge.clone()))
        .unwrap_or_else(|err| panic!("failed to register {name} gauge: {err}"));
    gauge
}

impl PrometheusMetrics {
    /// Create a new metrics instance with all gauges registered.
    pub fn new() -> Self {
        let registry = Registry::new();

        let latest_block = gauge(
            &registry,
            "latest_block",
            "The latest block number that has been observed",
        );
        let ring_pool = gauge(&registry, "ring_pool", "Total RING bonded across the network");
        let kton_pool = gauge(&registry, "kton_pool", "Total KTON bonded across the network");
        let account_power = gauge(&registry, "account_power", "Power of the connected account");
        let collator_count = gauge(
            &registry,
            "collator_count",
            "Number of collators in the collator set",
        );
        let active_collators = gauge(
            &registry,
            "active_collators",
            "Number of collators in the current session",
        );

        let stale_inputs = IntCounter::with_opts(Opts::new(
            "stale_inputs",
            "Inputs dropped because they belonged to an earlier connection",
        ))
        .expect("failed to create stale_inputs counter");
        registry
            .register(Box::new(stale_inputs.clone()))
            .expect("failed to register stale_inputs counter");

        Self {
            registry,
            latest_block,
            ring_pool,
            kton_pool,
            account_power,
            collator_count,
            active_collators,
            stale_inputs,
        }
    }

    /// Render all metrics in the Prometheus text format.
    pub fn export(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = vec![];
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|err| {
            prometheus::Error::Msg(format!("metrics output is not valid UTF-8: {err}"))
        })
    }
}

/// Approximate a wei amount in whole tokens, for display.
pub fn tokens(amount: Balance) -> f64 {
    approximate(amount) / UNIT as f64
}

/// Approximate a 256-bit integer as a float.
pub fn approximate(value: Balance) -> f64 {
    value
        .as_limbs()
        .iter()
        .rev()
        .fold(0.0, |acc, limb| acc * 2f64.powi(64) + *limb as f64)
}
