use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};
use tokio::sync::OnceCell;
use tracing::info;

use crate::utils::constants::METRICS_NAMESPACE;


// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Metrics> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> Result<&'static Metrics, prometheus::Error> {
    METRICS_INSTANCE
        .get_or_try_init(|| async {
            info!("Initializing Metrics ...");
            Metrics::new()
        })
        .await
}


#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Renewal metrics
    pub token_requests: IntCounterVec,
    pub token_request_failures: IntCounterVec,
    pub token_request_duration: HistogramVec,

    // Cache metrics
    pub token_reuse: IntCounterVec,
    pub token_expiry_unix: IntGaugeVec,
}

impl Metrics {
    fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some(METRICS_NAMESPACE.into()), None)?;

        let metrics = Self {
            // Renewal
            token_requests: IntCounterVec::new(Opts::new("token_requests_total", "Total token requests sent to the authority"), &["kind"])?,
            token_request_failures: IntCounterVec::new(Opts::new("token_request_failures_total", "Token requests that failed"), &["kind"])?,
            token_request_duration: HistogramVec::new(HistogramOpts::new("token_request_duration_seconds", "Token request duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]), &["kind"])?,

            // Cache
            token_reuse: IntCounterVec::new(Opts::new("token_reuse_total", "Calls answered from the cached token"), &["kind"])?,
            token_expiry_unix: IntGaugeVec::new(Opts::new("token_expiry_unix_seconds", "Expiry timestamp of the cached token"), &["kind"])?,

            registry,
        };

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.token_requests.clone()))?;
        reg.register(Box::new(metrics.token_request_failures.clone()))?;
        reg.register(Box::new(metrics.token_request_duration.clone()))?;
        reg.register(Box::new(metrics.token_reuse.clone()))?;
        reg.register(Box::new(metrics.token_expiry_unix.clone()))?;

        Ok(metrics)
    }

    /// Renders the registry in the Prometheus text exposition format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
