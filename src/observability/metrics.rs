use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry};
use tracing::info;
use std::sync::Arc;
use tokio::sync::OnceCell;


// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE.get_or_init(|| async {
        info!("Initializing Metrics ...");
        Metrics::new()}
    ).await
}


#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Token resolution
    pub token_lookups: IntCounterVec,
    pub token_expiry_unix: IntGaugeVec,

    // Issuer metrics
    pub issuance_requests: IntCounterVec,
    pub issuance_failures: IntCounterVec,
    pub issuance_duration: HistogramVec,
    pub persist_failures: IntCounterVec,

    // Resource API metrics
    pub api_requests: IntCounterVec,
    pub api_auth_retries: IntCounterVec,

    // Config/runtime
    pub config_validation_errors: IntCounter,
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("magentotokenagent".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Token resolution
            token_lookups: IntCounterVec::new(Opts::new("token_lookups_total", "Token resolutions by outcome"),&["service", "outcome"],).unwrap(),
            token_expiry_unix: IntGaugeVec::new(Opts::new("token_expiry_unix_seconds", "Cached token expiry timestamp"),&["service"],).unwrap(),

            // Issuer
            issuance_requests: IntCounterVec::new(Opts::new("token_issuance_requests_total","Total token issuance attempts",),&["service"],).unwrap(),
            issuance_failures: IntCounterVec::new(Opts::new("token_issuance_failures_total", "Token issuance failures by reason"),&["service", "reason"],).unwrap(),
            issuance_duration: HistogramVec::new(HistogramOpts::new("token_issuance_duration_seconds", "Token issuance duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),&["service"],).unwrap(),
            persist_failures: IntCounterVec::new(Opts::new("token_persist_failures_total", "Issued tokens that could not be stored"),&["service"],).unwrap(),

            // Resource API
            api_requests: IntCounterVec::new(Opts::new("api_requests_total", "Resource API requests by method and status"),&["method", "status"],).unwrap(),
            api_auth_retries: IntCounterVec::new(Opts::new("api_auth_retries_total", "Forced reissue after 401"),&["service"],).unwrap(),

            // Config/runtime
            config_validation_errors: IntCounter::new("config_validation_errors_total","Validation errors during startup",).unwrap(),
            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.token_lookups.clone())).unwrap();
        reg.register(Box::new(metrics.token_expiry_unix.clone())).unwrap();
        reg.register(Box::new(metrics.issuance_requests.clone())).unwrap();
        reg.register(Box::new(metrics.issuance_failures.clone())).unwrap();
        reg.register(Box::new(metrics.issuance_duration.clone())).unwrap();
        reg.register(Box::new(metrics.persist_failures.clone())).unwrap();
        reg.register(Box::new(metrics.api_requests.clone())).unwrap();
        reg.register(Box::new(metrics.api_auth_retries.clone())).unwrap();
        reg.register(Box::new(metrics.config_validation_errors.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics
    }
}
