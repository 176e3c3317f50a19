//! Prometheus metrics for message handling.
//!
//! All metrics follow the naming convention: `<namespace>_<metric>_<unit>`
//!
//! ## Metrics
//!
//! - `consumers_registered_total{message_type, queue}`: consumers bound at assembly
//! - `handler_executions_total{message_type, outcome}`: outcome is `success` or `failure`
//! - `handler_duration_seconds{message_type}`: successful handler run time
//! - `message_lock_contentions_total{message_type}`: deliveries skipped under a held lock

use std::time::Duration;

use courier_bus::ports::MessageMonitor;
use prometheus::{
    exponential_buckets, CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};

use crate::{TelemetryConfig, TelemetryError};

/// `MessageMonitor` recording into an owned Prometheus registry.
#[derive(Clone)]
pub struct PrometheusMonitor {
    registry: Registry,
    consumers_registered: CounterVec,
    handler_executions: CounterVec,
    handler_duration: HistogramVec,
    lock_contentions: CounterVec,
}

impl PrometheusMonitor {
    /// Create the monitor and register its metrics under `namespace`.
    pub fn new(namespace: &str) -> Result<Self, TelemetryError> {
        let registry = Registry::new();

        let consumers_registered = CounterVec::new(
            Opts::new("consumers_registered_total", "Consumers bound to the bus")
                .namespace(namespace),
            &["message_type", "queue"],
        )
        .map_err(metrics_error)?;

        let handler_executions = CounterVec::new(
            Opts::new("handler_executions_total", "Handler invocations by outcome")
                .namespace(namespace),
            &["message_type", "outcome"],
        )
        .map_err(metrics_error)?;

        let buckets = exponential_buckets(0.0005, 2.0, 14).map_err(metrics_error)?;
        let handler_duration = HistogramVec::new(
            HistogramOpts::new("handler_duration_seconds", "Time spent in successful handlers")
                .namespace(namespace)
                .buckets(buckets),
            &["message_type"],
        )
        .map_err(metrics_error)?;

        let lock_contentions = CounterVec::new(
            Opts::new(
                "message_lock_contentions_total",
                "Deliveries skipped because the message lock was held",
            )
            .namespace(namespace),
            &["message_type"],
        )
        .map_err(metrics_error)?;

        registry
            .register(Box::new(consumers_registered.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(handler_executions.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(handler_duration.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(lock_contentions.clone()))
            .map_err(metrics_error)?;

        Ok(Self {
            registry,
            consumers_registered,
            handler_executions,
            handler_duration,
            lock_contentions,
        })
    }

    /// Monitor using the configured metrics namespace.
    pub fn from_config(config: &TelemetryConfig) -> Result<Self, TelemetryError> {
        Self::new(&config.metrics_namespace)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encode all metrics as Prometheus text format.
    pub fn encode(&self) -> Result<String, TelemetryError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(metrics_error)?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
    }
}

impl MessageMonitor for PrometheusMonitor {
    fn consumer_registered(&self, message_type: &str, queue: &str) {
        self.consumers_registered
            .with_label_values(&[message_type, queue])
            .inc();
    }

    fn handler_executed(&self, message_type: &str, duration: Duration) {
        self.handler_executions
            .with_label_values(&[message_type, "success"])
            .inc();
        self.handler_duration
            .with_label_values(&[message_type])
            .observe(duration.as_secs_f64());
    }

    fn handler_failed(&self, message_type: &str) {
        self.handler_executions
            .with_label_values(&[message_type, "failure"])
            .inc();
    }

    fn message_lock_contended(&self, message_type: &str) {
        self.lock_contentions.with_label_values(&[message_type]).inc();
    }
}

fn metrics_error(e: prometheus::Error) -> TelemetryError {
    TelemetryError::MetricsInit(e.to_string())
}
