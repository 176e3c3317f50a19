//! # Courier Telemetry
//!
//! Observability for an assembled bus.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` setup plus [`TracingLoggerFactory`],
//!   the bus `LoggerFactory` backed by `tracing`
//! - **Metrics**: [`PrometheusMonitor`], the bus `MessageMonitor` backed by
//!   an owned Prometheus registry
//!
//! ## Usage
//!
//! ```rust,ignore
//! use courier_telemetry::{init_logging, PrometheusMonitor, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_logging(&config)?;
//! let monitor = PrometheusMonitor::from_config(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `courier` | Service name |
//! | `COURIER_LOG_LEVEL` | `info` | Log filter (falls back to `RUST_LOG`) |
//! | `COURIER_JSON_LOGS` | `false` | JSON output (`true` inside containers) |
//! | `COURIER_METRICS_NAMESPACE` | `courier` | Metric name prefix |

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::{init_logging, TracingLoggerFactory};
pub use metrics::PrometheusMonitor;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
