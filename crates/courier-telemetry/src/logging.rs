//! Structured logging.
//!
//! [`init_logging`] installs the global `tracing` subscriber. The
//! [`TracingLoggerFactory`] adapts the bus's `LoggerFactory` port onto the
//! same subscriber, so records from bus components carry a `category` field
//! next to everything else the process logs:
//!
//! ```json
//! {"level":"INFO","fields":{"category":"courier.bus","message":"Bus running"}}
//! ```

use std::sync::Arc;

use courier_bus::ports::{LogLevel, Logger, LoggerFactory};
use tracing_subscriber::EnvFilter;

use crate::{TelemetryConfig, TelemetryError};

/// Install the global subscriber.
///
/// Fails if the filter directive does not parse or a global subscriber is
/// already installed.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::Config(e.to_string()))?;

    let result = if config.json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .try_init()
    };
    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::debug!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Structured logging initialized"
    );
    Ok(())
}

/// `LoggerFactory` that forwards to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLoggerFactory;

impl LoggerFactory for TracingLoggerFactory {
    fn create_logger(&self, category: &str) -> Arc<dyn Logger> {
        Arc::new(TracingLogger {
            category: category.to_string(),
        })
    }
}

#[derive(Debug)]
struct TracingLogger {
    category: String,
}

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        let category = self.category.as_str();
        match level {
            LogLevel::Trace => tracing::trace!(category, "{message}"),
            LogLevel::Debug => tracing::debug!(category, "{message}"),
            LogLevel::Info => tracing::info!(category, "{message}"),
            LogLevel::Warn => tracing::warn!(category, "{message}"),
            LogLevel::Error => tracing::error!(category, "{message}"),
        }
    }
}
