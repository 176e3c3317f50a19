//! Logging and monitoring ports.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// A logging sink bound to one category.
pub trait Logger: Send + Sync {
    /// Emit a record.
    fn log(&self, level: LogLevel, message: &str);

    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }
}

/// Produces category-scoped loggers.
///
/// Must be available before the bus core is constructed; every component
/// built afterwards takes its diagnostic output from here.
pub trait LoggerFactory: Send + Sync {
    fn create_logger(&self, category: &str) -> Arc<dyn Logger>;
}

/// Observability sink for message handling.
pub trait MessageMonitor: Send + Sync {
    /// A consumer was bound to the bus.
    fn consumer_registered(&self, message_type: &str, queue: &str);

    /// A handler completed successfully.
    fn handler_executed(&self, message_type: &str, duration: Duration);

    /// A handler returned an error.
    fn handler_failed(&self, message_type: &str);

    /// A message was skipped because another delivery holds its lock.
    fn message_lock_contended(&self, message_type: &str);
}
