//! Fallback implementations that do nothing observable.

use std::sync::Arc;
use std::time::Duration;

use crate::message::MessageType;
use crate::ports::{LogLevel, Logger, LoggerFactory, MessageMonitor, NamingStrategy};

/// Resource names are the lower-cased short type name.
///
/// `OrderPlaced` is consumed from queue `orderplaced` and published to
/// topic `orderplaced`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultNamingStrategy;

impl NamingStrategy for DefaultNamingStrategy {
    fn queue_name(&self, message_type: &MessageType) -> String {
        message_type.short_name().to_lowercase()
    }

    fn topic_name(&self, message_type: &MessageType) -> String {
        message_type.short_name().to_lowercase()
    }
}

/// Monitor that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpMonitor;

impl MessageMonitor for NoOpMonitor {
    fn consumer_registered(&self, _message_type: &str, _queue: &str) {}
    fn handler_executed(&self, _message_type: &str, _duration: Duration) {}
    fn handler_failed(&self, _message_type: &str) {}
    fn message_lock_contended(&self, _message_type: &str) {}
}

/// Logger factory whose loggers discard everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpLoggerFactory;

struct NoOpLogger;

impl Logger for NoOpLogger {
    fn log(&self, _level: LogLevel, _message: &str) {}
}

impl LoggerFactory for NoOpLoggerFactory {
    fn create_logger(&self, _category: &str) -> Arc<dyn Logger> {
        Arc::new(NoOpLogger)
    }
}
