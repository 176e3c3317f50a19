//! # Consumers
//!
//! A consumer is the runtime binding between one message type, the queue it
//! is read from and the handler that processes it. Consumers are created by
//! [`crate::BusConfigurator::add_consumer`] and owned by the bus.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::BusError;
use crate::message::MessageType;
use crate::ports::{MessageHandler, MessageLock, MessageMonitor, SerializationRegister};

/// Concurrent handler invocations per consumer when no hint is given.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Largest receive batch a transport accepts.
pub const MAX_PREFETCH: u32 = 10;

/// How long a delivery holds its message lock when no hint is given.
pub const DEFAULT_MESSAGE_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// How a consumer's queue is fed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubscriptionKind {
    /// Messages are sent straight to the queue.
    #[default]
    Queue,
    /// The queue is subscribed to a topic messages are published to.
    Topic,
}

/// Hints captured while a subscription is configured.
///
/// Every field is optional; unset fields fall back to the naming strategy or
/// the defaults above when the consumer is bound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionOptions {
    pub kind: SubscriptionKind,
    pub queue_name: Option<String>,
    pub topic_name: Option<String>,
    pub max_concurrency: Option<usize>,
    pub prefetch: Option<u32>,
    pub message_lock_timeout: Option<Duration>,
}

/// Everything needed to bind one subscription to the bus.
pub struct ConsumerBinding {
    pub message_type: MessageType,
    pub options: SubscriptionOptions,
    pub handler: Arc<dyn MessageHandler>,
}

/// Result of handing a delivery to a consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    /// The handler ran and succeeded.
    Handled,
    /// Another delivery of the same message holds the lock.
    Duplicate,
}

/// A message type bound to its queue and handler.
pub struct Consumer {
    message_type: MessageType,
    queue_name: String,
    topic_name: Option<String>,
    kind: SubscriptionKind,
    max_concurrency: usize,
    prefetch: u32,
    message_lock_timeout: Duration,
    handler: Arc<dyn MessageHandler>,
    serialization_register: Arc<dyn SerializationRegister>,
    monitor: Arc<dyn MessageMonitor>,
    message_lock: Option<Arc<dyn MessageLock>>,
}

/// Resolved naming and collaborators for [`Consumer::new`].
pub(crate) struct ConsumerParts {
    pub queue_name: String,
    pub topic_name: Option<String>,
    pub serialization_register: Arc<dyn SerializationRegister>,
    pub monitor: Arc<dyn MessageMonitor>,
    pub message_lock: Option<Arc<dyn MessageLock>>,
}

impl Consumer {
    pub(crate) fn new(binding: ConsumerBinding, parts: ConsumerParts) -> Self {
        let options = binding.options;
        Self {
            message_type: binding.message_type,
            queue_name: parts.queue_name,
            topic_name: parts.topic_name,
            kind: options.kind,
            max_concurrency: options.max_concurrency.unwrap_or(DEFAULT_MAX_CONCURRENCY),
            prefetch: options.prefetch.unwrap_or(MAX_PREFETCH),
            message_lock_timeout: options
                .message_lock_timeout
                .unwrap_or(DEFAULT_MESSAGE_LOCK_TIMEOUT),
            handler: binding.handler,
            serialization_register: parts.serialization_register,
            monitor: parts.monitor,
            message_lock: parts.message_lock,
        }
    }

    /// Short name of the consumed message type.
    #[must_use]
    pub fn message_type(&self) -> &'static str {
        self.message_type.short_name()
    }

    /// Tag of the consumed message type.
    #[must_use]
    pub fn tag(&self) -> MessageType {
        self.message_type
    }

    #[must_use]
    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// Topic the queue is subscribed to, for topic subscriptions.
    #[must_use]
    pub fn topic_name(&self) -> Option<&str> {
        self.topic_name.as_deref()
    }

    #[must_use]
    pub fn kind(&self) -> SubscriptionKind {
        self.kind
    }

    #[must_use]
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    #[must_use]
    pub fn prefetch(&self) -> u32 {
        self.prefetch
    }

    #[must_use]
    pub fn message_lock_timeout(&self) -> Duration {
        self.message_lock_timeout
    }

    /// Decode `body` and run the handler.
    ///
    /// With a message lock attached, a delivery whose lock is already held
    /// is reported as [`HandleOutcome::Duplicate`] without running the
    /// handler. A failed handler releases the lock so the message can be
    /// redelivered; a successful one keeps it until it expires.
    pub async fn handle(&self, message_id: &str, body: &str) -> Result<HandleOutcome, BusError> {
        let name = self.message_type.short_name();
        let serializer = self
            .serialization_register
            .serializer_for(&self.message_type)
            .ok_or_else(|| BusError::NoSerializer(self.message_type.full_name().to_string()))?;
        let payload = serializer.deserialize(body)?;

        let lock_key = format!("{}:{}", self.queue_name, message_id);
        if let Some(lock) = &self.message_lock {
            if !lock.try_acquire(&lock_key, self.message_lock_timeout) {
                debug!(queue = %self.queue_name, message_id, "Message lock held, skipping delivery");
                self.monitor.message_lock_contended(name);
                return Ok(HandleOutcome::Duplicate);
            }
        }

        let started = Instant::now();
        match self.handler.handle(payload).await {
            Ok(()) => {
                self.monitor
                    .handler_executed(name, started.elapsed());
                Ok(HandleOutcome::Handled)
            }
            Err(e) => {
                warn!(
                    queue = %self.queue_name,
                    message_id,
                    error = %e,
                    "Handler failed"
                );
                self.monitor.handler_failed(name);
                if let Some(lock) = &self.message_lock {
                    lock.release(&lock_key);
                }
                Err(e.into())
            }
        }
    }
}

impl std::fmt::Debug for Consumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Consumer")
            .field("message_type", &self.message_type.full_name())
            .field("queue_name", &self.queue_name)
            .field("topic_name", &self.topic_name)
            .field("kind", &self.kind)
            .field("max_concurrency", &self.max_concurrency)
            .field("prefetch", &self.prefetch)
            .finish_non_exhaustive()
    }
}
