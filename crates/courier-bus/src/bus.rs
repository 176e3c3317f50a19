//! # Message Bus Core
//!
//! Owns the validated messaging configuration, the serialization register
//! and the consumers bound so far. Optional collaborators (monitor, message
//! lock) are attached by the [`crate::BusConfigurator`].

use std::sync::Arc;

use tracing::info;

use crate::config::MessagingConfig;
use crate::consumer::Consumer;
use crate::error::BusError;
use crate::ports::{Logger, LoggerFactory, MessageLock, MessageMonitor, SerializationRegister};

/// Logger category used by the bus core.
pub const BUS_LOG_CATEGORY: &str = "courier.bus";

pub struct MessageBus {
    config: MessagingConfig,
    serialization_register: Arc<dyn SerializationRegister>,
    logger: Arc<dyn Logger>,
    consumers: Vec<Consumer>,
    monitor: Option<Arc<dyn MessageMonitor>>,
    message_lock: Option<Arc<dyn MessageLock>>,
}

impl MessageBus {
    /// Create a bus core.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Config`] when `config` does not validate.
    pub fn new(
        config: MessagingConfig,
        serialization_register: Arc<dyn SerializationRegister>,
        logger_factory: &dyn LoggerFactory,
    ) -> Result<Self, BusError> {
        config.validate()?;
        let logger = logger_factory.create_logger(BUS_LOG_CATEGORY);
        logger.debug(&format!("Bus core created for region {}", config.region));
        info!(region = %config.region, "[Bus] Core created");

        Ok(Self {
            config,
            serialization_register,
            logger,
            consumers: Vec::new(),
            monitor: None,
            message_lock: None,
        })
    }

    #[must_use]
    pub fn config(&self) -> &MessagingConfig {
        &self.config
    }

    #[must_use]
    pub fn serialization_register(&self) -> &Arc<dyn SerializationRegister> {
        &self.serialization_register
    }

    /// Consumers in the order they were bound.
    #[must_use]
    pub fn consumers(&self) -> &[Consumer] {
        &self.consumers
    }

    #[must_use]
    pub fn monitor(&self) -> Option<&Arc<dyn MessageMonitor>> {
        self.monitor.as_ref()
    }

    #[must_use]
    pub fn message_lock(&self) -> Option<&Arc<dyn MessageLock>> {
        self.message_lock.as_ref()
    }

    pub(crate) fn set_monitor(&mut self, monitor: Arc<dyn MessageMonitor>) {
        self.monitor = Some(monitor);
    }

    pub(crate) fn set_message_lock(&mut self, lock: Arc<dyn MessageLock>) {
        self.message_lock = Some(lock);
    }

    /// Queue already bound to another consumer, if any.
    pub(crate) fn ensure_queue_free(&self, queue: &str) -> Result<(), BusError> {
        match self.consumers.iter().find(|c| c.queue_name() == queue) {
            Some(existing) => Err(BusError::DuplicateQueue {
                queue: queue.to_string(),
                existing: existing.message_type().to_string(),
            }),
            None => Ok(()),
        }
    }

    pub(crate) fn push_consumer(&mut self, consumer: Consumer) {
        self.logger.info(&format!(
            "Consumer for {} bound to queue {}",
            consumer.message_type(),
            consumer.queue_name()
        ));
        self.consumers.push(consumer);
    }
}

impl std::fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageBus")
            .field("config", &self.config)
            .field("consumers", &self.consumers)
            .field("has_monitor", &self.monitor.is_some())
            .field("has_message_lock", &self.message_lock.is_some())
            .finish_non_exhaustive()
    }
}
