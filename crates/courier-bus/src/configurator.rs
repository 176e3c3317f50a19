//! # Bus Configurator
//!
//! Fluent surface over a [`MessageBus`] core. Cross-cutting collaborators are
//! attached first, then consumers are bound one by one, then
//! [`BusConfigurator::build`] hands back the runtime [`AssembledBus`].

use std::sync::Arc;

use tracing::debug;

use crate::adapters::DefaultNamingStrategy;
use crate::bus::MessageBus;
use crate::consumer::{Consumer, ConsumerBinding, ConsumerParts, SubscriptionKind};
use crate::error::BusError;
use crate::ports::{
    Logger, LoggerFactory, MessageLock, MessageMonitor, NamingStrategy, SerializationFactory,
};
use crate::resources::{ClientFactoryProxy, QueueCreator};
use crate::runtime::{AssembledBus, RuntimeParts};

/// Logger category used by the configurator and the assembled bus.
pub const CONFIGURATOR_LOG_CATEGORY: &str = "courier.configurator";

pub struct BusConfigurator {
    bus: MessageBus,
    queue_creator: QueueCreator,
    logger: Arc<dyn Logger>,
    serialization_factory: Option<Arc<dyn SerializationFactory>>,
    monitor: Option<Arc<dyn MessageMonitor>>,
    naming_strategy: Arc<dyn NamingStrategy>,
}

impl BusConfigurator {
    pub fn new(
        bus: MessageBus,
        client: Arc<ClientFactoryProxy>,
        logger_factory: &dyn LoggerFactory,
    ) -> Self {
        Self {
            bus,
            queue_creator: QueueCreator::new(client, logger_factory),
            logger: logger_factory.create_logger(CONFIGURATOR_LOG_CATEGORY),
            serialization_factory: None,
            monitor: None,
            naming_strategy: Arc::new(DefaultNamingStrategy),
        }
    }

    pub fn with_serialization_factory(
        &mut self,
        factory: Arc<dyn SerializationFactory>,
    ) -> &mut Self {
        self.serialization_factory = Some(factory);
        self
    }

    pub fn with_monitoring(&mut self, monitor: Arc<dyn MessageMonitor>) -> &mut Self {
        self.bus.set_monitor(Arc::clone(&monitor));
        self.monitor = Some(monitor);
        self
    }

    /// Replace the default naming strategy.
    pub fn with_naming_strategy(&mut self, strategy: Arc<dyn NamingStrategy>) -> &mut Self {
        self.naming_strategy = strategy;
        self
    }

    pub fn with_message_lock(&mut self, lock: Arc<dyn MessageLock>) -> &mut Self {
        self.bus.set_message_lock(lock);
        self
    }

    #[must_use]
    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    /// Bind a consumer.
    ///
    /// Queue and topic names come from the subscription hints when set and
    /// from the naming strategy otherwise. A serializer for the message type
    /// is registered as a side effect.
    ///
    /// # Errors
    ///
    /// [`BusError::MissingComponent`] when the serialization factory or the
    /// monitor has not been attached, [`BusError::DuplicateQueue`] when the
    /// queue is already bound.
    pub fn add_consumer(&mut self, binding: ConsumerBinding) -> Result<&mut Self, BusError> {
        let factory = self
            .serialization_factory
            .clone()
            .ok_or(BusError::MissingComponent("serialization factory"))?;
        let monitor = self
            .monitor
            .clone()
            .ok_or(BusError::MissingComponent("message monitor"))?;

        let message_type = binding.message_type;
        let queue_name = binding
            .options
            .queue_name
            .clone()
            .unwrap_or_else(|| self.naming_strategy.queue_name(&message_type));
        let topic_name = match binding.options.kind {
            SubscriptionKind::Topic => Some(
                binding
                    .options
                    .topic_name
                    .clone()
                    .unwrap_or_else(|| self.naming_strategy.topic_name(&message_type)),
            ),
            SubscriptionKind::Queue => None,
        };

        self.bus.ensure_queue_free(&queue_name)?;

        let register = Arc::clone(self.bus.serialization_register());
        register.add_serializer(message_type, factory.create_serializer(&message_type));

        debug!(
            message_type = %message_type,
            queue = %queue_name,
            "[Configurator] Binding consumer"
        );
        monitor.consumer_registered(message_type.short_name(), &queue_name);

        let consumer = Consumer::new(
            binding,
            ConsumerParts {
                queue_name,
                topic_name,
                serialization_register: register,
                monitor,
                message_lock: self.bus.message_lock().cloned(),
            },
        );
        self.bus.push_consumer(consumer);
        Ok(self)
    }

    /// Finish configuration.
    ///
    /// # Errors
    ///
    /// [`BusError::MissingComponent`] when the serialization factory or the
    /// monitor has not been attached.
    pub fn build(self) -> Result<AssembledBus, BusError> {
        let serialization_factory = self
            .serialization_factory
            .ok_or(BusError::MissingComponent("serialization factory"))?;
        let monitor = self
            .monitor
            .ok_or(BusError::MissingComponent("message monitor"))?;

        self.logger.info(&format!(
            "Bus configured with {} consumer(s)",
            self.bus.consumers().len()
        ));

        Ok(AssembledBus::new(RuntimeParts {
            bus: self.bus,
            queue_creator: self.queue_creator,
            serialization_factory,
            monitor,
            naming_strategy: self.naming_strategy,
            logger: self.logger,
        }))
    }
}
