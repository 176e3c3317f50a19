//! Cross-cutting service overrides.

use std::sync::Arc;

use courier_bus::ports::{
    HandlerResolver, LoggerFactory, MessageLock, MessageMonitor, NamingStrategy,
    SerializationFactory, SerializationRegister,
};

use crate::component::ComponentOverride;

/// Explicit factories for the bus's cross-cutting collaborators.
///
/// Every slot left unset is filled from the capability resolver at assembly
/// time. Setting a slot twice keeps the later factory.
#[derive(Debug, Default)]
pub struct ServicesBuilder {
    pub(crate) logger_factory: ComponentOverride<Arc<dyn LoggerFactory>>,
    pub(crate) monitor: ComponentOverride<Arc<dyn MessageMonitor>>,
    pub(crate) message_lock: ComponentOverride<Arc<dyn MessageLock>>,
    pub(crate) naming_strategy: ComponentOverride<Arc<dyn NamingStrategy>>,
    pub(crate) serialization_factory: ComponentOverride<Arc<dyn SerializationFactory>>,
    pub(crate) serialization_register: ComponentOverride<Arc<dyn SerializationRegister>>,
    pub(crate) handler_resolver: ComponentOverride<Arc<dyn HandlerResolver>>,
}

impl ServicesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_logger_factory<F>(&mut self, factory: F) -> &mut Self
    where
        F: FnOnce() -> Arc<dyn LoggerFactory> + Send + 'static,
    {
        self.logger_factory.set(factory);
        self
    }

    pub fn with_message_monitoring<F>(&mut self, factory: F) -> &mut Self
    where
        F: FnOnce() -> Arc<dyn MessageMonitor> + Send + 'static,
    {
        self.monitor.set(factory);
        self
    }

    pub fn with_message_lock<F>(&mut self, factory: F) -> &mut Self
    where
        F: FnOnce() -> Arc<dyn MessageLock> + Send + 'static,
    {
        self.message_lock.set(factory);
        self
    }

    pub fn with_naming_strategy<F>(&mut self, factory: F) -> &mut Self
    where
        F: FnOnce() -> Arc<dyn NamingStrategy> + Send + 'static,
    {
        self.naming_strategy.set(factory);
        self
    }

    pub fn with_serialization_factory<F>(&mut self, factory: F) -> &mut Self
    where
        F: FnOnce() -> Arc<dyn SerializationFactory> + Send + 'static,
    {
        self.serialization_factory.set(factory);
        self
    }

    pub fn with_serialization_register<F>(&mut self, factory: F) -> &mut Self
    where
        F: FnOnce() -> Arc<dyn SerializationRegister> + Send + 'static,
    {
        self.serialization_register.set(factory);
        self
    }

    /// Resolver used to find a handler for every subscription.
    pub fn with_handler_resolver<F>(&mut self, factory: F) -> &mut Self
    where
        F: FnOnce() -> Arc<dyn HandlerResolver> + Send + 'static,
    {
        self.handler_resolver.set(factory);
        self
    }

    /// Number of slots with an explicit factory.
    #[must_use]
    pub fn explicit_count(&self) -> usize {
        [
            self.logger_factory.is_explicit(),
            self.monitor.is_explicit(),
            self.message_lock.is_explicit(),
            self.naming_strategy.is_explicit(),
            self.serialization_factory.is_explicit(),
            self.serialization_register.is_explicit(),
            self.handler_resolver.is_explicit(),
        ]
        .into_iter()
        .filter(|explicit| *explicit)
        .count()
    }
}
