//! # Bus Assembler
//!
//! Turns builder configuration into an [`AssembledBus`].
//!
//! ## Stages
//!
//! ```text
//! Configuring → Validating → ResolvingComponents → ConstructingBus → ApplyingSubscriptions → Assembled
//! ```
//!
//! - **Validating**: the messaging configuration is built (or resolved) and
//!   validated before anything else is looked up.
//! - **ResolvingComponents**: override-or-resolve, in order: logger factory,
//!   serialization register, client factory, serialization factory, monitor,
//!   naming strategy, message lock. The last two are optional.
//! - **ConstructingBus**: bus core, client proxy and configurator.
//! - **ApplyingSubscriptions**: all-or-nothing handler binding.
//!
//! A failure at any stage aborts the assembly. No partially assembled bus is
//! ever returned.

use std::fmt;
use std::sync::Arc;

use courier_bus::ports::{
    LoggerFactory, MessageLock, MessageMonitor, NamingStrategy, SerializationFactory,
    SerializationRegister,
};
use courier_bus::{AssembledBus, BusConfigurator, ClientFactoryProxy, MessageBus, MessagingConfig};
use tracing::{debug, info, warn};

use crate::builders::{ClientBuilder, MessagingConfigBuilder, ServicesBuilder};
use crate::capability::{resolve_required, CapabilityResolver, NullCapabilityResolver};
use crate::error::AssemblyError;
use crate::subscriptions::SubscriptionsBuilder;

/// Where an assembly is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyStage {
    Configuring,
    Validating,
    ResolvingComponents,
    ConstructingBus,
    ApplyingSubscriptions,
    Assembled,
}

impl AssemblyStage {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Configuring => "configuring",
            Self::Validating => "validating",
            Self::ResolvingComponents => "resolving-components",
            Self::ConstructingBus => "constructing-bus",
            Self::ApplyingSubscriptions => "applying-subscriptions",
            Self::Assembled => "assembled",
        }
    }
}

impl fmt::Display for AssemblyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Components resolved before the bus is constructed.
struct ResolvedComponents {
    logger_factory: Arc<dyn LoggerFactory>,
    serialization_register: Arc<dyn SerializationRegister>,
    client: ClientFactoryProxy,
    serialization_factory: Arc<dyn SerializationFactory>,
    monitor: Arc<dyn MessageMonitor>,
    naming_strategy: Option<Arc<dyn NamingStrategy>>,
    message_lock: Option<Arc<dyn MessageLock>>,
}

/// Single-use builder for an [`AssembledBus`].
///
/// # Example
///
/// ```rust,ignore
/// let mut assembler = BusAssembler::new();
/// assembler
///     .with_service_resolver(Arc::new(CapabilityRegistry::with_defaults()))
///     .messaging(|m| {
///         m.with_region("eu-west-1")?;
///         Ok(())
///     })?
///     .client(|c| {
///         c.with_client_factory(|| Arc::new(InMemoryTransport::new()));
///         Ok(())
///     })?
///     .services(|s| {
///         s.with_handler_resolver(move || handlers);
///         Ok(())
///     })?
///     .subscriptions(|s| {
///         s.add_subscription::<OrderPlaced, _>(|_| Ok(()))?;
///         Ok(())
///     })?;
/// let bus = assembler.build()?;
/// ```
pub struct BusAssembler {
    client: Option<ClientBuilder>,
    messaging: Option<MessagingConfigBuilder>,
    subscriptions: Option<SubscriptionsBuilder>,
    services: ServicesBuilder,
    resolver: Arc<dyn CapabilityResolver>,
}

impl Default for BusAssembler {
    fn default() -> Self {
        Self {
            client: None,
            messaging: None,
            subscriptions: None,
            services: ServicesBuilder::default(),
            resolver: Arc::new(NullCapabilityResolver),
        }
    }
}

impl BusAssembler {
    /// Assembler with no configuration and a resolver that has nothing.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Configure entry points
    // =========================================================================

    /// Configure the transport client. Repeated calls share one builder.
    pub fn client<F>(&mut self, configure: F) -> Result<&mut Self, AssemblyError>
    where
        F: FnOnce(&mut ClientBuilder) -> Result<(), AssemblyError>,
    {
        configure(self.client.get_or_insert_with(ClientBuilder::default))?;
        Ok(self)
    }

    /// Configure messaging settings. Repeated calls share one builder.
    pub fn messaging<F>(&mut self, configure: F) -> Result<&mut Self, AssemblyError>
    where
        F: FnOnce(&mut MessagingConfigBuilder) -> Result<(), AssemblyError>,
    {
        configure(self.messaging.get_or_insert_with(MessagingConfigBuilder::default))?;
        Ok(self)
    }

    /// Configure subscriptions. Repeated calls append to one registry.
    pub fn subscriptions<F>(&mut self, configure: F) -> Result<&mut Self, AssemblyError>
    where
        F: FnOnce(&mut SubscriptionsBuilder) -> Result<(), AssemblyError>,
    {
        configure(self.subscriptions.get_or_insert_with(SubscriptionsBuilder::default))?;
        Ok(self)
    }

    /// Configure cross-cutting service overrides.
    pub fn services<F>(&mut self, configure: F) -> Result<&mut Self, AssemblyError>
    where
        F: FnOnce(&mut ServicesBuilder) -> Result<(), AssemblyError>,
    {
        configure(&mut self.services)?;
        Ok(self)
    }

    // =========================================================================
    // Value setters (last write wins)
    // =========================================================================

    pub fn with_client(&mut self, client: ClientBuilder) -> &mut Self {
        self.client = Some(client);
        self
    }

    /// Use `config` as the messaging configuration, replacing earlier settings.
    pub fn with_messaging(&mut self, config: MessagingConfig) -> &mut Self {
        self.messaging = Some(MessagingConfigBuilder::from_config(config));
        self
    }

    pub fn with_subscriptions(&mut self, subscriptions: SubscriptionsBuilder) -> &mut Self {
        self.subscriptions = Some(subscriptions);
        self
    }

    pub fn with_logger_factory<F>(&mut self, factory: F) -> &mut Self
    where
        F: FnOnce() -> Arc<dyn LoggerFactory> + Send + 'static,
    {
        self.services.with_logger_factory(factory);
        self
    }

    pub fn with_message_lock<F>(&mut self, factory: F) -> &mut Self
    where
        F: FnOnce() -> Arc<dyn MessageLock> + Send + 'static,
    {
        self.services.with_message_lock(factory);
        self
    }

    pub fn with_monitoring<F>(&mut self, factory: F) -> &mut Self
    where
        F: FnOnce() -> Arc<dyn MessageMonitor> + Send + 'static,
    {
        self.services.with_message_monitoring(factory);
        self
    }

    pub fn with_naming_strategy<F>(&mut self, factory: F) -> &mut Self
    where
        F: FnOnce() -> Arc<dyn NamingStrategy> + Send + 'static,
    {
        self.services.with_naming_strategy(factory);
        self
    }

    pub fn with_serialization_factory<F>(&mut self, factory: F) -> &mut Self
    where
        F: FnOnce() -> Arc<dyn SerializationFactory> + Send + 'static,
    {
        self.services.with_serialization_factory(factory);
        self
    }

    /// Replace the capability resolver consulted for unset concerns.
    pub fn with_service_resolver(&mut self, resolver: Arc<dyn CapabilityResolver>) -> &mut Self {
        self.resolver = resolver;
        self
    }

    // =========================================================================
    // Assembly
    // =========================================================================

    /// Assemble the bus, consuming the assembler.
    pub fn build(self) -> Result<AssembledBus, AssemblyError> {
        let resolver = Arc::clone(&self.resolver);
        let mut stage = AssemblyStage::Configuring;

        match self.assemble(resolver.as_ref(), &mut stage) {
            Ok(bus) => {
                info!(
                    consumers = bus.consumers().len(),
                    region = %bus.config().region,
                    "[Assembler] Bus assembled"
                );
                Ok(bus)
            }
            Err(e) => {
                warn!(stage = %stage, error = %e, "[Assembler] Assembly aborted");
                Err(e)
            }
        }
    }

    fn assemble(
        self,
        resolver: &dyn CapabilityResolver,
        stage: &mut AssemblyStage,
    ) -> Result<AssembledBus, AssemblyError> {
        let Self {
            client,
            messaging,
            subscriptions,
            services,
            resolver: _,
        } = self;
        let overrides = services.explicit_count();
        let ServicesBuilder {
            logger_factory,
            monitor,
            message_lock,
            naming_strategy,
            serialization_factory,
            serialization_register,
            handler_resolver,
        } = services;

        enter(stage, AssemblyStage::Validating);
        let config = match messaging {
            Some(builder) => builder.build(),
            None => resolve_required::<MessagingConfig>(resolver)?,
        };
        config.validate()?;

        enter(stage, AssemblyStage::ResolvingComponents);
        debug!(overrides, "[Assembler] Resolving unset components");
        let logger_factory = logger_factory.resolve(resolver)?;
        let serialization_register = serialization_register.resolve(resolver)?;
        let (client_factory, settings) = client.unwrap_or_default().into_parts(&config.region);
        let client_factory = client_factory.resolve(resolver)?;
        let components = ResolvedComponents {
            logger_factory,
            serialization_register,
            client: ClientFactoryProxy::new(client_factory, settings),
            serialization_factory: serialization_factory.resolve(resolver)?,
            monitor: monitor.resolve(resolver)?,
            naming_strategy: naming_strategy.resolve_optional(resolver)?,
            message_lock: message_lock.resolve_optional(resolver)?,
        };
        debug!(
            naming_strategy = components.naming_strategy.is_some(),
            message_lock = components.message_lock.is_some(),
            "[Assembler] Components resolved"
        );

        enter(stage, AssemblyStage::ConstructingBus);
        let mut configurator = construct(config, components)?;

        enter(stage, AssemblyStage::ApplyingSubscriptions);
        if let Some(subscriptions) = subscriptions {
            subscriptions.apply_all(&mut configurator, handler_resolver, resolver)?;
        }

        let bus = configurator.build()?;
        enter(stage, AssemblyStage::Assembled);
        Ok(bus)
    }
}

fn enter(stage: &mut AssemblyStage, next: AssemblyStage) {
    debug!(from = %stage, stage = %next, "[Assembler] Stage transition");
    *stage = next;
}

fn construct(
    config: MessagingConfig,
    components: ResolvedComponents,
) -> Result<BusConfigurator, AssemblyError> {
    let ResolvedComponents {
        logger_factory,
        serialization_register,
        client,
        serialization_factory,
        monitor,
        naming_strategy,
        message_lock,
    } = components;

    let bus = MessageBus::new(config, serialization_register, logger_factory.as_ref())?;
    let mut configurator = BusConfigurator::new(bus, Arc::new(client), logger_factory.as_ref());
    configurator
        .with_serialization_factory(serialization_factory)
        .with_monitoring(monitor);
    if let Some(strategy) = naming_strategy {
        configurator.with_naming_strategy(strategy);
    }
    if let Some(lock) = message_lock {
        configurator.with_message_lock(lock);
    }
    Ok(configurator)
}

impl fmt::Debug for BusAssembler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusAssembler")
            .field("client", &self.client)
            .field("messaging", &self.messaging)
            .field("subscriptions", &self.subscriptions)
            .field("services", &self.services)
            .finish_non_exhaustive()
    }
}
