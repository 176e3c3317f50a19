//! Registry-backed resolver.

use std::collections::HashMap;
use std::sync::Arc;

use courier_bus::adapters::{
    DefaultNamingStrategy, InMemorySerializationRegister, JsonSerializationFactory, NoOpMonitor,
};
use courier_bus::ports::{
    LoggerFactory, MessageMonitor, NamingStrategy, SerializationFactory, SerializationRegister,
};
use courier_telemetry::TracingLoggerFactory;
use parking_lot::RwLock;
use tracing::{debug, info};

use super::{Capability, CapabilityResolver, Provider, Resolvable};

type ProviderFactory = Arc<dyn Fn() -> Provider + Send + Sync>;

enum Registration {
    /// Shared instance, cloned out on every lookup.
    Instance(Provider),
    /// Invoked on every lookup.
    Factory(ProviderFactory),
}

/// Resolver holding one registration per capability.
///
/// Registering a capability again replaces the earlier registration.
#[derive(Default)]
pub struct CapabilityRegistry {
    registrations: RwLock<HashMap<Capability, Registration>>,
}

impl CapabilityRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the reference adapters.
    ///
    /// Covers logging (via `tracing`), monitoring (no-op), JSON
    /// serialization, a fresh in-memory serialization register per lookup
    /// and the default naming strategy. Client factory, handler resolver,
    /// message lock and messaging configuration are left to the caller.
    #[must_use]
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register::<Arc<dyn LoggerFactory>>(Arc::new(TracingLoggerFactory));
        registry.register::<Arc<dyn MessageMonitor>>(Arc::new(NoOpMonitor));
        registry.register::<Arc<dyn SerializationFactory>>(Arc::new(JsonSerializationFactory));
        registry.register_factory::<Arc<dyn SerializationRegister>, _>(|| {
            Arc::new(InMemorySerializationRegister::new())
        });
        registry.register::<Arc<dyn NamingStrategy>>(Arc::new(DefaultNamingStrategy));
        registry
    }

    /// Register a shared instance for `T`'s capability.
    pub fn register<T: Resolvable>(&self, value: T) -> &Self {
        info!("[Registry] Registering provider: {}", T::CAPABILITY);
        self.registrations
            .write()
            .insert(T::CAPABILITY, Registration::Instance(value.into_provider()));
        self
    }

    /// Register a factory producing a fresh `T` on every lookup.
    pub fn register_factory<T, F>(&self, factory: F) -> &Self
    where
        T: Resolvable,
        F: Fn() -> T + Send + Sync + 'static,
    {
        info!("[Registry] Registering provider factory: {}", T::CAPABILITY);
        self.registrations.write().insert(
            T::CAPABILITY,
            Registration::Factory(Arc::new(move || factory().into_provider())),
        );
        self
    }

    /// Remove the registration for `capability`, if any.
    pub fn unregister(&self, capability: Capability) -> bool {
        self.registrations.write().remove(&capability).is_some()
    }

    #[must_use]
    pub fn contains(&self, capability: Capability) -> bool {
        self.registrations.read().contains_key(&capability)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.registrations.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registrations.read().is_empty()
    }

    /// Registered capabilities in declaration order.
    #[must_use]
    pub fn capabilities(&self) -> Vec<Capability> {
        let registrations = self.registrations.read();
        Capability::all()
            .into_iter()
            .filter(|capability| registrations.contains_key(capability))
            .collect()
    }
}

impl CapabilityResolver for CapabilityRegistry {
    fn resolve(&self, capability: Capability) -> Option<Provider> {
        // Factories run without the lock held; they may use the registry.
        let factory = match self.registrations.read().get(&capability)? {
            Registration::Instance(provider) => {
                debug!(capability = %capability, "[Registry] Resolved provider");
                return Some(provider.clone());
            }
            Registration::Factory(factory) => Arc::clone(factory),
        };
        let provider = factory();
        debug!(capability = %capability, "[Registry] Resolved provider");
        Some(provider)
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("capabilities", &self.capabilities())
            .finish()
    }
}
