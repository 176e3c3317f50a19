//! # Capability Resolution
//!
//! Every pluggable collaborator of the bus is identified by a [`Capability`].
//! A [`CapabilityResolver`] maps a capability to a [`Provider`], or reports
//! that it has none. The assembler consults the resolver only for concerns
//! the caller did not override explicitly.
//!
//! ```text
//! ┌──────────────────┐  resolve(capability)  ┌──────────────────────┐
//! │   BusAssembler   │ ────────────────────→ │  CapabilityResolver  │
//! │                  │ ←──────────────────── │  (registry, null,    │
//! │                  │   Some(provider)      │   recording wrapper) │
//! └──────────────────┘   or None             └──────────────────────┘
//! ```
//!
//! Absence is always an explicit `None`. A resolver never fabricates a
//! working stand-in, so a forgotten override and a forgotten registration
//! fail the same way.

mod recording;
mod registry;

pub use recording::RecordingResolver;
pub use registry::CapabilityRegistry;

use std::fmt;
use std::sync::Arc;

use courier_bus::ports::{
    ClientFactory, HandlerResolver, LoggerFactory, MessageLock, MessageMonitor, NamingStrategy,
    SerializationFactory, SerializationRegister,
};
use courier_bus::MessagingConfig;

use crate::error::AssemblyError;

/// Identifier of a resolvable collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    LoggerFactory,
    MessageMonitor,
    MessageLock,
    SerializationFactory,
    SerializationRegister,
    NamingStrategy,
    HandlerResolver,
    ClientFactory,
    MessagingConfig,
}

impl Capability {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoggerFactory => "logger-factory",
            Self::MessageMonitor => "message-monitor",
            Self::MessageLock => "message-lock",
            Self::SerializationFactory => "serialization-factory",
            Self::SerializationRegister => "serialization-register",
            Self::NamingStrategy => "naming-strategy",
            Self::HandlerResolver => "handler-resolver",
            Self::ClientFactory => "client-factory",
            Self::MessagingConfig => "messaging-config",
        }
    }

    #[must_use]
    pub fn all() -> Vec<Capability> {
        vec![
            Self::LoggerFactory,
            Self::MessageMonitor,
            Self::MessageLock,
            Self::SerializationFactory,
            Self::SerializationRegister,
            Self::NamingStrategy,
            Self::HandlerResolver,
            Self::ClientFactory,
            Self::MessagingConfig,
        ]
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A concrete collaborator, tagged with the capability it satisfies.
#[derive(Clone)]
pub enum Provider {
    LoggerFactory(Arc<dyn LoggerFactory>),
    MessageMonitor(Arc<dyn MessageMonitor>),
    MessageLock(Arc<dyn MessageLock>),
    SerializationFactory(Arc<dyn SerializationFactory>),
    SerializationRegister(Arc<dyn SerializationRegister>),
    NamingStrategy(Arc<dyn NamingStrategy>),
    HandlerResolver(Arc<dyn HandlerResolver>),
    ClientFactory(Arc<dyn ClientFactory>),
    MessagingConfig(MessagingConfig),
}

impl Provider {
    /// The capability this provider satisfies.
    #[must_use]
    pub fn capability(&self) -> Capability {
        match self {
            Self::LoggerFactory(_) => Capability::LoggerFactory,
            Self::MessageMonitor(_) => Capability::MessageMonitor,
            Self::MessageLock(_) => Capability::MessageLock,
            Self::SerializationFactory(_) => Capability::SerializationFactory,
            Self::SerializationRegister(_) => Capability::SerializationRegister,
            Self::NamingStrategy(_) => Capability::NamingStrategy,
            Self::HandlerResolver(_) => Capability::HandlerResolver,
            Self::ClientFactory(_) => Capability::ClientFactory,
            Self::MessagingConfig(_) => Capability::MessagingConfig,
        }
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MessagingConfig(config) => f.debug_tuple("MessagingConfig").field(config).finish(),
            other => write!(f, "Provider({})", other.capability()),
        }
    }
}

/// Maps capabilities to providers.
pub trait CapabilityResolver: Send + Sync {
    /// Look up the provider for `capability`.
    ///
    /// `None` means nothing is registered; it is up to the caller to decide
    /// whether that is fatal.
    fn resolve(&self, capability: Capability) -> Option<Provider>;
}

/// Resolver that has no providers at all.
///
/// Used when the caller does not supply one.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCapabilityResolver;

impl CapabilityResolver for NullCapabilityResolver {
    fn resolve(&self, _capability: Capability) -> Option<Provider> {
        None
    }
}

impl<R: CapabilityResolver + ?Sized> CapabilityResolver for Arc<R> {
    fn resolve(&self, capability: Capability) -> Option<Provider> {
        (**self).resolve(capability)
    }
}

/// A value that can be stored in, and extracted from, a [`Provider`].
pub trait Resolvable: Sized + Send + 'static {
    /// The capability values of this type satisfy.
    const CAPABILITY: Capability;

    fn into_provider(self) -> Provider;

    /// Extract the value, handing the provider back if it has another shape.
    fn from_provider(provider: Provider) -> Result<Self, Provider>;
}

macro_rules! impl_resolvable {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl Resolvable for $ty {
                const CAPABILITY: Capability = Capability::$variant;

                fn into_provider(self) -> Provider {
                    Provider::$variant(self)
                }

                fn from_provider(provider: Provider) -> Result<Self, Provider> {
                    match provider {
                        Provider::$variant(value) => Ok(value),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

impl_resolvable! {
    LoggerFactory => Arc<dyn LoggerFactory>,
    MessageMonitor => Arc<dyn MessageMonitor>,
    MessageLock => Arc<dyn MessageLock>,
    SerializationFactory => Arc<dyn SerializationFactory>,
    SerializationRegister => Arc<dyn SerializationRegister>,
    NamingStrategy => Arc<dyn NamingStrategy>,
    HandlerResolver => Arc<dyn HandlerResolver>,
    ClientFactory => Arc<dyn ClientFactory>,
    MessagingConfig => MessagingConfig,
}

/// Resolve `T`, treating absence as fatal.
pub fn resolve_required<T: Resolvable>(
    resolver: &dyn CapabilityResolver,
) -> Result<T, AssemblyError> {
    resolve_optional::<T>(resolver)?.ok_or(AssemblyError::UnsatisfiedDependency {
        capability: T::CAPABILITY,
    })
}

/// Resolve `T`, treating absence as "not attached".
pub fn resolve_optional<T: Resolvable>(
    resolver: &dyn CapabilityResolver,
) -> Result<Option<T>, AssemblyError> {
    match resolver.resolve(T::CAPABILITY) {
        None => Ok(None),
        Some(provider) => T::from_provider(provider).map(Some).map_err(|other| {
            AssemblyError::ProviderMismatch {
                expected: T::CAPABILITY,
                found: other.capability(),
            }
        }),
    }
}
