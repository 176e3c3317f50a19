//! Override-or-resolve slots.

use std::fmt;

use crate::capability::{resolve_optional, resolve_required, CapabilityResolver, Resolvable};
use crate::error::AssemblyError;

type Factory<T> = Box<dyn FnOnce() -> T + Send>;

/// One pluggable concern: either an explicit factory or "ask the resolver".
///
/// Read exactly once, when the assembly consumes it. An explicit factory is
/// invoked and the resolver is never consulted; an unset slot costs exactly
/// one resolver lookup.
pub enum ComponentOverride<T> {
    Unset,
    Explicit(Factory<T>),
}

impl<T> Default for ComponentOverride<T> {
    fn default() -> Self {
        Self::Unset
    }
}

impl<T: Resolvable> ComponentOverride<T> {
    pub fn explicit<F>(factory: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        Self::Explicit(Box::new(factory))
    }

    /// Replace the slot with `factory`.
    pub fn set<F>(&mut self, factory: F)
    where
        F: FnOnce() -> T + Send + 'static,
    {
        *self = Self::explicit(factory);
    }

    #[must_use]
    pub fn is_explicit(&self) -> bool {
        matches!(self, Self::Explicit(_))
    }

    /// Produce the component, failing when neither source has one.
    pub fn resolve(self, resolver: &dyn CapabilityResolver) -> Result<T, AssemblyError> {
        match self {
            Self::Explicit(factory) => Ok(factory()),
            Self::Unset => resolve_required::<T>(resolver),
        }
    }

    /// Produce the component if either source has one.
    pub fn resolve_optional(
        self,
        resolver: &dyn CapabilityResolver,
    ) -> Result<Option<T>, AssemblyError> {
        match self {
            Self::Explicit(factory) => Ok(Some(factory())),
            Self::Unset => resolve_optional::<T>(resolver),
        }
    }
}

impl<T> fmt::Debug for ComponentOverride<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => f.write_str("Unset"),
            Self::Explicit(_) => f.write_str("Explicit(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{Capability, CapabilityRegistry, RecordingResolver};
    use courier_bus::MessagingConfig;

    fn resolver() -> RecordingResolver<CapabilityRegistry> {
        let registry = CapabilityRegistry::new();
        registry.register(MessagingConfig::for_region("eu-west-1"));
        RecordingResolver::new(registry)
    }

    #[test]
    fn test_explicit_skips_resolver() {
        let resolver = resolver();
        let slot = ComponentOverride::explicit(|| MessagingConfig::for_region("us-east-2"));

        let config = slot.resolve(&resolver).unwrap();

        assert_eq!(config.region, "us-east-2");
        assert_eq!(resolver.lookups(Capability::MessagingConfig), 0);
    }

    #[test]
    fn test_unset_consults_resolver_once() {
        let resolver = resolver();
        let slot: ComponentOverride<MessagingConfig> = ComponentOverride::default();

        let config = slot.resolve(&resolver).unwrap();

        assert_eq!(config.region, "eu-west-1");
        assert_eq!(resolver.lookups(Capability::MessagingConfig), 1);
    }

    #[test]
    fn test_set_replaces_earlier_factory() {
        let mut slot = ComponentOverride::explicit(|| MessagingConfig::for_region("eu-west-1"));
        slot.set(|| MessagingConfig::for_region("ap-south-1"));

        assert!(slot.is_explicit());
        let config = slot.resolve(&RecordingResolver::new(CapabilityRegistry::new()));
        assert_eq!(config.unwrap().region, "ap-south-1");
    }

    #[test]
    fn test_optional_unset_absent_is_none() {
        let resolver = RecordingResolver::new(CapabilityRegistry::new());
        let slot: ComponentOverride<MessagingConfig> = ComponentOverride::Unset;

        assert!(slot.resolve_optional(&resolver).unwrap().is_none());
        assert_eq!(resolver.lookups(Capability::MessagingConfig), 1);
    }
}
