//! Lookup-counting resolver wrapper.

use parking_lot::Mutex;

use super::{Capability, CapabilityResolver, Provider};

/// Wraps a resolver and journals every lookup.
///
/// Useful when diagnosing which collaborators an assembly fell back to the
/// resolver for.
#[derive(Debug, Default)]
pub struct RecordingResolver<R> {
    inner: R,
    journal: Mutex<Vec<Capability>>,
}

impl<R: CapabilityResolver> RecordingResolver<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            journal: Mutex::new(Vec::new()),
        }
    }

    /// How often `capability` has been looked up.
    #[must_use]
    pub fn lookups(&self, capability: Capability) -> usize {
        self.journal
            .lock()
            .iter()
            .filter(|looked_up| **looked_up == capability)
            .count()
    }

    /// Lookups across all capabilities.
    #[must_use]
    pub fn total_lookups(&self) -> usize {
        self.journal.lock().len()
    }

    /// Capabilities looked up at least once, in order of first lookup.
    #[must_use]
    pub fn consulted(&self) -> Vec<Capability> {
        let mut consulted = Vec::new();
        for capability in self.journal.lock().iter() {
            if !consulted.contains(capability) {
                consulted.push(*capability);
            }
        }
        consulted
    }

    pub fn reset(&self) {
        self.journal.lock().clear();
    }
}

impl<R: CapabilityResolver> CapabilityResolver for RecordingResolver<R> {
    fn resolve(&self, capability: Capability) -> Option<Provider> {
        self.journal.lock().push(capability);
        self.inner.resolve(capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{CapabilityRegistry, NullCapabilityResolver};
    use courier_bus::MessagingConfig;

    #[test]
    fn test_counts_each_lookup() {
        let resolver = RecordingResolver::new(NullCapabilityResolver);
        resolver.resolve(Capability::MessageLock);
        resolver.resolve(Capability::LoggerFactory);
        resolver.resolve(Capability::LoggerFactory);

        assert_eq!(resolver.lookups(Capability::LoggerFactory), 2);
        assert_eq!(resolver.lookups(Capability::MessageLock), 1);
        assert_eq!(resolver.lookups(Capability::ClientFactory), 0);
        assert_eq!(resolver.total_lookups(), 3);
        assert_eq!(
            resolver.consulted(),
            vec![Capability::MessageLock, Capability::LoggerFactory]
        );
    }

    #[test]
    fn test_forwards_to_inner() {
        let registry = CapabilityRegistry::new();
        registry.register(MessagingConfig::for_region("eu-west-1"));
        let resolver = RecordingResolver::new(registry);

        assert!(resolver.resolve(Capability::MessagingConfig).is_some());
        resolver.reset();
        assert_eq!(resolver.total_lookups(), 0);
    }
}
