//! # Subscriptions
//!
//! [`SubscriptionsBuilder`] is the ordered registry of [`SubscriptionSpec`]s,
//! one per message type. Specs are configured eagerly when added and bound
//! to the bus, in insertion order, during assembly.
//!
//! ## Binding
//!
//! 1. The handler resolver is obtained once (override or capability).
//! 2. A handler is resolved for every spec before any consumer is bound.
//! 3. Consumers are bound in insertion order.
//!
//! A failure at any step aborts the assembly with nothing bound.

use std::sync::Arc;
use std::time::Duration;

use courier_bus::ports::HandlerResolver;
use courier_bus::{
    BusConfigurator, ConsumerBinding, Message, MessageType, SubscriptionKind, SubscriptionOptions,
    MAX_PREFETCH,
};
use tracing::{debug, info};

use crate::builders::non_blank;
use crate::capability::CapabilityResolver;
use crate::component::ComponentOverride;
use crate::error::AssemblyError;

/// Longest accepted queue or topic name.
pub const MAX_RESOURCE_NAME_LENGTH: usize = 80;

/// Subscription intent for one message type.
#[derive(Debug, Clone)]
pub struct SubscriptionSpec {
    message_type: MessageType,
    options: SubscriptionOptions,
}

impl SubscriptionSpec {
    fn new(message_type: MessageType) -> Self {
        Self {
            message_type,
            options: SubscriptionOptions::default(),
        }
    }

    #[must_use]
    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    #[must_use]
    pub fn options(&self) -> &SubscriptionOptions {
        &self.options
    }

    /// Read from `queue` instead of the naming strategy's queue.
    pub fn with_queue_name(&mut self, queue: &str) -> Result<&mut Self, AssemblyError> {
        self.options.queue_name = Some(resource_name("queue_name", queue)?);
        Ok(self)
    }

    /// Subscribe the queue to a topic named by the naming strategy.
    pub fn as_topic_subscription(&mut self) -> &mut Self {
        self.options.kind = SubscriptionKind::Topic;
        self
    }

    /// Subscribe the queue to `topic`.
    pub fn with_topic(&mut self, topic: &str) -> Result<&mut Self, AssemblyError> {
        let topic = resource_name("topic_name", topic)?;
        self.options.kind = SubscriptionKind::Topic;
        self.options.topic_name = Some(topic);
        Ok(self)
    }

    pub fn with_max_concurrency(&mut self, max: usize) -> Result<&mut Self, AssemblyError> {
        if max == 0 {
            return Err(AssemblyError::invalid_argument(
                "max_concurrency",
                "must be greater than zero",
            ));
        }
        self.options.max_concurrency = Some(max);
        Ok(self)
    }

    pub fn with_prefetch(&mut self, prefetch: u32) -> Result<&mut Self, AssemblyError> {
        if prefetch == 0 || prefetch > MAX_PREFETCH {
            return Err(AssemblyError::invalid_argument(
                "prefetch",
                format!("{prefetch} is outside 1..={MAX_PREFETCH}"),
            ));
        }
        self.options.prefetch = Some(prefetch);
        Ok(self)
    }

    pub fn with_message_lock_timeout(
        &mut self,
        timeout: Duration,
    ) -> Result<&mut Self, AssemblyError> {
        if timeout.is_zero() {
            return Err(AssemblyError::invalid_argument(
                "message_lock_timeout",
                "must be non-zero",
            ));
        }
        self.options.message_lock_timeout = Some(timeout);
        Ok(self)
    }
}

fn resource_name(argument: &'static str, name: &str) -> Result<String, AssemblyError> {
    let name = non_blank(argument, name)?;
    if name.len() > MAX_RESOURCE_NAME_LENGTH {
        return Err(AssemblyError::invalid_argument(
            argument,
            format!("longer than {MAX_RESOURCE_NAME_LENGTH} characters"),
        ));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(AssemblyError::invalid_argument(
            argument,
            format!("{name} contains {c:?}"),
        ));
    }
    Ok(name)
}

/// Ordered collection of subscription specs.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionsBuilder {
    specs: Vec<SubscriptionSpec>,
}

impl SubscriptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscription for `T`, configured by `configure`.
    ///
    /// `configure` runs before this call returns. If it fails, the spec is
    /// discarded and the registry is unchanged.
    pub fn add_subscription<T, F>(&mut self, configure: F) -> Result<&mut Self, AssemblyError>
    where
        T: Message,
        F: FnOnce(&mut SubscriptionSpec) -> Result<(), AssemblyError>,
    {
        let mut spec = SubscriptionSpec::new(MessageType::of::<T>());
        configure(&mut spec)?;
        debug!(message_type = %spec.message_type, "[Subscriptions] Subscription added");
        self.specs.push(spec);
        Ok(self)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Specs in insertion order.
    #[must_use]
    pub fn specs(&self) -> &[SubscriptionSpec] {
        &self.specs
    }

    /// Bind every spec to `configurator`.
    ///
    /// An empty registry needs no handlers and leaves the resolver alone.
    pub(crate) fn apply_all(
        self,
        configurator: &mut BusConfigurator,
        handler_resolver: ComponentOverride<Arc<dyn HandlerResolver>>,
        resolver: &dyn CapabilityResolver,
    ) -> Result<(), AssemblyError> {
        if self.specs.is_empty() {
            return Ok(());
        }

        let handlers = handler_resolver.resolve(resolver)?;

        let bindings = self
            .specs
            .into_iter()
            .map(|spec| -> Result<ConsumerBinding, AssemblyError> {
                let handler = handlers.resolve_handler(&spec.message_type).ok_or_else(|| {
                    AssemblyError::HandlerNotFound {
                        message_type: spec.message_type.short_name().to_string(),
                    }
                })?;
                Ok(ConsumerBinding {
                    message_type: spec.message_type,
                    options: spec.options,
                    handler,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let count = bindings.len();
        for binding in bindings {
            configurator.add_consumer(binding)?;
        }
        info!(consumers = count, "[Subscriptions] Subscriptions applied");
        Ok(())
    }
}
