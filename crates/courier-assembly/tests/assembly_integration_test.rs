//! # Assembly Integration Tests
//!
//! End-to-end behavior of `BusAssembler::build` against a recording
//! capability resolver, the in-memory transport and real handlers.
//!
//! ## What is checked
//!
//! - Explicit overrides are never looked up; unset concerns are looked up once
//! - Validation happens before any component is resolved
//! - Subscriptions bind in order, all-or-nothing
//! - The assembled bus provisions resources, handles deliveries and shuts down

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use courier_assembly::{
    AssemblyError, AssemblyErrorKind, BusAssembler, Capability, CapabilityRegistry, ClientBuilder,
    MessagingConfigBuilder, RecordingResolver, SubscriptionsBuilder,
};
use courier_bus::adapters::{
    DefaultNamingStrategy, HandlerRegistry, InMemoryMessageLock, InMemorySerializationRegister,
    InMemoryTransport, JsonMessageSerializer, JsonSerializationFactory, NoOpLoggerFactory,
    NoOpMonitor,
};
use courier_bus::ports::{
    ClientFactory, Handler, HandlerResolver, LoggerFactory, MessageLock, MessageMonitor,
    MessageSerializer, NamingStrategy, SerializationFactory, SerializationRegister,
};
use courier_bus::{
    BusError, BusStatus, HandleOutcome, HandlerError, MessageType, MessagingConfig,
    SubscriptionKind,
};
use courier_telemetry::PrometheusMonitor;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::timeout;
use uuid::Uuid;

// =============================================================================
// Fixtures
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct OrderPlaced {
    order_id: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct OrderShipped {
    order_id: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct OrderCancelled {
    order_id: u64,
}

#[derive(Default)]
struct OrderLedger {
    last_order: AtomicU64,
    calls: AtomicUsize,
}

struct LedgerHandler(Arc<OrderLedger>);

#[async_trait]
impl Handler<OrderPlaced> for LedgerHandler {
    async fn handle(&self, message: OrderPlaced) -> Result<(), HandlerError> {
        self.0.last_order.store(message.order_id, Ordering::SeqCst);
        self.0.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl Handler<OrderShipped> for LedgerHandler {
    async fn handle(&self, message: OrderShipped) -> Result<(), HandlerError> {
        self.0.last_order.store(message.order_id, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl Handler<OrderCancelled> for LedgerHandler {
    async fn handle(&self, _message: OrderCancelled) -> Result<(), HandlerError> {
        Ok(())
    }
}

fn handlers_for_all(ledger: &Arc<OrderLedger>) -> Arc<HandlerRegistry> {
    let handlers = HandlerRegistry::new();
    handlers.register::<OrderPlaced, _>(LedgerHandler(Arc::clone(ledger)));
    handlers.register::<OrderShipped, _>(LedgerHandler(Arc::clone(ledger)));
    handlers.register::<OrderCancelled, _>(LedgerHandler(Arc::clone(ledger)));
    Arc::new(handlers)
}

/// Registry with the reference adapters, a region and an in-memory transport.
fn full_registry(transport: &InMemoryTransport) -> CapabilityRegistry {
    let registry = CapabilityRegistry::with_defaults();
    registry.register(MessagingConfig::for_region("eu-west-1"));
    registry.register::<Arc<dyn ClientFactory>>(Arc::new(transport.clone()));
    registry
}

fn body_for(subject: &str, order_id: u64) -> String {
    JsonMessageSerializer::new(subject)
        .serialize(&serde_json::json!({ "order_id": order_id }))
        .expect("encodable body")
}

// =============================================================================
// Override or resolve
// =============================================================================

/// An explicitly supplied component is never looked up.
#[test]
fn test_explicit_override_is_never_resolved() {
    let transport = InMemoryTransport::new();
    let resolver = Arc::new(RecordingResolver::new(full_registry(&transport)));

    let mut assembler = BusAssembler::new();
    assembler
        .with_service_resolver(resolver.clone())
        .with_monitoring(|| Arc::new(NoOpMonitor))
        .with_message_lock(|| Arc::new(InMemoryMessageLock::new()));

    let bus = assembler.build().expect("assembles");

    assert!(bus.has_message_lock());
    assert_eq!(resolver.lookups(Capability::MessageMonitor), 0);
    assert_eq!(resolver.lookups(Capability::MessageLock), 0);
}

/// Every unset concern costs exactly one lookup.
#[test]
fn test_unset_concerns_are_resolved_once() {
    let transport = InMemoryTransport::new();
    let resolver = Arc::new(RecordingResolver::new(full_registry(&transport)));

    let mut assembler = BusAssembler::new();
    assembler.with_service_resolver(resolver.clone());
    let bus = assembler.build().expect("assembles");

    for capability in [
        Capability::MessagingConfig,
        Capability::LoggerFactory,
        Capability::SerializationRegister,
        Capability::ClientFactory,
        Capability::SerializationFactory,
        Capability::MessageMonitor,
        Capability::NamingStrategy,
        Capability::MessageLock,
    ] {
        assert_eq!(resolver.lookups(capability), 1, "{capability}");
    }
    // No subscriptions, so no handlers are needed.
    assert_eq!(resolver.lookups(Capability::HandlerResolver), 0);
    assert!(bus.consumers().is_empty());
    assert_eq!(bus.status(), BusStatus::Assembled);
}

/// Resolution follows a fixed order with the configuration first.
#[test]
fn test_resolution_order() {
    let transport = InMemoryTransport::new();
    let resolver = Arc::new(RecordingResolver::new(full_registry(&transport)));

    let mut assembler = BusAssembler::new();
    assembler.with_service_resolver(resolver.clone());
    assembler.build().expect("assembles");

    assert_eq!(
        resolver.consulted(),
        vec![
            Capability::MessagingConfig,
            Capability::LoggerFactory,
            Capability::SerializationRegister,
            Capability::ClientFactory,
            Capability::SerializationFactory,
            Capability::MessageMonitor,
            Capability::NamingStrategy,
            Capability::MessageLock,
        ]
    );
}

/// A required concern with no provider aborts the build.
#[test]
fn test_missing_required_component_is_unsatisfied() {
    let registry = CapabilityRegistry::with_defaults();
    registry.register(MessagingConfig::for_region("eu-west-1"));
    let resolver = Arc::new(RecordingResolver::new(registry));

    let mut assembler = BusAssembler::new();
    assembler.with_service_resolver(resolver.clone());
    let err = assembler.build().unwrap_err();

    assert!(matches!(
        err,
        AssemblyError::UnsatisfiedDependency {
            capability: Capability::ClientFactory
        }
    ));
    assert_eq!(err.kind(), AssemblyErrorKind::UnsatisfiedDependency);
}

/// Assemble with exactly one concern overridden and one subscription.
fn assemble_overriding(
    capability: Capability,
    resolver: Arc<RecordingResolver<CapabilityRegistry>>,
    transport: &InMemoryTransport,
) -> Result<(), AssemblyError> {
    let ledger = Arc::new(OrderLedger::default());
    let handlers = handlers_for_all(&ledger);
    let factory_transport = transport.clone();

    let mut assembler = BusAssembler::new();
    assembler
        .with_service_resolver(resolver)
        .subscriptions(|s| {
            s.add_subscription::<OrderPlaced, _>(|_| Ok(()))?;
            Ok(())
        })?;

    match capability {
        Capability::MessagingConfig => {
            assembler.with_messaging(MessagingConfig::for_region("eu-west-1"));
        }
        Capability::LoggerFactory => {
            assembler.with_logger_factory(|| Arc::new(NoOpLoggerFactory));
        }
        Capability::SerializationRegister => {
            assembler.services(|s| {
                s.with_serialization_register(|| Arc::new(InMemorySerializationRegister::new()));
                Ok(())
            })?;
        }
        Capability::ClientFactory => {
            let mut client = ClientBuilder::new();
            client.with_client_factory(move || Arc::new(factory_transport));
            assembler.with_client(client);
        }
        Capability::SerializationFactory => {
            assembler.with_serialization_factory(|| Arc::new(JsonSerializationFactory));
        }
        Capability::MessageMonitor => {
            assembler.with_monitoring(|| Arc::new(NoOpMonitor));
        }
        Capability::NamingStrategy => {
            assembler.with_naming_strategy(|| Arc::new(DefaultNamingStrategy));
        }
        Capability::MessageLock => {
            assembler.with_message_lock(|| Arc::new(InMemoryMessageLock::new()));
        }
        Capability::HandlerResolver => {
            assembler.services(|s| {
                s.with_handler_resolver(move || handlers as Arc<dyn HandlerResolver>);
                Ok(())
            })?;
        }
    }

    assembler.build().map(|_| ())
}

/// Each override on its own removes exactly that concern's lookup.
#[test]
fn test_each_override_skips_its_lookup() {
    for overridden in Capability::all() {
        let transport = InMemoryTransport::new();
        let registry = full_registry(&transport);
        let handlers: Arc<dyn HandlerResolver> = handlers_for_all(&Arc::default());
        registry.register(handlers);
        let resolver = Arc::new(RecordingResolver::new(registry));

        assemble_overriding(overridden, Arc::clone(&resolver), &transport)
            .unwrap_or_else(|e| panic!("{overridden}: {e}"));

        for capability in Capability::all() {
            let expected = usize::from(capability != overridden);
            assert_eq!(
                resolver.lookups(capability),
                expected,
                "{capability} with {overridden} overridden"
            );
        }
    }
}

/// With everything overridden only the configuration is looked up.
#[test]
fn test_full_override_consults_only_configuration() {
    let transport = InMemoryTransport::new();
    let resolver = Arc::new(RecordingResolver::new(full_registry(&transport)));
    let ledger = Arc::new(OrderLedger::default());
    let handlers = handlers_for_all(&ledger);
    let factory_transport = transport.clone();

    let mut client = ClientBuilder::new();
    client.with_client_factory(move || Arc::new(factory_transport) as Arc<dyn ClientFactory>);
    let mut subscriptions = SubscriptionsBuilder::new();
    subscriptions
        .add_subscription::<OrderPlaced, _>(|_| Ok(()))
        .unwrap();

    let mut assembler = BusAssembler::new();
    assembler
        .with_service_resolver(resolver.clone())
        .with_client(client)
        .with_subscriptions(subscriptions)
        .with_logger_factory(|| Arc::new(NoOpLoggerFactory) as Arc<dyn LoggerFactory>)
        .with_monitoring(|| Arc::new(NoOpMonitor))
        .with_message_lock(|| Arc::new(InMemoryMessageLock::new()))
        .with_naming_strategy(|| Arc::new(DefaultNamingStrategy) as Arc<dyn NamingStrategy>)
        .with_serialization_factory(|| {
            Arc::new(JsonSerializationFactory) as Arc<dyn SerializationFactory>
        })
        .services(|s| {
            s.with_serialization_register(|| {
                Arc::new(InMemorySerializationRegister::new()) as Arc<dyn SerializationRegister>
            })
            .with_handler_resolver(move || handlers as Arc<dyn HandlerResolver>);
            Ok(())
        })
        .unwrap();

    let bus = assembler.build().expect("assembles");

    assert_eq!(resolver.consulted(), vec![Capability::MessagingConfig]);
    assert_eq!(resolver.total_lookups(), 1);
    assert_eq!(bus.consumers().len(), 1);
    assert!(bus.has_message_lock());
}

struct BillingNaming;

impl NamingStrategy for BillingNaming {
    fn queue_name(&self, message_type: &MessageType) -> String {
        format!("billing-{}", message_type.short_name().to_lowercase())
    }

    fn topic_name(&self, message_type: &MessageType) -> String {
        format!("billing-events-{}", message_type.short_name().to_lowercase())
    }
}

/// A supplied naming strategy decides the resource names of unhinted consumers.
#[test]
fn test_naming_strategy_names_consumers() {
    let transport = InMemoryTransport::new();
    let ledger = Arc::new(OrderLedger::default());
    let handlers = handlers_for_all(&ledger);

    let mut assembler = BusAssembler::new();
    assembler
        .with_service_resolver(Arc::new(full_registry(&transport)))
        .with_naming_strategy(|| Arc::new(BillingNaming))
        .services(|s| {
            s.with_handler_resolver(move || handlers as Arc<dyn HandlerResolver>);
            Ok(())
        })
        .unwrap()
        .subscriptions(|s| {
            s.add_subscription::<OrderPlaced, _>(|_| Ok(()))?
                .add_subscription::<OrderShipped, _>(|spec| {
                    spec.as_topic_subscription();
                    Ok(())
                })?
                .add_subscription::<OrderCancelled, _>(|spec| {
                    spec.with_queue_name("cancellations")?;
                    Ok(())
                })?;
            Ok(())
        })
        .unwrap();

    let bus = assembler.build().expect("assembles");

    let placed = bus.consumer_for("OrderPlaced").expect("bound");
    assert_eq!(placed.queue_name(), "billing-orderplaced");
    assert_eq!(placed.topic_name(), None);

    let shipped = bus.consumer_for("OrderShipped").expect("bound");
    assert_eq!(shipped.kind(), SubscriptionKind::Topic);
    assert_eq!(shipped.queue_name(), "billing-ordershipped");
    assert_eq!(shipped.topic_name(), Some("billing-events-ordershipped"));

    let cancelled = bus.consumer_for("OrderCancelled").expect("bound");
    assert_eq!(cancelled.queue_name(), "cancellations");
    assert_eq!(
        bus.naming_strategy()
            .queue_name(&MessageType::of::<OrderPlaced>()),
        "billing-orderplaced"
    );
}

// =============================================================================
// Messaging configuration
// =============================================================================

/// Two configure calls land on the same builder.
#[test]
fn test_repeated_messaging_calls_are_both_visible() {
    let transport = InMemoryTransport::new();

    let mut assembler = BusAssembler::new();
    assembler
        .with_service_resolver(Arc::new(full_registry(&transport)))
        .messaging(|m| {
            m.with_region("us-east-2")?;
            Ok(())
        })
        .unwrap()
        .messaging(|m| {
            m.with_publish_failure_reattempts(4)?
                .with_publish_failure_backoff(Duration::from_millis(250))?;
            Ok(())
        })
        .unwrap();

    let bus = assembler.build().expect("assembles");

    assert_eq!(bus.config().region, "us-east-2");
    assert_eq!(bus.config().publish_failure_reattempts, 4);
    assert_eq!(
        bus.config().publish_failure_backoff,
        Duration::from_millis(250)
    );
}

/// Invalid configuration fails before anything is resolved.
#[test]
fn test_invalid_configuration_resolves_nothing() {
    let transport = InMemoryTransport::new();
    let resolver = Arc::new(RecordingResolver::new(full_registry(&transport)));

    let mut assembler = BusAssembler::new();
    assembler
        .with_service_resolver(resolver.clone())
        .messaging(|m| {
            m.with_region("not a region")?;
            Ok(())
        })
        .unwrap();

    let err = assembler.build().unwrap_err();

    assert_eq!(err.kind(), AssemblyErrorKind::ConfigurationInvalid);
    assert_eq!(resolver.total_lookups(), 0);
    assert_eq!(transport.clients_created(), 0);
}

/// A rejected setter reports the argument and leaves earlier state alone.
#[test]
fn test_invalid_setter_leaves_state_unchanged() {
    let transport = InMemoryTransport::new();

    let mut assembler = BusAssembler::new();
    assembler
        .with_service_resolver(Arc::new(full_registry(&transport)))
        .messaging(|m| {
            m.with_region("ap-southeast-2")?;
            Ok(())
        })
        .unwrap();

    let err = assembler
        .messaging(|m| {
            m.with_publish_failure_reattempts(99)?;
            Ok(())
        })
        .unwrap_err();

    assert!(matches!(
        err,
        AssemblyError::InvalidArgument {
            argument: "publish_failure_reattempts",
            ..
        }
    ));
    let bus = assembler.build().expect("earlier settings still assemble");
    assert_eq!(bus.config().region, "ap-southeast-2");
    assert_eq!(bus.config().publish_failure_reattempts, 0);
}

/// Without any messaging configuration the resolver is asked for one and
/// nothing else.
#[test]
fn test_unresolvable_configuration_stops_at_first_lookup() {
    let resolver = Arc::new(RecordingResolver::new(CapabilityRegistry::new()));

    let mut assembler = BusAssembler::new();
    assembler.with_service_resolver(resolver.clone());
    let err = assembler.build().unwrap_err();

    assert!(matches!(
        err,
        AssemblyError::UnsatisfiedDependency {
            capability: Capability::MessagingConfig
        }
    ));
    assert_eq!(resolver.consulted(), vec![Capability::MessagingConfig]);
}

#[test]
fn test_builder_from_config_round_trips_through_assembler() {
    let transport = InMemoryTransport::new();
    let mut config = MessagingConfig::for_region("eu-central-1");
    config.additional_subscriber_accounts = vec!["123456789012".into()];

    let mut assembler = BusAssembler::new();
    assembler
        .with_service_resolver(Arc::new(full_registry(&transport)))
        .with_messaging(config.clone());
    let bus = assembler.build().expect("assembles");

    assert_eq!(bus.config(), &config);
    assert_eq!(MessagingConfigBuilder::from_config(config.clone()).build(), config);
}

// =============================================================================
// Subscriptions
// =============================================================================

/// Subscriptions bind in the order they were added.
#[test]
fn test_subscriptions_bind_in_order() {
    let transport = InMemoryTransport::new();
    let ledger = Arc::new(OrderLedger::default());
    let handlers = handlers_for_all(&ledger);

    let mut assembler = BusAssembler::new();
    assembler
        .with_service_resolver(Arc::new(full_registry(&transport)))
        .services(|s| {
            s.with_handler_resolver(move || handlers as Arc<dyn HandlerResolver>);
            Ok(())
        })
        .unwrap()
        .subscriptions(|s| {
            s.add_subscription::<OrderShipped, _>(|_| Ok(()))?
                .add_subscription::<OrderPlaced, _>(|_| Ok(()))?;
            Ok(())
        })
        .unwrap()
        .subscriptions(|s| {
            s.add_subscription::<OrderCancelled, _>(|_| Ok(()))?;
            Ok(())
        })
        .unwrap();

    let bus = assembler.build().expect("assembles");

    let queues: Vec<&str> = bus.consumers().iter().map(|c| c.queue_name()).collect();
    assert_eq!(queues, vec!["ordershipped", "orderplaced", "ordercancelled"]);
    assert_eq!(bus.serialization_register().len(), 3);
}

/// Subscriptions without any way to find handlers abort the build.
#[test]
fn test_subscriptions_without_handler_resolver_are_unsatisfied() {
    let transport = InMemoryTransport::new();
    let resolver = Arc::new(RecordingResolver::new(full_registry(&transport)));

    let mut assembler = BusAssembler::new();
    assembler
        .with_service_resolver(resolver.clone())
        .subscriptions(|s| {
            s.add_subscription::<OrderPlaced, _>(|_| Ok(()))?;
            Ok(())
        })
        .unwrap();

    let err = assembler.build().unwrap_err();

    assert!(matches!(
        err,
        AssemblyError::UnsatisfiedDependency {
            capability: Capability::HandlerResolver
        }
    ));
    assert_eq!(resolver.lookups(Capability::HandlerResolver), 1);
}

/// One missing handler means no consumer is bound at all.
#[test]
fn test_missing_handler_binds_nothing() {
    let transport = InMemoryTransport::new();
    let handlers = HandlerRegistry::new();
    handlers.register::<OrderPlaced, _>(LedgerHandler(Arc::default()));
    let monitor = Arc::new(PrometheusMonitor::new("courier_missing").expect("metrics"));
    let scrape = Arc::clone(&monitor);

    let mut assembler = BusAssembler::new();
    assembler
        .with_service_resolver(Arc::new(full_registry(&transport)))
        .with_monitoring(move || monitor as Arc<dyn MessageMonitor>)
        .services(|s| {
            s.with_handler_resolver(move || Arc::new(handlers) as Arc<dyn HandlerResolver>);
            Ok(())
        })
        .unwrap()
        .subscriptions(|s| {
            s.add_subscription::<OrderPlaced, _>(|_| Ok(()))?
                .add_subscription::<OrderShipped, _>(|_| Ok(()))?;
            Ok(())
        })
        .unwrap();

    let err = assembler.build().unwrap_err();

    match err {
        AssemblyError::HandlerNotFound { message_type } => {
            assert_eq!(message_type, "OrderShipped");
        }
        other => panic!("unexpected error: {other}"),
    }
    let exposition = scrape.encode().expect("encodes");
    assert!(!exposition.contains("consumers_registered_total{"));
}

/// Two subscriptions naming the same queue are rejected.
#[test]
fn test_duplicate_queue_is_configuration_invalid() {
    let transport = InMemoryTransport::new();
    let ledger = Arc::new(OrderLedger::default());
    let handlers = handlers_for_all(&ledger);

    let mut assembler = BusAssembler::new();
    assembler
        .with_service_resolver(Arc::new(full_registry(&transport)))
        .services(|s| {
            s.with_handler_resolver(move || handlers as Arc<dyn HandlerResolver>);
            Ok(())
        })
        .unwrap()
        .subscriptions(|s| {
            s.add_subscription::<OrderPlaced, _>(|spec| {
                spec.with_queue_name("orders")?;
                Ok(())
            })?
            .add_subscription::<OrderShipped, _>(|spec| {
                spec.with_queue_name("orders")?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();

    let err = assembler.build().unwrap_err();

    assert!(matches!(
        err,
        AssemblyError::Bus(BusError::DuplicateQueue { .. })
    ));
    assert_eq!(err.kind(), AssemblyErrorKind::ConfigurationInvalid);
}

/// A spec whose configure callback fails never reaches the registry.
#[test]
fn test_failed_subscription_is_discarded() {
    let transport = InMemoryTransport::new();
    let ledger = Arc::new(OrderLedger::default());
    let handlers = handlers_for_all(&ledger);

    let mut assembler = BusAssembler::new();
    assembler
        .with_service_resolver(Arc::new(full_registry(&transport)))
        .services(|s| {
            s.with_handler_resolver(move || handlers as Arc<dyn HandlerResolver>);
            Ok(())
        })
        .unwrap();

    let err = assembler
        .subscriptions(|s| {
            s.add_subscription::<OrderPlaced, _>(|_| Ok(()))?
                .add_subscription::<OrderShipped, _>(|spec| {
                    spec.with_prefetch(0)?;
                    Ok(())
                })?;
            Ok(())
        })
        .unwrap_err();
    assert_eq!(err.kind(), AssemblyErrorKind::InvalidArgument);

    let bus = assembler.build().expect("assembles");
    assert_eq!(bus.consumers().len(), 1);
    assert!(bus.consumer_for("OrderPlaced").is_some());
    assert!(bus.consumer_for("OrderShipped").is_none());
}

mod v1 {
    #[derive(Debug, serde::Serialize, serde::Deserialize)]
    pub struct Ping {
        pub seq: u64,
    }
}

mod v2 {
    #[derive(Debug, serde::Serialize, serde::Deserialize)]
    pub struct Ping {
        pub seq: u64,
        pub origin: String,
    }
}

#[derive(Default)]
struct PingCounter {
    v1: AtomicUsize,
    v2: AtomicUsize,
}

struct PingHandler(Arc<PingCounter>);

#[async_trait]
impl Handler<v1::Ping> for PingHandler {
    async fn handle(&self, _message: v1::Ping) -> Result<(), HandlerError> {
        self.0.v1.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl Handler<v2::Ping> for PingHandler {
    async fn handle(&self, _message: v2::Ping) -> Result<(), HandlerError> {
        self.0.v2.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Codec whose envelope subject is the full type path.
struct TypePathSerializationFactory;

impl SerializationFactory for TypePathSerializationFactory {
    fn create_serializer(&self, message_type: &MessageType) -> Arc<dyn MessageSerializer> {
        Arc::new(JsonMessageSerializer::new(message_type.full_name()))
    }
}

/// Types sharing a short name keep their own codecs.
#[tokio::test]
async fn test_same_short_name_types_keep_separate_codecs() {
    let transport = InMemoryTransport::new();
    let counter = Arc::new(PingCounter::default());
    let handlers = HandlerRegistry::new();
    handlers.register::<v1::Ping, _>(PingHandler(Arc::clone(&counter)));
    handlers.register::<v2::Ping, _>(PingHandler(Arc::clone(&counter)));

    let mut assembler = BusAssembler::new();
    assembler
        .with_service_resolver(Arc::new(full_registry(&transport)))
        .with_serialization_factory(|| Arc::new(TypePathSerializationFactory))
        .services(|s| {
            s.with_handler_resolver(move || Arc::new(handlers) as Arc<dyn HandlerResolver>);
            Ok(())
        })
        .unwrap()
        .subscriptions(|s| {
            s.add_subscription::<v1::Ping, _>(|spec| {
                spec.with_queue_name("ping-v1")?;
                Ok(())
            })?
            .add_subscription::<v2::Ping, _>(|spec| {
                spec.with_queue_name("ping-v2")?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();
    let bus = assembler.build().expect("assembles");

    assert_eq!(bus.serialization_register().len(), 2);

    let v1_type = MessageType::of::<v1::Ping>();
    let v2_type = MessageType::of::<v2::Ping>();
    let v1_body = JsonMessageSerializer::new(v1_type.full_name())
        .serialize(&serde_json::json!({ "seq": 1 }))
        .expect("encodable");
    let v2_body = JsonMessageSerializer::new(v2_type.full_name())
        .serialize(&serde_json::json!({ "seq": 2, "origin": "eu" }))
        .expect("encodable");

    let v1_consumer = bus.consumers().iter().find(|c| c.tag() == v1_type).expect("bound");
    let v2_consumer = bus.consumers().iter().find(|c| c.tag() == v2_type).expect("bound");
    assert_eq!(v1_consumer.queue_name(), "ping-v1");

    assert_eq!(
        v1_consumer.handle("m-1", &v1_body).await.expect("v1 handled"),
        HandleOutcome::Handled
    );
    assert_eq!(
        v2_consumer.handle("m-2", &v2_body).await.expect("v2 handled"),
        HandleOutcome::Handled
    );
    assert!(matches!(
        v1_consumer.handle("m-3", &v2_body).await,
        Err(BusError::Serialization(_))
    ));
    assert_eq!(counter.v1.load(Ordering::SeqCst), 1);
    assert_eq!(counter.v2.load(Ordering::SeqCst), 1);
}

// =============================================================================
// End to end
// =============================================================================

/// Region, one handler and one subscription give a bus with one consumer.
#[tokio::test]
async fn test_single_subscription_assembles_and_handles() {
    let transport = InMemoryTransport::new();
    let ledger = Arc::new(OrderLedger::default());
    let handlers = HandlerRegistry::new();
    handlers.register::<OrderPlaced, _>(LedgerHandler(Arc::clone(&ledger)));
    let factory_transport = transport.clone();

    let mut assembler = BusAssembler::new();
    assembler
        .with_service_resolver(Arc::new(CapabilityRegistry::with_defaults()))
        .messaging(|m| {
            m.with_region("eu-west-1")?;
            Ok(())
        })
        .unwrap()
        .client(|c| {
            c.with_client_factory(move || Arc::new(factory_transport) as Arc<dyn ClientFactory>);
            Ok(())
        })
        .unwrap()
        .services(|s| {
            s.with_handler_resolver(move || Arc::new(handlers) as Arc<dyn HandlerResolver>);
            Ok(())
        })
        .unwrap()
        .subscriptions(|s| {
            s.add_subscription::<OrderPlaced, _>(|_| Ok(()))?;
            Ok(())
        })
        .unwrap();

    let bus = assembler.build().expect("assembles");

    assert_eq!(bus.consumers().len(), 1);
    assert_eq!(bus.client_settings().region, "eu-west-1");
    let consumer = bus.consumer_for("OrderPlaced").expect("bound");
    let outcome = consumer
        .handle(&Uuid::new_v4().to_string(), &body_for("OrderPlaced", 42))
        .await
        .expect("handled");

    assert_eq!(outcome, HandleOutcome::Handled);
    assert_eq!(ledger.last_order.load(Ordering::SeqCst), 42);
}

/// Start provisions every queue and topic, then stops on shutdown.
#[tokio::test]
async fn test_start_and_shutdown_lifecycle() {
    let transport = InMemoryTransport::new();
    let ledger = Arc::new(OrderLedger::default());
    let handlers = handlers_for_all(&ledger);

    let mut assembler = BusAssembler::new();
    assembler
        .with_service_resolver(Arc::new(full_registry(&transport)))
        .services(|s| {
            s.with_handler_resolver(move || handlers as Arc<dyn HandlerResolver>);
            Ok(())
        })
        .unwrap()
        .subscriptions(|s| {
            s.add_subscription::<OrderPlaced, _>(|_| Ok(()))?
                .add_subscription::<OrderShipped, _>(|spec| {
                    spec.as_topic_subscription().with_topic("shipping")?;
                    Ok(())
                })?;
            Ok(())
        })
        .unwrap();
    let bus = Arc::new(assembler.build().expect("assembles"));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let runner = {
        let bus = Arc::clone(&bus);
        tokio::spawn(async move { bus.start(shutdown_rx).await })
    };

    timeout(Duration::from_secs(1), async {
        while bus.status() != BusStatus::Running {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("bus reaches running");

    assert_eq!(
        transport.queues(),
        vec!["orderplaced".to_string(), "ordershipped".to_string()]
    );
    assert_eq!(transport.topics(), vec!["shipping".to_string()]);
    assert_eq!(
        transport.subscriptions(),
        vec![("shipping".to_string(), "ordershipped".to_string())]
    );

    let (_, second_rx) = watch::channel(false);
    assert!(matches!(
        bus.start(second_rx).await,
        Err(BusError::AlreadyStarted)
    ));

    shutdown_tx.send(true).expect("runner listening");
    timeout(Duration::from_secs(1), runner)
        .await
        .expect("runner stops")
        .expect("runner joins")
        .expect("clean shutdown");
    assert_eq!(bus.status(), BusStatus::Stopped);
}

/// A resolved message lock suppresses redelivery and feeds the monitor.
#[tokio::test]
async fn test_resolved_lock_and_metrics_on_redelivery() {
    let transport = InMemoryTransport::new();
    let ledger = Arc::new(OrderLedger::default());
    let handlers = handlers_for_all(&ledger);
    let registry = full_registry(&transport);
    registry.register::<Arc<dyn MessageLock>>(Arc::new(InMemoryMessageLock::new()));
    let monitor = Arc::new(PrometheusMonitor::new("courier_e2e").expect("metrics"));
    let scrape = Arc::clone(&monitor);

    let mut assembler = BusAssembler::new();
    assembler
        .with_service_resolver(Arc::new(registry))
        .with_monitoring(move || monitor as Arc<dyn MessageMonitor>)
        .services(|s| {
            s.with_handler_resolver(move || handlers as Arc<dyn HandlerResolver>);
            Ok(())
        })
        .unwrap()
        .subscriptions(|s| {
            s.add_subscription::<OrderPlaced, _>(|spec| {
                spec.with_message_lock_timeout(Duration::from_secs(60))?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();
    let bus = assembler.build().expect("assembles");
    assert!(bus.has_message_lock());

    let consumer = bus.consumer_for("OrderPlaced").expect("bound");
    let message_id = Uuid::new_v4().to_string();
    let body = body_for("OrderPlaced", 7);

    let first = consumer.handle(&message_id, &body).await.expect("handled");
    let second = consumer.handle(&message_id, &body).await.expect("skipped");

    assert_eq!(first, HandleOutcome::Handled);
    assert_eq!(second, HandleOutcome::Duplicate);
    assert_eq!(ledger.calls.load(Ordering::SeqCst), 1);

    let exposition = scrape.encode().expect("encodes");
    assert!(exposition.contains("courier_e2e_consumers_registered_total"));
    assert!(exposition.contains("courier_e2e_message_lock_contentions_total"));
}
