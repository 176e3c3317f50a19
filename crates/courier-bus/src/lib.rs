//! # Courier Bus - Message Bus Core and Collaborator Ports
//!
//! The bus core that `courier-assembly` composes, the traits for every
//! collaborator it consumes, and reference in-memory adapters.
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────────┐   attach collaborators   ┌──────────────────┐
//! │    MessageBus    │ ───────────────────────→ │  BusConfigurator │
//! │ config, register │                          │  add_consumer()  │
//! └──────────────────┘                          └────────┬─────────┘
//!                                                        │ build()
//!                                                        ▼
//!                                               ┌──────────────────┐
//!                                               │   AssembledBus   │
//!                                               │ start(shutdown)  │
//!                                               └──────────────────┘
//! ```
//!
//! ## Ports
//!
//! - **Observability:** `LoggerFactory`, `MessageMonitor`
//! - **Serialization:** `SerializationFactory`, `SerializationRegister`
//! - **Transport:** `ClientFactory`, `TransportClient`, `MessageLock`
//! - **Handling:** `HandlerResolver`, `NamingStrategy`

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod bus;
pub mod config;
pub mod configurator;
pub mod consumer;
pub mod error;
pub mod message;
pub mod ports;
pub mod resources;
pub mod runtime;

// Re-export main types
pub use bus::MessageBus;
pub use config::{ConfigError, MessagingConfig, MAX_PUBLISH_REATTEMPTS};
pub use configurator::BusConfigurator;
pub use consumer::{
    Consumer, ConsumerBinding, HandleOutcome, SubscriptionKind, SubscriptionOptions,
    DEFAULT_MAX_CONCURRENCY, DEFAULT_MESSAGE_LOCK_TIMEOUT, MAX_PREFETCH,
};
pub use error::{BusError, HandlerError, SerializationError, TransportError};
pub use message::{Message, MessageType};
pub use resources::{ClientFactoryProxy, QueueCreator};
pub use runtime::{AssembledBus, BusStatus};
