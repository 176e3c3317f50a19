//! # Ports
//!
//! Every collaborator the bus consumes but does not implement. The assembly
//! layer resolves one implementation per port, either from an explicit
//! override or from a capability resolver, and hands it to the bus.
//!
//! Reference implementations live in [`crate::adapters`].

pub mod handling;
pub mod observability;
pub mod serialization;
pub mod transport;

pub use handling::{Handler, HandlerResolver, MessageHandler, NamingStrategy};
pub use observability::{LogLevel, Logger, LoggerFactory, MessageMonitor};
pub use serialization::{MessageSerializer, SerializationFactory, SerializationRegister};
pub use transport::{ClientFactory, ClientSettings, Credentials, MessageLock, TransportClient};
