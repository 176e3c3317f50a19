//! # Adapters
//!
//! Reference implementations of the [`crate::ports`] traits. The in-memory
//! variants are suitable for single-process use and tests; production
//! deployments register their own implementations with the assembler.

pub mod defaults;
pub mod handlers;
pub mod json;
pub mod memory;

pub use defaults::{DefaultNamingStrategy, NoOpLoggerFactory, NoOpMonitor};
pub use handlers::{HandlerRegistry, TypedHandler};
pub use json::{JsonMessageSerializer, JsonSerializationFactory};
pub use memory::{InMemoryMessageLock, InMemorySerializationRegister, InMemoryTransport};
