//! Handler resolution and resource naming ports.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::HandlerError;
use crate::message::{Message, MessageType};

/// Type-erased handler stored on a consumer.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: Value) -> Result<(), HandlerError>;
}

/// Strongly typed handler for `T`.
///
/// Register these with [`crate::adapters::HandlerRegistry`], which erases
/// them into [`MessageHandler`]s.
#[async_trait]
pub trait Handler<T: Message>: Send + Sync {
    async fn handle(&self, message: T) -> Result<(), HandlerError>;
}

/// Finds the handler for a message type at assembly time.
pub trait HandlerResolver: Send + Sync {
    /// `None` when nothing handles `message_type`.
    fn resolve_handler(&self, message_type: &MessageType) -> Option<Arc<dyn MessageHandler>>;
}

/// Derives transport resource names from message types.
pub trait NamingStrategy: Send + Sync {
    fn queue_name(&self, message_type: &MessageType) -> String;

    fn topic_name(&self, message_type: &MessageType) -> String;
}
