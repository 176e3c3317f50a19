//! In-memory handler resolver.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::error::HandlerError;
use crate::message::{Message, MessageType};
use crate::ports::{Handler, HandlerResolver, MessageHandler};

/// Erases a [`Handler<T>`] into a [`MessageHandler`].
pub struct TypedHandler<T, H> {
    inner: H,
    _message: PhantomData<fn(T)>,
}

impl<T, H> TypedHandler<T, H>
where
    T: Message,
    H: Handler<T>,
{
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            _message: PhantomData,
        }
    }
}

#[async_trait]
impl<T, H> MessageHandler for TypedHandler<T, H>
where
    T: Message,
    H: Handler<T>,
{
    async fn handle(&self, message: Value) -> Result<(), HandlerError> {
        let typed: T = serde_json::from_value(message).map_err(|e| {
            HandlerError::Rejected(format!(
                "payload is not a {}: {e}",
                MessageType::of::<T>().short_name()
            ))
        })?;
        self.inner.handle(typed).await
    }
}

/// Handler resolver backed by a type-keyed map.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<MessageType, Arc<dyn MessageHandler>>>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for `T`, replacing any earlier one.
    pub fn register<T, H>(&self, handler: H)
    where
        T: Message,
        H: Handler<T> + 'static,
    {
        let message_type = MessageType::of::<T>();
        debug!(message_type = %message_type, "Handler registered");
        self.handlers
            .write()
            .insert(message_type, Arc::new(TypedHandler::<T, H>::new(handler)));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }
}

impl HandlerResolver for HandlerRegistry {
    fn resolve_handler(&self, message_type: &MessageType) -> Option<Arc<dyn MessageHandler>> {
        self.handlers.read().get(message_type).cloned()
    }
}
