//! Error types for the bus core and its collaborators

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while constructing or running a bus.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("required component not attached: {0}")]
    MissingComponent(&'static str),

    #[error("queue {queue} is already bound to message type {existing}")]
    DuplicateQueue { queue: String, existing: String },

    #[error("bus has already been started")]
    AlreadyStarted,

    #[error("no serializer registered for message type {0}")]
    NoSerializer(String),

    #[error("invalid messaging configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("serialization error: {0}")]
    Serialization(#[from] SerializationError),

    #[error("handler error: {0}")]
    Handler(#[from] HandlerError),
}

/// Errors reported by a transport client or client factory.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("client could not be created: {0}")]
    ClientCreation(String),

    #[error("queue {0} could not be created")]
    QueueCreation(String),

    #[error("topic {0} could not be created")]
    TopicCreation(String),

    #[error("queue {queue} could not be subscribed to topic {topic}")]
    Subscription { topic: String, queue: String },
}

/// Errors from message codecs.
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("failed to encode {message_type}: {reason}")]
    Encode { message_type: String, reason: String },

    #[error("failed to decode {message_type}: {reason}")]
    Decode { message_type: String, reason: String },
}

/// Errors returned by message handlers.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("handler rejected message: {0}")]
    Rejected(String),

    #[error("handler failed: {0}")]
    Failed(String),
}
