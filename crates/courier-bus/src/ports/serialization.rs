//! Serialization ports.
//!
//! Payloads cross these boundaries as `serde_json::Value` so codecs can be
//! stored behind trait objects regardless of the concrete message type.

use std::sync::Arc;

use serde_json::Value;

use crate::error::SerializationError;
use crate::message::MessageType;

/// Encodes and decodes one message type.
pub trait MessageSerializer: Send + Sync {
    fn serialize(&self, message: &Value) -> Result<String, SerializationError>;

    fn deserialize(&self, body: &str) -> Result<Value, SerializationError>;
}

/// Chooses a codec for a message type.
pub trait SerializationFactory: Send + Sync {
    fn create_serializer(&self, message_type: &MessageType) -> Arc<dyn MessageSerializer>;
}

/// Type-to-codec binding table owned by the bus core.
pub trait SerializationRegister: Send + Sync {
    /// Bind `serializer` to `message_type`, replacing any earlier binding.
    ///
    /// Bindings are per type, not per name: two types sharing a short name
    /// keep separate codecs.
    fn add_serializer(&self, message_type: MessageType, serializer: Arc<dyn MessageSerializer>);

    fn serializer_for(&self, message_type: &MessageType) -> Option<Arc<dyn MessageSerializer>>;

    /// Number of bound types.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
