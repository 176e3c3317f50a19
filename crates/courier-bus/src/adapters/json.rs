//! JSON codec.
//!
//! Bodies are wrapped in a small envelope carrying the message type so a
//! body delivered to the wrong consumer is caught at decode time:
//!
//! ```json
//! { "subject": "OrderPlaced", "message": { "order_id": 42 } }
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SerializationError;
use crate::message::MessageType;
use crate::ports::{MessageSerializer, SerializationFactory};

#[derive(Serialize, Deserialize)]
struct Envelope {
    subject: String,
    message: Value,
}

/// JSON serializer for one message type.
#[derive(Debug, Clone)]
pub struct JsonMessageSerializer {
    subject: String,
}

impl JsonMessageSerializer {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

impl MessageSerializer for JsonMessageSerializer {
    fn serialize(&self, message: &Value) -> Result<String, SerializationError> {
        let envelope = Envelope {
            subject: self.subject.clone(),
            message: message.clone(),
        };
        serde_json::to_string(&envelope).map_err(|e| SerializationError::Encode {
            message_type: self.subject.clone(),
            reason: e.to_string(),
        })
    }

    fn deserialize(&self, body: &str) -> Result<Value, SerializationError> {
        let envelope: Envelope =
            serde_json::from_str(body).map_err(|e| SerializationError::Decode {
                message_type: self.subject.clone(),
                reason: e.to_string(),
            })?;

        if envelope.subject != self.subject {
            return Err(SerializationError::Decode {
                message_type: self.subject.clone(),
                reason: format!("envelope subject is {}", envelope.subject),
            });
        }
        Ok(envelope.message)
    }
}

/// Hands out a [`JsonMessageSerializer`] per message type.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSerializationFactory;

impl SerializationFactory for JsonSerializationFactory {
    fn create_serializer(&self, message_type: &MessageType) -> Arc<dyn MessageSerializer> {
        Arc::new(JsonMessageSerializer::new(message_type.short_name()))
    }
}
