//! # Message Types
//!
//! A message type is only ever used as a tag while the bus is being
//! configured. Consumers keep its name, never the Rust type itself.

use std::any::TypeId;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Marker trait for anything that can travel over the bus.
///
/// Blanket-implemented for every serde-capable, thread-safe type.
pub trait Message: Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> Message for T where T: Serialize + DeserializeOwned + Send + Sync + 'static {}

/// Configuration-time tag identifying a message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageType {
    id: TypeId,
    full_name: &'static str,
}

impl MessageType {
    /// Tag for `T`.
    #[must_use]
    pub fn of<T: Message>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            full_name: std::any::type_name::<T>(),
        }
    }

    /// Fully qualified Rust path of the type.
    #[must_use]
    pub fn full_name(&self) -> &'static str {
        self.full_name
    }

    /// Last path segment, with generic arguments stripped.
    ///
    /// `my_app::events::OrderPlaced` becomes `OrderPlaced`.
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        let without_generics = match self.full_name.find('<') {
            Some(idx) => &self.full_name[..idx],
            None => self.full_name,
        };
        without_generics
            .rsplit("::")
            .next()
            .unwrap_or(without_generics)
    }

    /// Whether this tag refers to `T`.
    #[must_use]
    pub fn is<T: Message>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}
