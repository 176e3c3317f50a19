//! Transport ports: client creation, resource verification and locking.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;

/// Static credentials for a transport client.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Everything a client factory needs to open a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientSettings {
    /// Region the client targets.
    pub region: String,
    /// Overrides the regional endpoint (local emulators, private links).
    pub service_url: Option<String>,
    /// Static credentials; `None` defers to the factory's own chain.
    pub credentials: Option<Credentials>,
}

/// Creates transport clients.
pub trait ClientFactory: Send + Sync {
    fn create_client(
        &self,
        settings: &ClientSettings,
    ) -> Result<Arc<dyn TransportClient>, TransportError>;
}

/// Queue and topic management on the underlying transport.
#[async_trait]
pub trait TransportClient: Send + Sync {
    async fn queue_exists(&self, queue: &str) -> Result<bool, TransportError>;

    async fn create_queue(&self, queue: &str) -> Result<(), TransportError>;

    async fn create_topic(&self, topic: &str) -> Result<(), TransportError>;

    async fn subscribe_queue_to_topic(&self, topic: &str, queue: &str)
        -> Result<(), TransportError>;
}

/// Distributed lock used to deduplicate deliveries.
pub trait MessageLock: Send + Sync {
    /// Try to take `key` for `hold_for`. Returns `false` if someone else holds it.
    fn try_acquire(&self, key: &str, hold_for: Duration) -> bool;

    /// Give `key` back before its hold expires.
    fn release(&self, key: &str);
}
