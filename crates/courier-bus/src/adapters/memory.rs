//! In-memory transport, lock and serialization register.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::error::TransportError;
use crate::message::MessageType;
use crate::ports::{
    ClientFactory, ClientSettings, MessageLock, MessageSerializer, SerializationRegister,
    TransportClient,
};

#[derive(Default)]
struct TransportState {
    queues: Vec<String>,
    topics: Vec<String>,
    subscriptions: Vec<(String, String)>,
    rejected_queues: HashSet<String>,
}

/// Transport that keeps its queues and topics in process memory.
///
/// Acts as both the client factory and the client. Every client handed out
/// shares the same state, so resources created through one are visible
/// through the others and through the inspection methods below.
#[derive(Clone, Default)]
pub struct InMemoryTransport {
    state: Arc<RwLock<TransportState>>,
    clients_created: Arc<AtomicUsize>,
    last_settings: Arc<RwLock<Option<ClientSettings>>>,
}

impl InMemoryTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make creation of `queue` fail.
    pub fn reject_queue(&self, queue: impl Into<String>) {
        self.state.write().rejected_queues.insert(queue.into());
    }

    /// Queues in creation order.
    #[must_use]
    pub fn queues(&self) -> Vec<String> {
        self.state.read().queues.clone()
    }

    /// Topics in creation order.
    #[must_use]
    pub fn topics(&self) -> Vec<String> {
        self.state.read().topics.clone()
    }

    /// `(topic, queue)` pairs in subscription order.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<(String, String)> {
        self.state.read().subscriptions.clone()
    }

    /// How many clients have been created.
    #[must_use]
    pub fn clients_created(&self) -> usize {
        self.clients_created.load(Ordering::Relaxed)
    }

    /// Settings passed to the most recent `create_client` call.
    #[must_use]
    pub fn last_settings(&self) -> Option<ClientSettings> {
        self.last_settings.read().clone()
    }
}

impl ClientFactory for InMemoryTransport {
    fn create_client(
        &self,
        settings: &ClientSettings,
    ) -> Result<Arc<dyn TransportClient>, TransportError> {
        self.clients_created.fetch_add(1, Ordering::Relaxed);
        *self.last_settings.write() = Some(settings.clone());
        debug!(region = %settings.region, "In-memory transport client created");
        Ok(Arc::new(self.clone()))
    }
}

#[async_trait]
impl TransportClient for InMemoryTransport {
    async fn queue_exists(&self, queue: &str) -> Result<bool, TransportError> {
        Ok(self.state.read().queues.iter().any(|q| q == queue))
    }

    async fn create_queue(&self, queue: &str) -> Result<(), TransportError> {
        let mut state = self.state.write();
        if state.rejected_queues.contains(queue) {
            return Err(TransportError::QueueCreation(queue.to_string()));
        }
        if !state.queues.iter().any(|q| q == queue) {
            state.queues.push(queue.to_string());
        }
        Ok(())
    }

    async fn create_topic(&self, topic: &str) -> Result<(), TransportError> {
        let mut state = self.state.write();
        if !state.topics.iter().any(|t| t == topic) {
            state.topics.push(topic.to_string());
        }
        Ok(())
    }

    async fn subscribe_queue_to_topic(
        &self,
        topic: &str,
        queue: &str,
    ) -> Result<(), TransportError> {
        let mut state = self.state.write();
        let known = state.topics.iter().any(|t| t == topic) && state.queues.iter().any(|q| q == queue);
        if !known {
            return Err(TransportError::Subscription {
                topic: topic.to_string(),
                queue: queue.to_string(),
            });
        }
        state
            .subscriptions
            .push((topic.to_string(), queue.to_string()));
        Ok(())
    }
}

/// Process-local message lock with expiring holds.
#[derive(Default)]
pub struct InMemoryMessageLock {
    holds: Mutex<HashMap<String, Instant>>,
}

impl InMemoryMessageLock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked holds, expired ones not yet evicted included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.holds.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.holds.lock().is_empty()
    }

    /// Whether `key` is currently held.
    #[must_use]
    pub fn is_held(&self, key: &str) -> bool {
        self.holds
            .lock()
            .get(key)
            .is_some_and(|expiry| *expiry > Instant::now())
    }
}

impl MessageLock for InMemoryMessageLock {
    fn try_acquire(&self, key: &str, hold_for: Duration) -> bool {
        let now = Instant::now();
        let mut holds = self.holds.lock();
        if holds.get(key).is_some_and(|expiry| *expiry > now) {
            return false;
        }
        holds.retain(|_, expiry| *expiry > now);
        holds.insert(key.to_string(), now + hold_for);
        true
    }

    fn release(&self, key: &str) {
        self.holds.lock().remove(key);
    }
}

/// Serialization register keyed by message type.
#[derive(Default)]
pub struct InMemorySerializationRegister {
    serializers: RwLock<HashMap<MessageType, Arc<dyn MessageSerializer>>>,
}

impl InMemorySerializationRegister {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SerializationRegister for InMemorySerializationRegister {
    fn add_serializer(&self, message_type: MessageType, serializer: Arc<dyn MessageSerializer>) {
        self.serializers.write().insert(message_type, serializer);
    }

    fn serializer_for(&self, message_type: &MessageType) -> Option<Arc<dyn MessageSerializer>> {
        self.serializers.read().get(message_type).cloned()
    }

    fn len(&self) -> usize {
        self.serializers.read().len()
    }
}
