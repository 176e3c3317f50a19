//! # Transport Resources
//!
//! [`ClientFactoryProxy`] defers client creation until the first caller
//! needs a client and then hands out the same one. [`QueueCreator`] makes
//! sure the queues and topics a consumer reads from exist.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::consumer::{Consumer, SubscriptionKind};
use crate::error::{BusError, TransportError};
use crate::ports::{ClientFactory, ClientSettings, Logger, LoggerFactory, TransportClient};

/// Logger category used while provisioning transport resources.
pub const RESOURCES_LOG_CATEGORY: &str = "courier.resources";

/// Lazily created, cached transport client.
pub struct ClientFactoryProxy {
    factory: Arc<dyn ClientFactory>,
    settings: ClientSettings,
    client: Mutex<Option<Arc<dyn TransportClient>>>,
}

impl ClientFactoryProxy {
    pub fn new(factory: Arc<dyn ClientFactory>, settings: ClientSettings) -> Self {
        Self {
            factory,
            settings,
            client: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Whether a client has been created yet.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.client.lock().is_some()
    }

    /// The shared client, created on first use.
    ///
    /// A failed creation is not cached; the next call tries again.
    pub fn client(&self) -> Result<Arc<dyn TransportClient>, TransportError> {
        let mut slot = self.client.lock();
        if let Some(client) = slot.as_ref() {
            return Ok(Arc::clone(client));
        }

        let client = self.factory.create_client(&self.settings)?;
        debug!(region = %self.settings.region, "[Resources] Transport client created");
        *slot = Some(Arc::clone(&client));
        Ok(client)
    }
}

impl std::fmt::Debug for ClientFactoryProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientFactoryProxy")
            .field("settings", &self.settings)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

/// Verifies and creates the queues and topics consumers depend on.
pub struct QueueCreator {
    client: Arc<ClientFactoryProxy>,
    logger: Arc<dyn Logger>,
}

impl QueueCreator {
    pub fn new(client: Arc<ClientFactoryProxy>, logger_factory: &dyn LoggerFactory) -> Self {
        Self {
            client,
            logger: logger_factory.create_logger(RESOURCES_LOG_CATEGORY),
        }
    }

    #[must_use]
    pub fn client(&self) -> &Arc<ClientFactoryProxy> {
        &self.client
    }

    /// Create the consumer's queue if missing and, for topic subscriptions,
    /// the topic and the queue's subscription to it.
    pub async fn ensure_resources(&self, consumer: &Consumer) -> Result<(), BusError> {
        let client = self.client.client()?;
        let queue = consumer.queue_name();

        if client.queue_exists(queue).await? {
            debug!(queue, "[Resources] Queue exists");
        } else {
            client.create_queue(queue).await?;
            info!(queue, "[Resources] Queue created");
            self.logger.info(&format!("Created queue {queue}"));
        }

        if consumer.kind() == SubscriptionKind::Topic {
            if let Some(topic) = consumer.topic_name() {
                client.create_topic(topic).await?;
                client.subscribe_queue_to_topic(topic, queue).await?;
                info!(topic, queue, "[Resources] Queue subscribed to topic");
            }
        }
        Ok(())
    }
}
