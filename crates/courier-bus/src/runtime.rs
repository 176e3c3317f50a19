//! # Assembled Bus
//!
//! The runtime object handed to a hosting process. It owns the bus core and
//! every resolved collaborator; nothing else holds on to them.
//!
//! ## Lifecycle
//!
//! ```text
//! Assembled ──start()──→ Starting ──resources ready──→ Running ──shutdown──→ Stopped
//!                            │
//!                            └──transport error──→ Failed
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{error, info};

use crate::bus::MessageBus;
use crate::config::MessagingConfig;
use crate::consumer::Consumer;
use crate::error::BusError;
use crate::ports::{
    ClientSettings, Logger, MessageMonitor, NamingStrategy, SerializationFactory,
    SerializationRegister,
};
use crate::resources::QueueCreator;

/// Where an assembled bus is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusStatus {
    Assembled,
    Starting,
    Running,
    Stopped,
    Failed,
}

impl BusStatus {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Assembled => "assembled",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for BusStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub(crate) struct RuntimeParts {
    pub bus: MessageBus,
    pub queue_creator: QueueCreator,
    pub serialization_factory: Arc<dyn SerializationFactory>,
    pub monitor: Arc<dyn MessageMonitor>,
    pub naming_strategy: Arc<dyn NamingStrategy>,
    pub logger: Arc<dyn Logger>,
}

/// A fully configured bus, ready to start.
pub struct AssembledBus {
    bus: MessageBus,
    queue_creator: QueueCreator,
    serialization_factory: Arc<dyn SerializationFactory>,
    monitor: Arc<dyn MessageMonitor>,
    naming_strategy: Arc<dyn NamingStrategy>,
    logger: Arc<dyn Logger>,
    status: RwLock<BusStatus>,
}

impl AssembledBus {
    pub(crate) fn new(parts: RuntimeParts) -> Self {
        Self {
            bus: parts.bus,
            queue_creator: parts.queue_creator,
            serialization_factory: parts.serialization_factory,
            monitor: parts.monitor,
            naming_strategy: parts.naming_strategy,
            logger: parts.logger,
            status: RwLock::new(BusStatus::Assembled),
        }
    }

    #[must_use]
    pub fn config(&self) -> &MessagingConfig {
        self.bus.config()
    }

    /// Consumers in registration order.
    #[must_use]
    pub fn consumers(&self) -> &[Consumer] {
        self.bus.consumers()
    }

    /// Consumer bound to the message type with short name `message_type`.
    #[must_use]
    pub fn consumer_for(&self, message_type: &str) -> Option<&Consumer> {
        self.consumers()
            .iter()
            .find(|c| c.message_type() == message_type)
    }

    #[must_use]
    pub fn status(&self) -> BusStatus {
        *self.status.read()
    }

    #[must_use]
    pub fn client_settings(&self) -> &ClientSettings {
        self.queue_creator.client().settings()
    }

    #[must_use]
    pub fn serialization_register(&self) -> &Arc<dyn SerializationRegister> {
        self.bus.serialization_register()
    }

    #[must_use]
    pub fn serialization_factory(&self) -> &Arc<dyn SerializationFactory> {
        &self.serialization_factory
    }

    #[must_use]
    pub fn monitor(&self) -> &Arc<dyn MessageMonitor> {
        &self.monitor
    }

    #[must_use]
    pub fn naming_strategy(&self) -> &Arc<dyn NamingStrategy> {
        &self.naming_strategy
    }

    #[must_use]
    pub fn has_message_lock(&self) -> bool {
        self.bus.message_lock().is_some()
    }

    /// Provision transport resources and run until `shutdown` turns true.
    ///
    /// Resources are ensured consumer by consumer in registration order. A
    /// dropped shutdown sender is treated as a shutdown request.
    ///
    /// # Errors
    ///
    /// [`BusError::AlreadyStarted`] if the bus has left the `Assembled`
    /// state, or the transport error that stopped provisioning.
    pub async fn start(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), BusError> {
        {
            let mut status = self.status.write();
            if *status != BusStatus::Assembled {
                return Err(BusError::AlreadyStarted);
            }
            *status = BusStatus::Starting;
        }
        info!(consumers = self.consumers().len(), "[Bus] Starting");

        for consumer in self.consumers() {
            if let Err(e) = self.queue_creator.ensure_resources(consumer).await {
                error!(queue = %consumer.queue_name(), error = %e, "[Bus] Resource provisioning failed");
                *self.status.write() = BusStatus::Failed;
                return Err(e);
            }
        }

        *self.status.write() = BusStatus::Running;
        self.logger.info("Bus running");
        info!(region = %self.config().region, "[Bus] Running");

        loop {
            let stop = *shutdown.borrow_and_update();
            if stop || shutdown.changed().await.is_err() {
                break;
            }
        }

        *self.status.write() = BusStatus::Stopped;
        self.logger.info("Bus stopped");
        info!("[Bus] Stopped");
        Ok(())
    }
}

impl fmt::Debug for AssembledBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssembledBus")
            .field("bus", &self.bus)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
