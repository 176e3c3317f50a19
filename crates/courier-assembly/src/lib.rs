//! # Courier Assembly
//!
//! Composes an [`AssembledBus`](courier_bus::AssembledBus) from pluggable,
//! optionally overridden components.
//!
//! ## Override or Resolve
//!
//! Every collaborator the bus needs is either supplied explicitly through a
//! `with_*` call or looked up from a [`CapabilityResolver`]. An explicit
//! factory always wins and the resolver is never asked; an unset concern
//! costs exactly one lookup per build.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                         BusAssembler                          │
//! │                                                               │
//! │  ClientBuilder   MessagingConfigBuilder   ServicesBuilder     │
//! │        │                  │                     │             │
//! │        │                  ▼                     │             │
//! │        │            validate() ──✗──→ ConfigurationInvalid    │
//! │        │                  │                     │             │
//! │        └──────────┬───────┴─────────────────────┘             │
//! │                   ▼                                           │
//! │          override-or-resolve ──✗──→ UnsatisfiedDependency     │
//! │                   │                                           │
//! │                   ▼                                           │
//! │   MessageBus → BusConfigurator → SubscriptionsBuilder         │
//! │                                        │                      │
//! └────────────────────────────────────────┼──────────────────────┘
//!                                          ▼
//!                                    AssembledBus
//! ```

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::new_without_default)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod assembler;
pub mod builders;
pub mod capability;
pub mod component;
pub mod error;
pub mod subscriptions;

// Re-export main types
pub use assembler::{AssemblyStage, BusAssembler};
pub use builders::{ClientBuilder, MessagingConfigBuilder, ServicesBuilder};
pub use capability::{
    resolve_optional, resolve_required, Capability, CapabilityRegistry, CapabilityResolver,
    NullCapabilityResolver, Provider, RecordingResolver, Resolvable,
};
pub use component::ComponentOverride;
pub use error::{AssemblyError, AssemblyErrorKind};
pub use subscriptions::{SubscriptionSpec, SubscriptionsBuilder};
