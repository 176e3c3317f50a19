//! Assembly errors.

use courier_bus::{BusError, ConfigError};
use thiserror::Error;

use crate::capability::Capability;

/// The three ways an assembly can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyErrorKind {
    /// A setter was given a blank, zero or out-of-range value.
    InvalidArgument,
    /// A required collaborator could not be obtained.
    UnsatisfiedDependency,
    /// The messaging configuration or the bus it describes is inconsistent.
    ConfigurationInvalid,
}

/// Errors raised while configuring or assembling a bus.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("invalid argument `{argument}`: {reason}")]
    InvalidArgument {
        argument: &'static str,
        reason: String,
    },

    #[error("unsatisfied dependency: no provider for {capability}")]
    UnsatisfiedDependency { capability: Capability },

    #[error("unsatisfied dependency: provider registered for {expected} is a {found}")]
    ProviderMismatch {
        expected: Capability,
        found: Capability,
    },

    #[error("unsatisfied dependency: no handler for message type {message_type}")]
    HandlerNotFound { message_type: String },

    #[error("configuration invalid: {0}")]
    ConfigurationInvalid(#[from] ConfigError),

    #[error("bus construction failed: {0}")]
    Bus(#[from] BusError),
}

impl AssemblyError {
    pub(crate) fn invalid_argument(argument: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> AssemblyErrorKind {
        match self {
            Self::InvalidArgument { .. } => AssemblyErrorKind::InvalidArgument,
            Self::UnsatisfiedDependency { .. }
            | Self::ProviderMismatch { .. }
            | Self::HandlerNotFound { .. }
            | Self::Bus(BusError::MissingComponent(_)) => AssemblyErrorKind::UnsatisfiedDependency,
            Self::ConfigurationInvalid(_) | Self::Bus(_) => AssemblyErrorKind::ConfigurationInvalid,
        }
    }
}
