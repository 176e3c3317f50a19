//! # Messaging Configuration
//!
//! The validated settings a bus is constructed with. The constraints live
//! here, next to the data; whoever builds a `MessagingConfig` only has to
//! call [`MessagingConfig::validate`] before using it.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on publish retries.
pub const MAX_PUBLISH_REATTEMPTS: u32 = 10;

/// Length of a subscriber account identifier.
pub const ACCOUNT_ID_LENGTH: usize = 12;

/// Messaging configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("configuration must set a region")]
    MissingRegion,

    #[error("configuration has an invalid region: {0}")]
    InvalidRegion(String),

    #[error("publish failure reattempts {count} exceeds maximum of {max}")]
    TooManyPublishReattempts { count: u32, max: u32 },

    #[error("publish failure backoff must be non-zero when reattempts are enabled")]
    ZeroPublishBackoff,

    #[error("additional subscriber account is not a 12-digit id: {0}")]
    InvalidSubscriberAccount(String),
}

/// Settings shared by every component of an assembled bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagingConfig {
    /// Cloud region the transport lives in, e.g. `eu-west-1`.
    pub region: String,
    /// How many times a failed publish is retried.
    pub publish_failure_reattempts: u32,
    /// Delay between publish retries.
    pub publish_failure_backoff: Duration,
    /// Extra accounts allowed to subscribe to topics this bus creates.
    pub additional_subscriber_accounts: Vec<String>,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            region: String::new(),
            publish_failure_reattempts: 0,
            publish_failure_backoff: Duration::from_millis(100),
            additional_subscriber_accounts: Vec::new(),
        }
    }
}

impl MessagingConfig {
    /// Configuration for `region` with every other field defaulted.
    #[must_use]
    pub fn for_region(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..Self::default()
        }
    }

    /// Check every constraint, reporting the first one violated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region.trim().is_empty() {
            return Err(ConfigError::MissingRegion);
        }
        if !is_region_identifier(&self.region) {
            return Err(ConfigError::InvalidRegion(self.region.clone()));
        }

        if self.publish_failure_reattempts > MAX_PUBLISH_REATTEMPTS {
            return Err(ConfigError::TooManyPublishReattempts {
                count: self.publish_failure_reattempts,
                max: MAX_PUBLISH_REATTEMPTS,
            });
        }
        if self.publish_failure_reattempts > 0 && self.publish_failure_backoff.is_zero() {
            return Err(ConfigError::ZeroPublishBackoff);
        }

        if let Some(account) = self
            .additional_subscriber_accounts
            .iter()
            .find(|account| !is_account_id(account))
        {
            return Err(ConfigError::InvalidSubscriberAccount(account.clone()));
        }

        Ok(())
    }
}

/// `<letters>-<letters>[-<letters>...]-<digits>`, lower case.
pub fn is_region_identifier(region: &str) -> bool {
    let segments: Vec<&str> = region.split('-').collect();
    let Some((last, rest)) = segments.split_last() else {
        return false;
    };
    rest.len() >= 2
        && rest
            .iter()
            .all(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_lowercase()))
        && !last.is_empty()
        && last.chars().all(|c| c.is_ascii_digit())
}

fn is_account_id(account: &str) -> bool {
    account.len() == ACCOUNT_ID_LENGTH && account.chars().all(|c| c.is_ascii_digit())
}
