//! Messaging configuration builder.

use std::time::Duration;

use courier_bus::{MessagingConfig, MAX_PUBLISH_REATTEMPTS};

use super::non_blank;
use crate::error::AssemblyError;

/// Region the bus runs in.
pub const ENV_REGION: &str = "COURIER_REGION";
/// Publish retry count.
pub const ENV_PUBLISH_REATTEMPTS: &str = "COURIER_PUBLISH_REATTEMPTS";
/// Delay between publish retries, in milliseconds.
pub const ENV_PUBLISH_BACKOFF_MS: &str = "COURIER_PUBLISH_BACKOFF_MS";

/// Accumulates messaging settings across configuration calls.
///
/// Unset fields take the [`MessagingConfig`] defaults. Cross-field rules are
/// checked by [`MessagingConfig::validate`] when the bus is assembled.
#[derive(Debug, Clone, Default)]
pub struct MessagingConfigBuilder {
    region: Option<String>,
    publish_failure_reattempts: Option<u32>,
    publish_failure_backoff: Option<Duration>,
    additional_subscriber_accounts: Vec<String>,
}

impl MessagingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder seeded with every field of `config`.
    pub fn from_config(config: MessagingConfig) -> Self {
        Self {
            region: Some(config.region),
            publish_failure_reattempts: Some(config.publish_failure_reattempts),
            publish_failure_backoff: Some(config.publish_failure_backoff),
            additional_subscriber_accounts: config.additional_subscriber_accounts,
        }
    }

    /// Builder seeded from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `COURIER_REGION`: Region
    /// - `COURIER_PUBLISH_REATTEMPTS`: Publish retry count
    /// - `COURIER_PUBLISH_BACKOFF_MS`: Delay between publish retries
    ///
    /// Unset variables leave the field unset; unparsable ones are rejected.
    pub fn from_env() -> Result<Self, AssemblyError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<L>(lookup: L) -> Result<Self, AssemblyError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::new();

        if let Some(region) = lookup(ENV_REGION) {
            builder.with_region(&region)?;
        }
        if let Some(raw) = lookup(ENV_PUBLISH_REATTEMPTS) {
            let count = raw.trim().parse().map_err(|_| {
                AssemblyError::invalid_argument(
                    "publish_failure_reattempts",
                    format!("{ENV_PUBLISH_REATTEMPTS}={raw} is not a number"),
                )
            })?;
            builder.with_publish_failure_reattempts(count)?;
        }
        if let Some(raw) = lookup(ENV_PUBLISH_BACKOFF_MS) {
            let millis = raw.trim().parse().map_err(|_| {
                AssemblyError::invalid_argument(
                    "publish_failure_backoff",
                    format!("{ENV_PUBLISH_BACKOFF_MS}={raw} is not a number"),
                )
            })?;
            builder.with_publish_failure_backoff(Duration::from_millis(millis))?;
        }

        Ok(builder)
    }

    pub fn with_region(&mut self, region: &str) -> Result<&mut Self, AssemblyError> {
        self.region = Some(non_blank("region", region)?);
        Ok(self)
    }

    pub fn with_publish_failure_reattempts(&mut self, count: u32) -> Result<&mut Self, AssemblyError> {
        if count > MAX_PUBLISH_REATTEMPTS {
            return Err(AssemblyError::invalid_argument(
                "publish_failure_reattempts",
                format!("{count} exceeds maximum of {MAX_PUBLISH_REATTEMPTS}"),
            ));
        }
        self.publish_failure_reattempts = Some(count);
        Ok(self)
    }

    pub fn with_publish_failure_backoff(
        &mut self,
        backoff: Duration,
    ) -> Result<&mut Self, AssemblyError> {
        if backoff.is_zero() {
            return Err(AssemblyError::invalid_argument(
                "publish_failure_backoff",
                "must be non-zero",
            ));
        }
        self.publish_failure_backoff = Some(backoff);
        Ok(self)
    }

    /// Allow another account to subscribe to topics this bus creates.
    pub fn with_additional_subscriber_account(
        &mut self,
        account: &str,
    ) -> Result<&mut Self, AssemblyError> {
        let account = non_blank("additional_subscriber_account", account)?;
        if !self.additional_subscriber_accounts.contains(&account) {
            self.additional_subscriber_accounts.push(account);
        }
        Ok(self)
    }

    /// The configuration as set so far. Not validated.
    #[must_use]
    pub fn build(&self) -> MessagingConfig {
        let defaults = MessagingConfig::default();

        MessagingConfig {
            region: self.region.clone().unwrap_or(defaults.region),
            publish_failure_reattempts: self
                .publish_failure_reattempts
                .unwrap_or(defaults.publish_failure_reattempts),
            publish_failure_backoff: self
                .publish_failure_backoff
                .unwrap_or(defaults.publish_failure_backoff),
            additional_subscriber_accounts: self.additional_subscriber_accounts.clone(),
        }
    }
}
