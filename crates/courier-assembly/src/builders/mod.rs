//! # Component Builders
//!
//! One builder per pluggable concern. Each is created lazily by its parent
//! the first time the concern is configured, reused by every later
//! configuration call and consumed when the bus is assembled.
//!
//! Setters validate their argument before touching any state, so a rejected
//! call leaves the builder exactly as it was.

mod client;
mod messaging;
mod services;

pub use client::ClientBuilder;
pub use messaging::{
    MessagingConfigBuilder, ENV_PUBLISH_BACKOFF_MS, ENV_PUBLISH_REATTEMPTS, ENV_REGION,
};
pub use services::ServicesBuilder;

use crate::error::AssemblyError;

/// `value` trimmed, or `InvalidArgument` if nothing is left.
pub(crate) fn non_blank(argument: &'static str, value: &str) -> Result<String, AssemblyError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AssemblyError::invalid_argument(argument, "must not be blank"));
    }
    Ok(trimmed.to_string())
}
