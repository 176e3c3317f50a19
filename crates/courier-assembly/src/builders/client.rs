//! Transport client configuration.

use std::sync::Arc;

use courier_bus::config::is_region_identifier;
use courier_bus::ports::{ClientFactory, ClientSettings, Credentials};

use super::non_blank;
use crate::component::ComponentOverride;
use crate::error::AssemblyError;

/// Configures how the transport client is created.
///
/// Without an explicit client factory the resolver is asked for one. The
/// region defaults to the messaging configuration's region.
#[derive(Debug, Default)]
pub struct ClientBuilder {
    factory: ComponentOverride<Arc<dyn ClientFactory>>,
    service_url: Option<String>,
    credentials: Option<Credentials>,
    region: Option<String>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `factory` instead of the resolver's client factory.
    pub fn with_client_factory<F>(&mut self, factory: F) -> &mut Self
    where
        F: FnOnce() -> Arc<dyn ClientFactory> + Send + 'static,
    {
        self.factory.set(factory);
        self
    }

    /// Point the client at a specific endpoint, e.g. a local emulator.
    pub fn with_service_url(&mut self, url: &str) -> Result<&mut Self, AssemblyError> {
        let url = non_blank("service_url", url)?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AssemblyError::invalid_argument(
                "service_url",
                format!("{url} is not an http(s) URL"),
            ));
        }
        self.service_url = Some(url);
        Ok(self)
    }

    pub fn with_credentials(
        &mut self,
        access_key: &str,
        secret_key: &str,
    ) -> Result<&mut Self, AssemblyError> {
        let access_key = non_blank("access_key", access_key)?;
        let secret_key = non_blank("secret_key", secret_key)?;
        self.credentials = Some(Credentials {
            access_key,
            secret_key,
        });
        Ok(self)
    }

    /// Region for the client when it differs from the messaging region.
    pub fn with_region(&mut self, region: &str) -> Result<&mut Self, AssemblyError> {
        let region = non_blank("region", region)?;
        if !is_region_identifier(&region) {
            return Err(AssemblyError::invalid_argument(
                "region",
                format!("{region} is not a region identifier"),
            ));
        }
        self.region = Some(region);
        Ok(self)
    }

    #[must_use]
    pub fn has_client_factory(&self) -> bool {
        self.factory.is_explicit()
    }

    /// Settings the client will be created with.
    #[must_use]
    pub fn settings(&self, default_region: &str) -> ClientSettings {
        ClientSettings {
            region: self
                .region
                .clone()
                .unwrap_or_else(|| default_region.to_string()),
            service_url: self.service_url.clone(),
            credentials: self.credentials.clone(),
        }
    }

    pub(crate) fn into_parts(
        self,
        default_region: &str,
    ) -> (ComponentOverride<Arc<dyn ClientFactory>>, ClientSettings) {
        let settings = self.settings(default_region);
        (self.factory, settings)
    }
}
