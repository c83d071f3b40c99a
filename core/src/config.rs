//! Client settings.
//!
//! # Design
//! `ClientConfig` is layered with the `config` crate (defaults, optional
//! file, then environment) and checked with `validator` once loaded. The
//! factory methods hand its values to the components that need them.

use std::sync::Arc;
use std::time::Duration;

use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use validator::Validate;

use crate::client::ApiClient;
use crate::credentials::{CredentialError, KeyringSecretStore, SecretStore};
use crate::images::{ImageLoader, DEFAULT_MAX_BYTES, DEFAULT_MAX_ENTRIES};
use crate::session::SessionCoordinator;
use crate::transport::{ReqwestTransport, TransportError};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_KEYRING_SERVICE: &str = "com.tlam.pkmn-tcg-collection";

/// Client settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct ClientConfig {
    #[validate(length(min = 1))]
    pub base_url: String,

    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,

    #[validate(range(min = 1))]
    pub image_request_timeout_secs: u64,

    #[validate(range(min = 1))]
    pub image_resource_timeout_secs: u64,

    pub image_cache_max_entries: usize,

    pub image_cache_max_bytes: usize,

    #[validate(length(min = 1))]
    pub keyring_service: String,

    /// Report a stored session as logged in before the server confirms it.
    pub optimistic_restore: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 30,
            image_request_timeout_secs: 30,
            image_resource_timeout_secs: 60,
            image_cache_max_entries: DEFAULT_MAX_ENTRIES,
            image_cache_max_bytes: DEFAULT_MAX_BYTES,
            keyring_service: DEFAULT_KEYRING_SERVICE.to_string(),
            optimistic_restore: true,
        }
    }
}

impl ClientConfig {
    /// Load settings.
    ///
    /// The loading order is:
    /// 1. built-in defaults
    /// 2. `pokecollect.toml` in the working directory, if present
    /// 3. `POKECOLLECT__*` environment variables (highest priority),
    ///    after reading `.env` if one exists
    ///
    /// e.g. `POKECOLLECT__BASE_URL=https://api.example.com`
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let settings = Self::defaults()?
            .add_source(File::with_name("pokecollect").required(false))
            .add_source(
                Environment::default()
                    .prefix("POKECOLLECT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Self::finish(settings)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let d = Self::default();
        Config::builder()
            .set_default("base_url", d.base_url)?
            .set_default("request_timeout_secs", d.request_timeout_secs)?
            .set_default("image_request_timeout_secs", d.image_request_timeout_secs)?
            .set_default("image_resource_timeout_secs", d.image_resource_timeout_secs)?
            .set_default("image_cache_max_entries", d.image_cache_max_entries as u64)?
            .set_default("image_cache_max_bytes", d.image_cache_max_bytes as u64)?
            .set_default("keyring_service", d.keyring_service)?
            .set_default("optimistic_restore", d.optimistic_restore)
    }

    fn finish(settings: Config) -> Result<Self, ConfigError> {
        let config: Self = settings.try_deserialize()?;
        config
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// API client over a fresh transport and the given store.
    pub fn build_client(&self, store: Arc<dyn SecretStore>) -> Result<ApiClient, TransportError> {
        let transport = ReqwestTransport::new(self.request_timeout(), self.request_timeout())?;
        Ok(ApiClient::new(&self.base_url, Arc::new(transport), store))
    }

    /// The platform vault entry for this client's service name.
    pub fn keyring_store(&self) -> Result<Arc<dyn SecretStore>, CredentialError> {
        Ok(Arc::new(KeyringSecretStore::new(&self.keyring_service)?))
    }

    /// Image loader with its own transport; it never sends the bearer token.
    pub fn image_loader(&self) -> Result<ImageLoader, TransportError> {
        let transport = ReqwestTransport::new(
            Duration::from_secs(self.image_request_timeout_secs),
            Duration::from_secs(self.image_resource_timeout_secs),
        )?;
        Ok(ImageLoader::new(
            Arc::new(transport),
            self.image_cache_max_entries,
            self.image_cache_max_bytes,
        ))
    }

    pub fn session(&self, client: ApiClient) -> SessionCoordinator {
        SessionCoordinator::new(client, self.optimistic_restore)
    }
}
