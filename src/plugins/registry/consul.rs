//! Consul registry plugin
//!
//! Registers services through the local Consul agent HTTP API:
//!
//! - `PUT /v1/agent/service/register`
//! - `PUT /v1/agent/service/deregister/{id}`
//! - `GET /v1/agent/services`
//!
//! Every service written by pinchy carries `managed-by: pinchy` in its
//! metadata; only those services are reported back by [`Registry::services`].

use async_trait::async_trait;
use clap::{Arg, ArgMatches};
use reqwest::{Client, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{parse_duration, string_value};
use crate::error::{PluginError, RegistryError};
use crate::models::Service;

use super::traits::{Registry, RegistryProvider};

/// Flag holding the agent address
pub const CONSUL_ADDRESS: &str = "consul.address";
/// Flag holding the ACL token
pub const CONSUL_TOKEN: &str = "consul.token";
/// Flag holding the request timeout
pub const CONSUL_TIMEOUT: &str = "consul.timeout";

/// Metadata key marking services owned by pinchy
pub const MANAGED_BY_KEY: &str = "managed-by";
/// Metadata value marking services owned by pinchy
pub const MANAGED_BY_VALUE: &str = "pinchy";

const TOKEN_HEADER: &str = "X-Consul-Token";

/// Consul registry configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsulConfig {
    /// Agent base URL
    pub address: String,
    /// ACL token
    pub token: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ConsulConfig {
    fn default() -> Self {
        Self {
            address: "http://127.0.0.1:8500".to_string(),
            token: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl ConsulConfig {
    /// Resolve configuration from parsed arguments
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, PluginError> {
        let mut config = Self::default();
        if let Some(address) = string_value(matches, CONSUL_ADDRESS) {
            if address.trim().is_empty() {
                return Err(PluginError::InvalidConfig(format!(
                    "{CONSUL_ADDRESS} must not be empty"
                )));
            }
            config.address = address;
        }
        config.token = string_value(matches, CONSUL_TOKEN).filter(|t| !t.is_empty());
        if let Some(timeout) = string_value(matches, CONSUL_TIMEOUT) {
            config.timeout = parse_duration(CONSUL_TIMEOUT, &timeout)
                .map_err(|e| PluginError::InvalidConfig(e.to_string()))?;
        }
        Ok(config)
    }
}

/// Service registration payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceRegistration<'a> {
    #[serde(rename = "ID")]
    id: &'a str,
    name: &'a str,
    address: &'a str,
    port: u16,
    tags: &'a [String],
    meta: BTreeMap<String, String>,
}

impl<'a> From<&'a Service> for ServiceRegistration<'a> {
    fn from(service: &'a Service) -> Self {
        let mut meta = service.meta.clone();
        meta.insert(MANAGED_BY_KEY.to_string(), MANAGED_BY_VALUE.to_string());
        Self {
            id: service.id(),
            name: &service.name,
            address: &service.address,
            port: service.port,
            tags: &service.tags,
            meta,
        }
    }
}

/// Subset of an agent service entry
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AgentService {
    #[serde(rename = "ID")]
    id: String,
    #[serde(default)]
    meta: Option<HashMap<String, String>>,
}

impl AgentService {
    fn is_managed(&self) -> bool {
        self.meta
            .as_ref()
            .and_then(|m| m.get(MANAGED_BY_KEY))
            .is_some_and(|v| v == MANAGED_BY_VALUE)
    }
}

/// Registry client backed by a Consul agent
#[derive(Debug, Clone)]
pub struct ConsulRegistry {
    client: Client,
    base: Url,
    config: ConsulConfig,
}

impl ConsulRegistry {
    /// Create a new Consul registry client
    ///
    /// Fails if the agent address is not an absolute base URL.
    pub fn new(config: ConsulConfig) -> Result<Self, PluginError> {
        let base = Url::parse(&config.address).map_err(|e| {
            PluginError::InvalidConfig(format!("{CONSUL_ADDRESS}: {}: {e}", config.address))
        })?;
        if base.cannot_be_a_base() {
            return Err(PluginError::InvalidConfig(format!(
                "{CONSUL_ADDRESS}: {} is not a base URL",
                config.address
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PluginError::InitializationFailed(e.to_string()))?;
        Ok(Self {
            client,
            base,
            config,
        })
    }

    /// Endpoint URL; every segment is percent-encoded on its own
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // Infallible: `new` rejects cannot-be-a-base addresses.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => request.header(TOKEN_HEADER, token),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, RegistryError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(map_transport_error)?;
        check_status(response)
    }
}

#[async_trait]
impl Registry for ConsulRegistry {
    fn name(&self) -> &str {
        "consul"
    }

    async fn register(&self, service: &Service) -> Result<(), RegistryError> {
        let url = self.url(&["v1", "agent", "service", "register"]);
        let payload = ServiceRegistration::from(service);
        debug!(url = %url, service = payload.id, "Registering service in consul");

        self.send(self.client.put(url).json(&payload)).await?;
        Ok(())
    }

    async fn deregister(&self, id: &str) -> Result<(), RegistryError> {
        let url = self.url(&["v1", "agent", "service", "deregister", id]);
        debug!(url = %url, service = id, "Deregistering service from consul");

        self.send(self.client.put(url)).await?;
        Ok(())
    }

    async fn services(&self) -> Result<Vec<String>, RegistryError> {
        let url = self.url(&["v1", "agent", "services"]);
        let response = self.send(self.client.get(url)).await?;

        let entries: HashMap<String, AgentService> = response
            .json()
            .await
            .map_err(|e| RegistryError::InvalidResponse(e.to_string()))?;

        let mut ids: Vec<String> = entries
            .into_values()
            .filter(AgentService::is_managed)
            .map(|s| s.id)
            .collect();
        ids.sort();
        Ok(ids)
    }
}

fn map_transport_error(e: reqwest::Error) -> RegistryError {
    if e.is_timeout() {
        RegistryError::NetworkTimeout
    } else if e.is_connect() {
        RegistryError::ConnectionRefused
    } else {
        RegistryError::Network(e.to_string())
    }
}

fn check_status(response: Response) -> Result<Response, RegistryError> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::NOT_FOUND => {
            debug!(url = %response.url(), "Resource not found (404)");
            Err(RegistryError::NotFound)
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            warn!(url = %response.url(), status = ?response.status(), "Unauthorized");
            Err(RegistryError::Unauthorized)
        }
        status => {
            warn!(url = %response.url(), status = status.as_u16(), "Unexpected status");
            Err(RegistryError::ServerError(status.as_u16()))
        }
    }
}

/// Provider for [`ConsulRegistry`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsulRegistryProvider;

impl RegistryProvider for ConsulRegistryProvider {
    fn name(&self) -> &'static str {
        "consul"
    }

    fn flags(&self) -> Vec<Arg> {
        vec![
            Arg::new(CONSUL_ADDRESS)
                .long(CONSUL_ADDRESS)
                .env("PINCHY_CONSUL_ADDRESS")
                .default_value("http://127.0.0.1:8500")
                .global(true)
                .help("Consul agent address"),
            Arg::new(CONSUL_TOKEN)
                .long(CONSUL_TOKEN)
                .env("PINCHY_CONSUL_TOKEN")
                .global(true)
                .hide_env_values(true)
                .help("Consul ACL token"),
            Arg::new(CONSUL_TIMEOUT)
                .long(CONSUL_TIMEOUT)
                .env("PINCHY_CONSUL_TIMEOUT")
                .default_value("10s")
                .global(true)
                .help("Timeout of a single Consul request"),
        ]
    }

    fn factory(&self, matches: &ArgMatches) -> Result<Arc<dyn Registry>, PluginError> {
        let config = ConsulConfig::from_matches(matches)?;
        Ok(Arc::new(ConsulRegistry::new(config)?))
    }
}
