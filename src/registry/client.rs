//! HTTP client for the Nacos open API.
//!
//! Covers the two endpoints the watcher needs: the auth login that yields
//! an access token, and the catalog lookup that lists a service's instances.

use crate::models::{Instance, InstanceListResult};
use crate::registry::{InstanceSource, RegistryError};
use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Prefix the registry puts on plain-text error bodies.
const ERROR_MARKER: &str = "caused";

const LOGIN_PATH: &str = "/nacos/v1/auth/login";
const CATALOG_INSTANCES_PATH: &str = "/nacos/v1/ns/catalog/instances";

/// Connection and query settings for the registry.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Base URL, e.g. `http://nacos.local:8848`.
    pub host: String,
    pub namespace: String,
    pub group: String,
    pub cluster: String,
    pub page_size: u32,
    pub page: u32,
    pub timeout_seconds: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            namespace: String::new(),
            group: "DEFAULT_GROUP".to_string(),
            cluster: "DEFAULT".to_string(),
            page_size: 200,
            page: 1,
            timeout_seconds: 1000,
        }
    }
}

/// Successful login payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_ttl: Option<u64>,
    #[serde(default)]
    pub global_admin: Option<bool>,
}

/// Catalog lookup payload.
#[derive(Debug, Deserialize)]
struct CatalogInstances {
    count: usize,
    list: Vec<Instance>,
}

/// Registry client sharing one connection pool across all requests.
pub struct RegistryClient {
    config: RegistryConfig,
    http_client: reqwest::Client,
    access_token: String,
}

impl RegistryClient {
    /// Create a client for the configured registry. No request is made yet.
    pub fn new(config: RegistryConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            http_client,
            access_token: String::new(),
        })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Use an access token obtained elsewhere instead of logging in.
    #[allow(dead_code)] // Used by tests and token-based setups
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = token.into();
        self
    }

    fn base_url(&self) -> &str {
        self.config.host.trim_end_matches('/')
    }

    fn map_send_error(&self, e: reqwest::Error) -> RegistryError {
        if e.is_timeout() {
            RegistryError::Timeout(self.config.timeout_seconds)
        } else {
            RegistryError::Transport {
                host: self.config.host.clone(),
                source: e,
            }
        }
    }

    /// Exchange credentials for an access token and keep it for later queries.
    pub async fn login(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<LoginResponse, RegistryError> {
        let url = format!("{}{}", self.base_url(), LOGIN_PATH);
        debug!(%url, %username, "Logging in");

        let response = self
            .http_client
            .post(&url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_send_error(e))?;

        if status != StatusCode::OK {
            return Err(RegistryError::LoginRejected { status, body });
        }

        let login: LoginResponse = serde_json::from_str(&body)?;
        info!(ttl = ?login.token_ttl, admin = ?login.global_admin, "Login succeeded");
        self.access_token = login.access_token.clone();

        Ok(login)
    }

    /// Fetch one page of instances for a service.
    pub async fn list_instances(
        &self,
        service_name: &str,
    ) -> Result<InstanceListResult, RegistryError> {
        let url = format!("{}{}", self.base_url(), CATALOG_INSTANCES_PATH);
        let page_size = self.config.page_size.to_string();
        let page = self.config.page.to_string();

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("accessToken", self.access_token.as_str()),
                ("serviceName", service_name),
                ("clusterName", self.config.cluster.as_str()),
                ("groupName", self.config.group.as_str()),
                ("pageSize", page_size.as_str()),
                ("pageNo", page.as_str()),
                ("namespaceId", self.config.namespace.as_str()),
            ])
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_send_error(e))?;
        debug!(service = %service_name, %status, bytes = body.len(), "Instance list response");

        parse_catalog_response(service_name, status, &body)
    }
}

impl InstanceSource for RegistryClient {
    async fn fetch_instances(&self, service_name: &str) -> Result<InstanceListResult, RegistryError> {
        self.list_instances(service_name).await
    }
}

/// Interpret a catalog response body.
///
/// The error marker is checked before the status and before any JSON parsing.
pub fn parse_catalog_response(
    service_name: &str,
    status: StatusCode,
    body: &str,
) -> Result<InstanceListResult, RegistryError> {
    if body.starts_with(ERROR_MARKER) {
        return Err(RegistryError::Backend(body.trim().to_string()));
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(RegistryError::Unauthorized(status));
    }

    if !status.is_success() {
        return Err(RegistryError::Status {
            status,
            body: body.to_string(),
        });
    }

    let catalog: CatalogInstances = serde_json::from_str(body)?;

    Ok(InstanceListResult {
        service_name: service_name.to_string(),
        instances: catalog.list,
        total_count: catalog.count,
    })
}
