//! Main ksqlDB client with builder pattern.
//!
//! Holds the server configuration, hands out [`KsqlSession`]s and serves the
//! small REST endpoints (`/healthcheck`, `/info`).

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use log::debug;
use tokio::sync::Mutex;

use crate::{
    auth::AuthProvider,
    error::{KsqlLinkError, Result},
    event_handlers::EventHandlers,
    models::{HealthCheckResponse, KsqlServerConfig, ServerInfo, ServerInfoEnvelope},
    session::KsqlSession,
    timeouts::KsqlLinkTimeouts,
};

/// Main ksqlDB client.
///
/// Use [`KsqlClientBuilder`] to construct instances with custom configuration.
///
/// # Examples
///
/// ```rust,no_run
/// use ksql_link::{KsqlClient, QueryStreamRequest};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = KsqlClient::builder()
///     .base_url("http://localhost:8088")
///     .basic_auth("alice", "secret")
///     .build()?;
///
/// let session = client.session().await?;
/// let mut stream = session.query_stream(QueryStreamRequest::new("SELECT * FROM USERS;")).await?;
/// while let Some(batch) = stream.next().await {
///     println!("{:?}", batch?);
/// }
/// session.close();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct KsqlClient {
    config: KsqlServerConfig,
    http_client: reqwest::Client,
    timeouts: KsqlLinkTimeouts,
    event_handlers: EventHandlers,
    health_cache: Arc<Mutex<HealthCheckCache>>,
}

impl KsqlClient {
    pub fn builder() -> KsqlClientBuilder {
        KsqlClientBuilder::new()
    }

    /// Create a client straight from a server configuration.
    pub fn new(config: KsqlServerConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Open a new session bound to this client's server configuration.
    ///
    /// Connects eagerly; an unreachable or malformed URL fails here.
    pub async fn session(&self) -> Result<KsqlSession> {
        KsqlSession::connect(&self.config, &self.timeouts, self.event_handlers.clone()).await
    }

    pub fn config(&self) -> &KsqlServerConfig {
        &self.config
    }

    pub fn timeouts(&self) -> &KsqlLinkTimeouts {
        &self.timeouts
    }

    /// Check server health (`GET /healthcheck`).
    pub async fn health_check(&self) -> Result<HealthCheckResponse> {
        {
            let cache = self.health_cache.lock().await;
            if let (Some(last_check), Some(response)) =
                (cache.last_check, cache.last_response.clone())
            {
                if last_check.elapsed() < HEALTH_CHECK_TTL {
                    debug!("[HEALTH_CHECK] Returning cached response (age: {:?})", last_check.elapsed());
                    return Ok(response);
                }
            }
        }

        debug!("[HEALTH_CHECK] Cache miss, fetching from {}", self.config.url);
        let health_response: HealthCheckResponse = self.get_json("/healthcheck").await?;
        debug!("[HEALTH_CHECK] is_healthy={}", health_response.is_healthy);

        let mut cache = self.health_cache.lock().await;
        cache.last_check = Some(Instant::now());
        cache.last_response = Some(health_response.clone());

        Ok(health_response)
    }

    /// Fetch server version and status (`GET /info`).
    pub async fn server_info(&self) -> Result<ServerInfo> {
        let envelope: ServerInfoEnvelope = self.get_json("/info").await?;
        Ok(envelope.ksql_server_info)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.config.url.trim_end_matches('/'), path);
        debug!("[KSQL_REST] GET {}", url);

        let mut request = self.http_client.get(&url);
        if let Some(auth) = &self.config.auth {
            request = auth.apply_to_request(request)?;
        }

        let start = Instant::now();
        let response = request.send().await?;
        let status = response.status();
        debug!("[KSQL_REST] {} status={} in {:?}", path, status, start.elapsed());

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(KsqlLinkError::ServerError {
                status_code: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<T>().await?)
    }
}

/// Builder for configuring [`KsqlClient`] instances.
pub struct KsqlClientBuilder {
    base_url: Option<String>,
    auth: Option<AuthProvider>,
    timeouts: KsqlLinkTimeouts,
    event_handlers: EventHandlers,
}

impl KsqlClientBuilder {
    fn new() -> Self {
        Self {
            base_url: None,
            auth: None,
            timeouts: KsqlLinkTimeouts::default(),
            event_handlers: EventHandlers::default(),
        }
    }

    /// Set the server URL, e.g. `http://localhost:8088`
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set HTTP Basic Auth credentials
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some(AuthProvider::basic_auth(username, password));
        self
    }

    /// Set the authentication provider directly
    pub fn auth(mut self, auth: AuthProvider) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Take url and auth from a server configuration
    pub fn config(mut self, config: KsqlServerConfig) -> Self {
        self.base_url = Some(config.url);
        self.auth = config.auth;
        self
    }

    pub fn timeouts(mut self, timeouts: KsqlLinkTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Register lifecycle hooks for every session this client opens
    pub fn event_handlers(mut self, handlers: EventHandlers) -> Self {
        self.event_handlers = handlers;
        self
    }

    pub fn build(self) -> Result<KsqlClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| KsqlLinkError::ConfigurationError("base_url is required".into()))?;

        let mut client_builder = reqwest::Client::builder();
        if !KsqlLinkTimeouts::is_no_timeout(self.timeouts.connection_timeout) {
            client_builder = client_builder.connect_timeout(self.timeouts.connection_timeout);
        }
        if !KsqlLinkTimeouts::is_no_timeout(self.timeouts.request_timeout) {
            client_builder = client_builder.timeout(self.timeouts.request_timeout);
        }

        let http_client = client_builder
            .build()
            .map_err(|e| KsqlLinkError::ConfigurationError(e.to_string()))?;

        Ok(KsqlClient {
            config: KsqlServerConfig {
                url: base_url,
                auth: self.auth,
            },
            http_client,
            timeouts: self.timeouts,
            event_handlers: self.event_handlers,
            health_cache: Arc::new(Mutex::new(HealthCheckCache::default())),
        })
    }
}

const HEALTH_CHECK_TTL: Duration = Duration::from_secs(10);

#[derive(Debug, Default)]
struct HealthCheckCache {
    last_check: Option<Instant>,
    last_response: Option<HealthCheckResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_pattern() {
        let client = KsqlClient::builder()
            .base_url("http://localhost:8088")
            .basic_auth("alice", "secret")
            .timeouts(KsqlLinkTimeouts::fast())
            .build()
            .unwrap();

        assert_eq!(client.config().url, "http://localhost:8088");
        assert_eq!(client.config().auth.as_ref().unwrap().username(), "alice");
        assert_eq!(client.timeouts(), &KsqlLinkTimeouts::fast());
    }

    #[test]
    fn test_builder_missing_url() {
        let result = KsqlClient::builder().build();
        assert!(matches!(result, Err(KsqlLinkError::ConfigurationError(_))));
    }

    #[test]
    fn test_new_from_config() {
        let config = KsqlServerConfig::new("http://fakehost:1234");
        let client = KsqlClient::new(config.clone()).unwrap();
        assert_eq!(client.config(), &config);
    }

    #[tokio::test]
    async fn test_session_with_bad_url_fails_on_connect() {
        let client = KsqlClient::new(KsqlServerConfig::new("not a url")).unwrap();
        let result = client.session().await;
        assert!(matches!(result, Err(KsqlLinkError::ConfigurationError(_))));
    }
}
