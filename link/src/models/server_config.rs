use serde::{Deserialize, Serialize};

use crate::auth::AuthProvider;

/// Connection settings for one ksqlDB server.
///
/// # Example (JSON representation)
///
/// ```json
/// {
///   "url": "http://localhost:8088",
///   "auth": { "basic": { "username": "alice", "password": "secret" } }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KsqlServerConfig {
    /// Server base URL, e.g. `http://localhost:8088`
    pub url: String,

    /// Optional credentials attached to every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthProvider>,
}

impl KsqlServerConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth: None,
        }
    }

    pub fn with_auth(mut self, auth: AuthProvider) -> Self {
        self.auth = Some(auth);
        self
    }
}
