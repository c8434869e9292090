//! Authentication for ksqlDB requests.
//!
//! Credentials are attached to every outgoing request as an `Authorization`
//! header, both on HTTP/2 query streams and on the REST helpers.

use std::fmt;

use base64::{engine::general_purpose, Engine as _};
use http::header::{HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};

use crate::error::{KsqlLinkError, Result};

/// Username/password pair for HTTP Basic Auth.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Authentication credentials for a ksqlDB server.
///
/// Serializes the same way the server configuration is usually written:
///
/// ```json
/// { "basic": { "username": "alice", "password": "secret" } }
/// ```
///
/// # Examples
///
/// ```rust
/// use ksql_link::AuthProvider;
///
/// let auth = AuthProvider::basic_auth("alice", "secret123");
/// assert_eq!(auth.username(), "alice");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum AuthProvider {
    /// HTTP Basic Auth
    Basic(BasicCredentials),
}

impl AuthProvider {
    /// Create HTTP Basic Auth credentials.
    pub fn basic_auth(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic(BasicCredentials {
            username: username.into(),
            password: password.into(),
        })
    }

    /// The principal these credentials authenticate as.
    pub fn username(&self) -> &str {
        match self {
            Self::Basic(creds) => &creds.username,
        }
    }

    /// Render the `Authorization` header value.
    ///
    /// - Basic: `Basic <base64(username:password)>` (RFC 7617)
    pub fn header_value(&self) -> Result<HeaderValue> {
        match self {
            Self::Basic(creds) => {
                let credentials = format!("{}:{}", creds.username, creds.password);
                let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());
                let mut value = HeaderValue::from_str(&format!("Basic {}", encoded))
                    .map_err(|e| KsqlLinkError::ConfigurationError(format!("Invalid credentials: {}", e)))?;
                value.set_sensitive(true);
                Ok(value)
            },
        }
    }

    /// Attach the `Authorization` header to a REST request.
    pub fn apply_to_request(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder> {
        Ok(request.header(AUTHORIZATION, self.header_value()?))
    }
}
