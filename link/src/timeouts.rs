//! Timeout configuration for ksql-link.
//!
//! Bounds connection establishment and the REST helpers. Query streams are
//! never timed out here: a push query may legitimately stay open forever.

use std::time::Duration;

/// Timeout configuration for client operations.
///
/// # Examples
///
/// ```rust
/// use ksql_link::KsqlLinkTimeouts;
/// use std::time::Duration;
///
/// let timeouts = KsqlLinkTimeouts::builder()
///     .connection_timeout(Duration::from_secs(60))
///     .request_timeout_secs(120)
///     .build();
/// assert_eq!(timeouts.connection_timeout, Duration::from_secs(60));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KsqlLinkTimeouts {
    /// Timeout for TCP connect plus the HTTP/2 handshake.
    /// Default: 10 seconds
    pub connection_timeout: Duration,

    /// Timeout for REST calls (`/healthcheck`, `/info`).
    /// Default: 30 seconds
    pub request_timeout: Duration,
}

impl Default for KsqlLinkTimeouts {
    fn default() -> Self {
        Self {
            connection_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl KsqlLinkTimeouts {
    pub fn builder() -> KsqlLinkTimeoutsBuilder {
        KsqlLinkTimeoutsBuilder::new()
    }

    /// Short timeouts for a server on localhost.
    pub fn fast() -> Self {
        Self {
            connection_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(5),
        }
    }

    /// Long timeouts for remote or high-latency servers.
    pub fn relaxed() -> Self {
        Self {
            connection_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(120),
        }
    }

    /// Check if a duration represents "no timeout" (zero or very large).
    pub fn is_no_timeout(duration: Duration) -> bool {
        duration.is_zero() || duration > Duration::from_secs(86400 * 365)
    }
}

/// Builder for [`KsqlLinkTimeouts`].
#[derive(Debug, Clone)]
pub struct KsqlLinkTimeoutsBuilder {
    timeouts: KsqlLinkTimeouts,
}

impl KsqlLinkTimeoutsBuilder {
    fn new() -> Self {
        Self {
            timeouts: KsqlLinkTimeouts::default(),
        }
    }

    /// Set the connection timeout (TCP connect + HTTP/2 handshake).
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.connection_timeout = timeout;
        self
    }

    pub fn connection_timeout_secs(self, secs: u64) -> Self {
        self.connection_timeout(Duration::from_secs(secs))
    }

    /// Set the REST request timeout. Set to 0 to disable.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.request_timeout = timeout;
        self
    }

    pub fn request_timeout_secs(self, secs: u64) -> Self {
        self.request_timeout(Duration::from_secs(secs))
    }

    pub fn build(self) -> KsqlLinkTimeouts {
        self.timeouts
    }
}
