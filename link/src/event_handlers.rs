//! Transport session lifecycle hooks.
//!
//! - [`on_connect`](EventHandlers::on_connect): the HTTP/2 handshake completed
//! - [`on_disconnect`](EventHandlers::on_disconnect): the connection ended
//! - [`on_error`](EventHandlers::on_error): the connection failed
//!
//! # Example
//!
//! ```rust,no_run
//! use ksql_link::{EventHandlers, KsqlClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let handlers = EventHandlers::new()
//!     .on_connect(|| println!("Connected to ksqlDB"))
//!     .on_disconnect(|reason| println!("Disconnected: {}", reason))
//!     .on_error(|error| eprintln!("Connection error: {}", error));
//!
//! let client = KsqlClient::builder()
//!     .base_url("http://localhost:8088")
//!     .event_handlers(handlers)
//!     .build()?;
//! let session = client.session().await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

/// Why a transport session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectReason {
    pub message: String,
    /// `false` when the session was torn down with `destroy()`.
    pub graceful: bool,
}

impl DisconnectReason {
    pub fn new(message: impl Into<String>, graceful: bool) -> Self {
        Self {
            message: message.into(),
            graceful,
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.graceful {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} (forced)", self.message)
        }
    }
}

/// Error information passed to the `on_error` handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionError {
    pub message: String,
}

impl ConnectionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

pub type OnConnectCallback = Arc<dyn Fn() + Send + Sync>;
pub type OnDisconnectCallback = Arc<dyn Fn(DisconnectReason) + Send + Sync>;
pub type OnErrorCallback = Arc<dyn Fn(ConnectionError) + Send + Sync>;

/// Transport session lifecycle handlers. All optional.
#[derive(Clone, Default)]
pub struct EventHandlers {
    pub(crate) on_connect: Option<OnConnectCallback>,
    pub(crate) on_disconnect: Option<OnDisconnectCallback>,
    pub(crate) on_error: Option<OnErrorCallback>,
}

impl fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandlers")
            .field("on_connect", &self.on_connect.is_some())
            .field("on_disconnect", &self.on_disconnect.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked once the HTTP/2 connection is established.
    pub fn on_connect(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_connect = Some(Arc::new(f));
        self
    }

    /// Register a callback invoked when the HTTP/2 connection ends.
    pub fn on_disconnect(mut self, f: impl Fn(DisconnectReason) + Send + Sync + 'static) -> Self {
        self.on_disconnect = Some(Arc::new(f));
        self
    }

    /// Register a callback invoked when the HTTP/2 connection fails.
    pub fn on_error(mut self, f: impl Fn(ConnectionError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Returns `true` if any handler is registered.
    pub fn has_any(&self) -> bool {
        self.on_connect.is_some() || self.on_disconnect.is_some() || self.on_error.is_some()
    }

    pub(crate) fn emit_connect(&self) {
        if let Some(cb) = &self.on_connect {
            cb();
        }
    }

    pub(crate) fn emit_disconnect(&self, reason: DisconnectReason) {
        if let Some(cb) = &self.on_disconnect {
            cb(reason);
        }
    }

    pub(crate) fn emit_error(&self, error: ConnectionError) {
        if let Some(cb) = &self.on_error {
            cb(error);
        }
    }
}
