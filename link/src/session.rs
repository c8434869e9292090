//! `KsqlSession` – one persistent HTTP/2 connection to a ksqlDB server.

use std::sync::Arc;

use log::debug;

use crate::{
    auth::AuthProvider,
    error::Result,
    event_handlers::EventHandlers,
    models::{KsqlServerConfig, QueryStreamRequest},
    query_stream::QueryStream,
    timeouts::KsqlLinkTimeouts,
    transport::{H2Transport, Transport},
};

/// A connected session. Factory for [`QueryStream`]s.
///
/// Any number of query streams may run concurrently on one session; each
/// gets its own logical stream on the shared connection. The owner must
/// call [`close`](Self::close) or [`destroy`](Self::destroy); neither
/// enumerates the query streams still running.
pub struct KsqlSession {
    transport: Arc<dyn Transport>,
    auth: Option<AuthProvider>,
}

impl KsqlSession {
    /// Connect eagerly to the configured server.
    pub(crate) async fn connect(
        config: &KsqlServerConfig,
        timeouts: &KsqlLinkTimeouts,
        event_handlers: EventHandlers,
    ) -> Result<Self> {
        let transport = H2Transport::connect(&config.url, timeouts, event_handlers).await?;
        debug!("[KSQL_SESSION] Session established to {}", transport.base_url());

        Ok(Self {
            transport: Arc::new(transport),
            auth: config.auth.clone(),
        })
    }

    /// Build a session over an existing transport.
    pub fn with_transport(transport: Arc<dyn Transport>, auth: Option<AuthProvider>) -> Self {
        Self { transport, auth }
    }

    /// Start a streaming query.
    ///
    /// Completes once the request has been sent and the write side closed;
    /// results are read as the returned stream is polled.
    pub async fn query_stream(&self, request: QueryStreamRequest) -> Result<QueryStream> {
        QueryStream::open(self.transport.as_ref(), request, self.auth.as_ref()).await
    }

    /// Graceful shutdown: running query streams are allowed to finish.
    pub fn close(&self) {
        debug!("[KSQL_SESSION] close()");
        self.transport.close();
    }

    /// Immediate teardown: running query streams fail.
    pub fn destroy(&self) {
        debug!("[KSQL_SESSION] destroy()");
        self.transport.destroy();
    }

    pub fn is_closed(&self) -> bool {
        self.transport.is_closed()
    }

    /// The underlying transport session, for advanced use.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }
}
