//! # ksql-link
//!
//! Async client for ksqlDB's HTTP/2 API.
//!
//! A [`KsqlClient`] holds the server configuration and opens
//! [`KsqlSession`]s; each session is one multiplexed HTTP/2 connection on
//! which any number of [`QueryStream`]s can run side by side. A query stream
//! decodes the server's newline-delimited JSON response lazily: the first
//! frame describes the columns (or reports an error), every later chunk is
//! handed out as a [`RecordBatch`] of [`Row`]s.
//!
//! ```rust,no_run
//! use ksql_link::{KsqlClient, QueryStreamRequest};
//!
//! # async fn example() -> ksql_link::Result<()> {
//! let client = KsqlClient::builder()
//!     .base_url("http://localhost:8088")
//!     .build()?;
//! let session = client.session().await?;
//!
//! let request = QueryStreamRequest::new("SELECT * FROM PAGEVIEWS EMIT CHANGES;")
//!     .with_property("auto.offset.reset", "earliest");
//! let mut stream = session.query_stream(request).await?;
//!
//! while let Some(batch) = stream.next().await {
//!     for row in batch? {
//!         println!("{:?}", row.get("USERID"));
//!     }
//! }
//! session.close();
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod event_handlers;
pub mod models;
pub mod query_stream;
pub mod session;
pub mod timeouts;
pub mod transport;

pub use auth::{AuthProvider, BasicCredentials};
pub use client::{KsqlClient, KsqlClientBuilder};
pub use error::{KsqlLinkError, QueryStreamError, Result};
pub use event_handlers::{ConnectionError, DisconnectReason, EventHandlers};
pub use models::{
    HeaderMetadata, HealthCheckResponse, KsqlServerConfig, QueryStreamErrorMetadata,
    QueryStreamRequest, QueryStreamSuccessMetadata, RecordBatch, Row, ServerInfo,
};
pub use query_stream::{
    DecoderState, FrameDecoder, QueryStream, DELIMITED_CONTENT_TYPE, QUERY_STREAM_ENDPOINT,
};
pub use session::KsqlSession;
pub use timeouts::{KsqlLinkTimeouts, KsqlLinkTimeoutsBuilder};
pub use transport::{H2Transport, LogicalStream, RequestWriter, ResponseBody, Transport};
