//! Data models for the ksql-link client library.
//!
//! Request bodies, wire frames of the query stream and the decoded rows
//! handed to callers.

pub mod header_metadata;
pub mod health_check_response;
pub mod query_stream_request;
pub mod row;
pub mod server_config;
pub mod server_info;


pub use header_metadata::{HeaderMetadata, QueryStreamErrorMetadata, QueryStreamSuccessMetadata};
pub use health_check_response::HealthCheckResponse;
pub use query_stream_request::QueryStreamRequest;
pub use row::{RecordBatch, Row};
pub use server_config::KsqlServerConfig;
pub use server_info::ServerInfo;
pub(crate) use server_info::ServerInfoEnvelope;
