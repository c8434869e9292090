use serde::{Deserialize, Serialize};

/// Server details returned by `GET /info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub version: String,

    #[serde(default)]
    pub kafka_cluster_id: Option<String>,

    #[serde(default)]
    pub ksql_service_id: Option<String>,

    #[serde(default)]
    pub server_status: Option<String>,
}

/// Envelope the server wraps [`ServerInfo`] in.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ServerInfoEnvelope {
    #[serde(rename = "KsqlServerInfo")]
    pub ksql_server_info: ServerInfo,
}
