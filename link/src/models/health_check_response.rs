use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Response of `GET /healthcheck`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResponse {
    pub is_healthy: bool,

    /// Per-subsystem status, e.g. `{"metastore": {"isHealthy": true}}`
    #[serde(default)]
    pub details: JsonValue,
}
