use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Request payload for the `/query-stream` endpoint.
///
/// Unset maps are omitted from the body rather than sent as `{}`.
///
/// # Examples
///
/// ```rust
/// use ksql_link::QueryStreamRequest;
///
/// let request = QueryStreamRequest::new("SELECT * FROM ${name} EMIT CHANGES;")
///     .with_session_variable("name", "PAGEVIEWS")
///     .with_property("auto.offset.reset", "earliest");
///
/// assert_eq!(
///     serde_json::to_string(&request).unwrap(),
///     r#"{"sql":"SELECT * FROM ${name} EMIT CHANGES;","properties":{"auto.offset.reset":"earliest"},"sessionVariables":{"name":"PAGEVIEWS"}}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryStreamRequest {
    /// SQL statement (push or pull query)
    pub sql: String,

    /// Streams properties, e.g. `auto.offset.reset`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, JsonValue>>,

    /// Values substituted for `${var}` references in `sql`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_variables: Option<Map<String, JsonValue>>,
}

impl QueryStreamRequest {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            properties: None,
            session_variables: None,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.properties
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_session_variable(
        mut self,
        key: impl Into<String>,
        value: impl Into<JsonValue>,
    ) -> Self {
        self.session_variables
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }
}
