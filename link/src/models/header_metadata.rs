use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::Result;

/// Column layout of a successful query stream.
///
/// # Example (JSON representation)
///
/// ```json
/// {
///   "queryId": "transient_PAGEVIEWS_2833414146741891447",
///   "columnNames": ["USERID", "PAGEID"],
///   "columnTypes": ["STRING", "STRING"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryStreamSuccessMetadata {
    /// Only assigned to push queries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_id: Option<String>,

    pub column_names: Vec<String>,

    pub column_types: Vec<String>,
}

/// Error frame sent in place of the column layout.
///
/// # Example (JSON representation)
///
/// ```json
/// { "@type": "statement_error", "error_code": 40001, "message": "..." }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryStreamErrorMetadata {
    /// Empty when the server omits `@type`
    #[serde(rename = "@type", default)]
    pub error_type: String,

    pub error_code: i64,

    #[serde(default)]
    pub message: String,
}

/// First frame of a query stream: either the column layout or an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderMetadata {
    Success(QueryStreamSuccessMetadata),
    Error(QueryStreamErrorMetadata),
}

impl HeaderMetadata {
    /// Decode the header frame.
    ///
    /// A truthy `error_code` selects the error variant; `null`, `0`, `false`
    /// and `""` count as absent.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let value: JsonValue = serde_json::from_slice(raw)?;
        let is_error = value.get("error_code").is_some_and(is_truthy);

        if is_error {
            Ok(Self::Error(serde_json::from_value(value)?))
        } else {
            Ok(Self::Success(serde_json::from_value(value)?))
        }
    }

    pub fn success(&self) -> Option<&QueryStreamSuccessMetadata> {
        match self {
            Self::Success(meta) => Some(meta),
            Self::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&QueryStreamErrorMetadata> {
        match self {
            Self::Error(meta) => Some(meta),
            Self::Success(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    }
}
