use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::Result;

/// One decoded result record: column name → value, in column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Map<String, JsonValue>);

impl Row {
    /// Zip positional values onto column names by index.
    ///
    /// Lengths are not validated: surplus values are dropped and columns
    /// without a value are left out of the row.
    pub fn from_positional(column_names: &[String], values: Vec<JsonValue>) -> Self {
        let mut values = values.into_iter();
        let mut map = Map::new();
        for name in column_names {
            if let Some(value) = values.next() {
                map.insert(name.clone(), value);
            }
        }
        Self(map)
    }

    pub fn get(&self, column: &str) -> Option<&JsonValue> {
        self.0.get(column)
    }

    /// Column names present in this row, in column order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &JsonValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, JsonValue> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, JsonValue> {
        self.0
    }

    /// Deserialize the row into a caller-defined record type.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T> {
        Ok(serde_json::from_value(JsonValue::Object(self.0))?)
    }
}

impl From<Map<String, JsonValue>> for Row {
    fn from(map: Map<String, JsonValue>) -> Self {
        Self(map)
    }
}

/// Rows decoded from a single wire chunk, in arrival order. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordBatch(Vec<Row>);

impl RecordBatch {
    pub fn new(rows: Vec<Row>) -> Self {
        Self(rows)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.0.iter()
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.0
    }

    pub fn into_typed<T: DeserializeOwned>(self) -> Result<Vec<T>> {
        self.0.into_iter().map(Row::into_typed).collect()
    }
}

impl IntoIterator for RecordBatch {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordBatch {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
