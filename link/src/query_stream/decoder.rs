//! Per-chunk decoding of the delimited query stream format.
//!
//! The first non-empty chunk is the header frame (column layout or error);
//! every later chunk holds zero or more newline-separated row arrays.
//! Chunks are assumed to end on frame boundaries: nothing is carried over
//! from one chunk to the next.

use serde_json::Value as JsonValue;

use crate::{
    error::{QueryStreamError, Result},
    models::{
        HeaderMetadata, QueryStreamErrorMetadata, QueryStreamSuccessMetadata, RecordBatch, Row,
    },
};

/// Protocol states. `StreamingRows` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    AwaitingMetadata,
    StreamingRows,
    Failed,
}

/// Protocol state machine for one query stream.
///
/// The state is derived from the header metadata, which is written exactly
/// once, by the first non-empty chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameDecoder {
    metadata: Option<HeaderMetadata>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one wire chunk.
    ///
    /// Returns `Ok(None)` while no header frame has been seen and for the
    /// header frame itself, `Ok(Some(batch))` for every chunk after it.
    /// An error header fails the decoder permanently.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<Option<RecordBatch>> {
        match &self.metadata {
            None => {
                if chunk.iter().all(u8::is_ascii_whitespace) {
                    return Ok(None);
                }
                self.decode_metadata(chunk)?;
                Ok(None)
            },
            Some(HeaderMetadata::Success(meta)) => decode_rows(&meta.column_names, chunk).map(Some),
            Some(HeaderMetadata::Error(meta)) => Err(QueryStreamError::from(meta).into()),
        }
    }

    fn decode_metadata(&mut self, chunk: &[u8]) -> Result<()> {
        let metadata = HeaderMetadata::parse(chunk)?;
        let outcome = match &metadata {
            HeaderMetadata::Success(meta) => {
                log::debug!(
                    "[KSQL_QUERY] Metadata decoded: query_id={:?} columns={:?}",
                    meta.query_id,
                    meta.column_names
                );
                Ok(())
            },
            HeaderMetadata::Error(meta) => {
                log::warn!(
                    "[KSQL_QUERY] Server rejected query: type={} code={} message=\"{}\"",
                    meta.error_type,
                    meta.error_code,
                    meta.message
                );
                Err(QueryStreamError::from(meta).into())
            },
        };
        self.metadata = Some(metadata);
        outcome
    }

    /// Current protocol state, derived from the decoded header.
    pub fn state(&self) -> DecoderState {
        match &self.metadata {
            None => DecoderState::AwaitingMetadata,
            Some(HeaderMetadata::Success(_)) => DecoderState::StreamingRows,
            Some(HeaderMetadata::Error(_)) => DecoderState::Failed,
        }
    }

    /// Whichever header frame has been decoded, if any.
    pub fn metadata(&self) -> Option<&HeaderMetadata> {
        self.metadata.as_ref()
    }

    /// Column layout, once a success header has been decoded.
    pub fn success_metadata(&self) -> Option<&QueryStreamSuccessMetadata> {
        self.metadata.as_ref().and_then(HeaderMetadata::success)
    }

    /// Server error frame, once an error header has been decoded.
    pub fn error_metadata(&self) -> Option<&QueryStreamErrorMetadata> {
        self.metadata.as_ref().and_then(HeaderMetadata::error)
    }

    /// `true` once an error header has been decoded.
    pub fn is_failed(&self) -> bool {
        self.state() == DecoderState::Failed
    }
}

fn decode_rows(column_names: &[String], chunk: &[u8]) -> Result<RecordBatch> {
    let mut rows = Vec::new();
    for segment in chunk.split(|b| *b == b'\n') {
        if segment.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let values: Vec<JsonValue> = serde_json::from_slice(segment)?;
        rows.push(Row::from_positional(column_names, values));
    }
    Ok(RecordBatch::new(rows))
}
