//! Streaming query execution over the `/query-stream` endpoint.
//!
//! Opening a [`QueryStream`] sends the request in one shot and half-closes
//! the write side; the response is decoded lazily as the caller polls for
//! the next [`RecordBatch`].

pub mod decoder;

pub use decoder::{DecoderState, FrameDecoder};

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::Stream;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{Method, Request};
use log::debug;

use crate::{
    auth::AuthProvider,
    error::{KsqlLinkError, Result},
    models::{HeaderMetadata, QueryStreamRequest, RecordBatch},
    transport::{ResponseBody, Transport},
};

/// Path of the streaming query endpoint.
pub const QUERY_STREAM_ENDPOINT: &str = "/query-stream";

/// Media type of the newline-delimited JSON query stream format.
pub const DELIMITED_CONTENT_TYPE: &str = "application/vnd.ksqlapi.delimited.v1";

/// A running query: a lazy, single-pass sequence of [`RecordBatch`]es.
///
/// Column metadata becomes available once the first chunk of the response
/// has been decoded. A server-reported failure ends the sequence with a
/// [`KsqlLinkError::QueryStream`] item; the error accessors stay readable
/// afterwards.
///
/// # Examples
///
/// ```rust,no_run
/// use ksql_link::{KsqlClient, QueryStreamRequest};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = KsqlClient::builder().base_url("http://localhost:8088").build()?;
/// let session = client.session().await?;
///
/// let mut stream = session
///     .query_stream(QueryStreamRequest::new("SELECT * FROM PAGEVIEWS EMIT CHANGES;"))
///     .await?;
///
/// while let Some(batch) = stream.next().await {
///     for row in batch? {
///         println!("{:?}", row);
///     }
/// }
/// println!("query id: {:?}", stream.query_id());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct QueryStream {
    body: ResponseBody,
    decoder: FrameDecoder,
    finished: bool,
    batches: u64,
}

impl QueryStream {
    /// Open a logical stream on `transport`, write the request body and
    /// half-close the write side.
    pub(crate) async fn open(
        transport: &dyn Transport,
        request: QueryStreamRequest,
        auth: Option<&AuthProvider>,
    ) -> Result<Self> {
        if request.sql.trim().is_empty() {
            return Err(KsqlLinkError::InvalidRequest("sql must not be empty".into()));
        }

        let sql_preview = if request.sql.chars().count() > 80 {
            format!("{}...", request.sql.chars().take(80).collect::<String>())
        } else {
            request.sql.clone()
        };
        debug!(
            "[KSQL_QUERY] Starting query stream: \"{}\" (len={})",
            sql_preview.replace('\n', " "),
            request.sql.len()
        );

        let head = build_request(auth)?;
        let body = Bytes::from(serde_json::to_vec(&request)?);

        let mut stream = transport.open_stream(head).await?;
        stream.writer.send_data(body, true)?;

        Ok(Self::from_body(stream.body))
    }

    /// Decode an already opened response body.
    pub fn from_body(body: ResponseBody) -> Self {
        Self {
            body,
            decoder: FrameDecoder::new(),
            finished: false,
            batches: 0,
        }
    }

    /// Receive the next batch of rows.
    ///
    /// Returns `None` once the server has ended the stream, or after an error
    /// has been returned.
    pub async fn next(&mut self) -> Option<Result<RecordBatch>> {
        futures_util::future::poll_fn(|cx| self.poll_batch(cx)).await
    }

    fn poll_batch(&mut self, cx: &mut Context<'_>) -> Poll<Option<Result<RecordBatch>>> {
        loop {
            if self.finished {
                return Poll::Ready(None);
            }

            let chunk = match self.body.poll_chunk(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(Ok(chunk))) => chunk,
                Poll::Ready(Some(Err(e))) => {
                    self.finished = true;
                    return Poll::Ready(Some(Err(e)));
                },
                Poll::Ready(None) => {
                    debug!("[KSQL_QUERY] Query stream ended after {} batches", self.batches);
                    self.finished = true;
                    return Poll::Ready(None);
                },
            };

            match self.decoder.decode(&chunk) {
                Ok(Some(batch)) => {
                    self.batches += 1;
                    debug!("[KSQL_QUERY] Batch {} decoded: rows={}", self.batches, batch.len());
                    return Poll::Ready(Some(Ok(batch)));
                },
                // Header frame: nothing to hand out yet.
                Ok(None) => continue,
                Err(e) => {
                    self.finished = true;
                    return Poll::Ready(Some(Err(e)));
                },
            }
        }
    }

    /// Column names of the result. `None` until the header frame is decoded.
    pub fn column_names(&self) -> Option<&[String]> {
        self.decoder.success_metadata().map(|m| m.column_names.as_slice())
    }

    /// Column types of the result. `None` until the header frame is decoded.
    pub fn column_types(&self) -> Option<&[String]> {
        self.decoder.success_metadata().map(|m| m.column_types.as_slice())
    }

    /// Query id assigned by the server. Only push queries have one.
    pub fn query_id(&self) -> Option<&str> {
        self.decoder.success_metadata().and_then(|m| m.query_id.as_deref())
    }

    /// Error message the server returned, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.decoder.error_metadata().map(|m| m.message.as_str())
    }

    /// Error code the server returned, if any.
    pub fn error_code(&self) -> Option<i64> {
        self.decoder.error_metadata().map(|m| m.error_code)
    }

    /// Error type (`@type`) the server returned, if any.
    pub fn error_type(&self) -> Option<&str> {
        self.decoder.error_metadata().map(|m| m.error_type.as_str())
    }

    /// Decoded header frame, success or error. `None` until the first chunk.
    pub fn metadata(&self) -> Option<&HeaderMetadata> {
        self.decoder.metadata()
    }

    /// Protocol state of the underlying decoder.
    pub fn state(&self) -> DecoderState {
        self.decoder.state()
    }

    /// Give up decoding and take the remaining undecoded response body.
    pub fn into_raw(self) -> ResponseBody {
        self.body
    }
}

impl Stream for QueryStream {
    type Item = Result<RecordBatch>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().poll_batch(cx)
    }
}

/// Request head for `/query-stream`.
pub(crate) fn build_request(auth: Option<&AuthProvider>) -> Result<Request<()>> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(QUERY_STREAM_ENDPOINT)
        .header(CONTENT_TYPE, DELIMITED_CONTENT_TYPE);

    if let Some(auth) = auth {
        builder = builder.header(AUTHORIZATION, auth.header_value()?);
    }

    builder
        .body(())
        .map_err(|e| KsqlLinkError::ConfigurationError(format!("Invalid request head: {}", e)))
}
