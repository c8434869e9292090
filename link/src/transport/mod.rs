//! Transport session abstraction.
//!
//! A [`Transport`] is one persistent, multiplexed connection to a server.
//! Each call to [`Transport::open_stream`] opens an independent logical
//! stream: the caller writes the request body through the returned
//! [`RequestWriter`] and reads the response body chunk by chunk from the
//! [`ResponseBody`]. Chunks of different logical streams never interleave.
//!
//! - [`http2`]: HTTP/2 (prior knowledge) implementation used by [`KsqlSession`](crate::KsqlSession)

pub mod http2;

pub use http2::H2Transport;

use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use http::Request;
use tokio::sync::mpsc;

use crate::error::Result;

/// Default capacity for response chunk channels.
pub(crate) const DEFAULT_CHUNK_CHANNEL_CAPACITY: usize = 64;

/// A persistent, multiplexed request/response connection.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a new logical stream and send its request head.
    ///
    /// The request URI carries only the path; implementations resolve it
    /// against the server they are connected to.
    async fn open_stream(&self, request: Request<()>) -> Result<LogicalStream>;

    /// Stop accepting new streams and let in-flight ones finish.
    fn close(&self);

    /// Tear the connection down immediately, failing in-flight streams.
    fn destroy(&self);

    /// `true` once `close()` or `destroy()` has been called.
    fn is_closed(&self) -> bool;
}

/// Write side of a logical stream.
pub trait RequestWriter: Send {
    /// Queue `data` on the stream. `end_of_stream` half-closes the write side.
    fn send_data(&mut self, data: Bytes, end_of_stream: bool) -> Result<()>;
}

/// Both halves of a freshly opened logical stream.
pub struct LogicalStream {
    pub writer: Box<dyn RequestWriter>,
    pub body: ResponseBody,
}

/// Sender half feeding a [`ResponseBody`].
pub type ResponseBodySender = mpsc::Sender<Result<Bytes>>;

/// Read side of a logical stream: response body chunks in arrival order.
///
/// Single-pass; ends when the server closes its write side or the
/// transport goes away.
#[derive(Debug)]
pub struct ResponseBody {
    rx: mpsc::Receiver<Result<Bytes>>,
}

impl ResponseBody {
    /// Create a body together with the sender a transport pushes chunks into.
    pub fn channel(capacity: usize) -> (ResponseBodySender, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx })
    }

    /// Receive the next chunk, or `None` once the body is complete.
    pub async fn next_chunk(&mut self) -> Option<Result<Bytes>> {
        self.rx.recv().await
    }

    pub fn poll_chunk(&mut self, cx: &mut Context<'_>) -> Poll<Option<Result<Bytes>>> {
        self.rx.poll_recv(cx)
    }
}

impl Stream for ResponseBody {
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().poll_chunk(cx)
    }
}
