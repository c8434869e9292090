#![allow(dead_code)]
//! Shared fixtures for ksql-link integration tests.
//!
//! - [`MockTransport`]: scripted in-memory transport that records what the
//!   client writes
//! - [`spawn_h2_server`]: in-process HTTP/2 server speaking the delimited
//!   query stream format on a loopback port

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use http::{HeaderMap, Method, Request, Response, StatusCode};
use ksql_link::{
    KsqlLinkError, LogicalStream, RequestWriter, ResponseBody, Result, Transport,
    DELIMITED_CONTENT_TYPE,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

pub const METADATA: &str =
    r#"{"queryId":"test-123","columnNames":["a","b","c"],"columnTypes":["STRING","BIGINT","STRING"]}"#;

pub const ERROR_FRAME: &str = r#"{"@type":"test","error_code":4000,"message":"Test Error"}"#;

/// Request head as seen by a transport.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
}

/// One `send_data` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    pub data: Bytes,
    pub end_of_stream: bool,
}

/// In-memory [`Transport`] with scripted response bodies.
///
/// Each opened stream takes the next script from the queue (an empty body
/// once the queue runs dry). Scripts are delivered in full and the body is
/// then ended.
#[derive(Default)]
pub struct MockTransport {
    scripts: Mutex<VecDeque<Vec<Bytes>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    writes: Arc<Mutex<Vec<RecordedWrite>>>,
    closed: AtomicBool,
    close_calls: AtomicUsize,
    destroy_calls: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the body chunks for the next opened stream.
    pub fn script<I, C>(self, chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Bytes>,
    {
        self.scripts
            .lock()
            .unwrap()
            .push_back(chunks.into_iter().map(Into::into).collect());
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.lock().unwrap().clone()
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    pub fn destroy_calls(&self) -> usize {
        self.destroy_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open_stream(&self, request: Request<()>) -> Result<LogicalStream> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(KsqlLinkError::ConnectionError("Session is closed".into()));
        }

        self.requests.lock().unwrap().push(RecordedRequest {
            method: request.method().clone(),
            path: request.uri().path().to_string(),
            headers: request.headers().clone(),
        });

        let chunks = self.scripts.lock().unwrap().pop_front().unwrap_or_default();
        let (tx, body) = ResponseBody::channel(chunks.len().max(1));
        for chunk in chunks {
            tx.try_send(Ok(chunk)).unwrap();
        }

        Ok(LogicalStream {
            writer: Box::new(MockWriter {
                writes: Arc::clone(&self.writes),
            }),
            body,
        })
    }

    fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
    }

    fn destroy(&self) {
        self.destroy_calls.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

struct MockWriter {
    writes: Arc<Mutex<Vec<RecordedWrite>>>,
}

impl RequestWriter for MockWriter {
    fn send_data(&mut self, data: Bytes, end_of_stream: bool) -> Result<()> {
        self.writes.lock().unwrap().push(RecordedWrite {
            data,
            end_of_stream,
        });
        Ok(())
    }
}

/// What the in-process server answers to one request.
#[derive(Debug, Clone)]
pub struct ScriptedResponse {
    pub chunks: Vec<String>,
    /// `false` keeps the response open after the last chunk.
    pub end_stream: bool,
}

impl ScriptedResponse {
    pub fn complete<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
            end_stream: true,
        }
    }

    pub fn open<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            end_stream: false,
            ..Self::complete(chunks)
        }
    }
}

/// A request received by the in-process server, body fully read.
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ReceivedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// Start an HTTP/2 (prior knowledge) server on a loopback port.
///
/// `respond` picks the response for each request from its `sql` field.
/// Returns the base url and a channel of every request received.
pub async fn spawn_h2_server<F>(respond: F) -> (String, mpsc::UnboundedReceiver<ReceivedRequest>)
where
    F: Fn(&str) -> ScriptedResponse + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();
    let respond = Arc::new(respond);

    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                return;
            };
            let respond = Arc::clone(&respond);
            let seen_tx = seen_tx.clone();
            tokio::spawn(async move {
                let Ok(mut connection) = h2::server::handshake(socket).await else {
                    return;
                };
                while let Some(Ok((request, responder))) = connection.accept().await {
                    let respond = Arc::clone(&respond);
                    let seen_tx = seen_tx.clone();
                    tokio::spawn(handle_request(request, responder, respond, seen_tx));
                }
            });
        }
    });

    (url, seen_rx)
}

async fn handle_request<F>(
    request: Request<h2::RecvStream>,
    mut responder: h2::server::SendResponse<Bytes>,
    respond: Arc<F>,
    seen_tx: mpsc::UnboundedSender<ReceivedRequest>,
) where
    F: Fn(&str) -> ScriptedResponse + Send + Sync + 'static,
{
    let (parts, mut body) = request.into_parts();
    let mut buf = BytesMut::new();
    while let Some(chunk) = body.data().await {
        let Ok(chunk) = chunk else {
            return;
        };
        let _ = body.flow_control().release_capacity(chunk.len());
        buf.extend_from_slice(&chunk);
    }
    let body = buf.freeze();

    let sql = serde_json::from_slice::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("sql").and_then(|s| s.as_str()).map(str::to_owned))
        .unwrap_or_default();

    let _ = seen_tx.send(ReceivedRequest {
        method: parts.method,
        path: parts.uri.path().to_string(),
        headers: parts.headers,
        body,
    });

    let scripted = respond(&sql);
    let head = Response::builder()
        .status(StatusCode::OK)
        .header(http::header::CONTENT_TYPE, DELIMITED_CONTENT_TYPE)
        .body(())
        .unwrap();
    let Ok(mut send) = responder.send_response(head, false) else {
        return;
    };
    for chunk in scripted.chunks {
        if send.send_data(Bytes::from(chunk), false).is_err() {
            return;
        }
    }

    if scripted.end_stream {
        let _ = send.send_data(Bytes::new(), true);
    } else {
        // Keep the stream open until the client goes away.
        let _ = std::future::poll_fn(|cx| send.poll_reset(cx)).await;
    }
}
