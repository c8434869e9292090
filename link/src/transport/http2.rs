//! HTTP/2 transport session.
//!
//! Speaks HTTP/2 with prior knowledge (h2c) over a single TCP connection.
//! A background driver task owns the connection; every logical stream gets
//! its own reader task that forwards DATA frames through a bounded channel
//! and hands flow-control capacity back once a chunk has been accepted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use h2::client::{self, ResponseFuture, SendRequest};
use h2::SendStream;
use http::uri::{Authority, PathAndQuery, Scheme};
use http::{Request, Uri};
use log::{debug, warn};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use crate::{
    error::{KsqlLinkError, Result},
    event_handlers::{ConnectionError, DisconnectReason, EventHandlers},
    timeouts::KsqlLinkTimeouts,
    transport::{
        LogicalStream, RequestWriter, ResponseBody, ResponseBodySender, Transport,
        DEFAULT_CHUNK_CHANNEL_CAPACITY,
    },
};

/// One HTTP/2 connection to a ksqlDB server.
pub struct H2Transport {
    scheme: Scheme,
    authority: Authority,
    /// `None` after `close()` / `destroy()`.
    send_request: Mutex<Option<SendRequest<Bytes>>>,
    driver: Mutex<Option<JoinHandle<()>>>,
    destroyed: AtomicBool,
    event_handlers: EventHandlers,
}

impl H2Transport {
    /// Connect to `url` and complete the HTTP/2 handshake.
    ///
    /// Only `http://` URLs are accepted; the port defaults to 80.
    pub async fn connect(
        url: &str,
        timeouts: &KsqlLinkTimeouts,
        event_handlers: EventHandlers,
    ) -> Result<Self> {
        let (scheme, authority) = parse_base_url(url)?;
        let host = authority.host().trim_start_matches('[').trim_end_matches(']').to_string();
        let port = authority.port_u16().unwrap_or(80);

        debug!("[KSQL_H2] Connecting to {}:{}", host, port);
        let start = std::time::Instant::now();

        let handshake = async {
            let tcp = TcpStream::connect((host.as_str(), port)).await?;
            tcp.set_nodelay(true)?;
            let parts = client::handshake(tcp).await?;
            Ok::<_, KsqlLinkError>(parts)
        };

        let connect_result = if KsqlLinkTimeouts::is_no_timeout(timeouts.connection_timeout) {
            handshake.await
        } else {
            match tokio::time::timeout(timeouts.connection_timeout, handshake).await {
                Ok(result) => result,
                Err(_) => Err(KsqlLinkError::TimeoutError(format!(
                    "Connection timeout ({:?}) to {}",
                    timeouts.connection_timeout, authority
                ))),
            }
        };

        let (send_request, connection) = match connect_result {
            Ok(parts) => parts,
            Err(e) => {
                event_handlers.emit_error(ConnectionError::new(e.to_string()));
                return Err(e);
            },
        };

        debug!("[KSQL_H2] HTTP/2 handshake with {} completed in {:?}", authority, start.elapsed());

        let driver_handlers = event_handlers.clone();
        let driver_authority = authority.clone();
        let driver = tokio::spawn(async move {
            let result = connection.await;
            match &result {
                Ok(()) => debug!("[KSQL_H2] Connection to {} closed", driver_authority),
                Err(e) => {
                    warn!("[KSQL_H2] Connection to {} failed: {}", driver_authority, e);
                    driver_handlers.emit_error(ConnectionError::new(e.to_string()));
                },
            }
            driver_handlers.emit_disconnect(disconnect_reason(&result));
        });

        event_handlers.emit_connect();

        Ok(Self {
            scheme,
            authority,
            send_request: Mutex::new(Some(send_request)),
            driver: Mutex::new(Some(driver)),
            destroyed: AtomicBool::new(false),
            event_handlers,
        })
    }

    /// `scheme://authority` this transport is connected to.
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.authority)
    }

    /// Rewrite a path-only request URI into an absolute one for this server.
    fn resolve(&self, request: Request<()>) -> Result<Request<()>> {
        let (mut parts, body) = request.into_parts();
        let path_and_query = parts
            .uri
            .path_and_query()
            .cloned()
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        parts.uri = Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
            .map_err(|e| KsqlLinkError::ConfigurationError(format!("Invalid request URI: {}", e)))?;

        Ok(Request::from_parts(parts, body))
    }
}

#[async_trait]
impl Transport for H2Transport {
    async fn open_stream(&self, request: Request<()>) -> Result<LogicalStream> {
        let send_request = self
            .send_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| KsqlLinkError::ConnectionError("Session is closed".into()))?;

        // Waits until the server's concurrent stream limit admits one more.
        let mut send_request = send_request.ready().await?;

        let request = self.resolve(request)?;
        let path = request.uri().path().to_string();
        let (response, send_stream) = send_request.send_request(request, false)?;
        debug!("[KSQL_H2] Opened stream {} {}", send_stream.stream_id().as_u32(), path);

        let (tx, body) = ResponseBody::channel(DEFAULT_CHUNK_CHANNEL_CAPACITY);
        tokio::spawn(read_response(response, tx, path));

        Ok(LogicalStream {
            writer: Box::new(send_stream),
            body,
        })
    }

    fn close(&self) {
        if self
            .send_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
        {
            debug!("[KSQL_H2] Closing session to {}", self.authority);
        }
    }

    fn destroy(&self) {
        self.send_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }

        if let Some(driver) = self
            .driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            // A finished driver has already reported its own disconnect.
            if driver.is_finished() {
                return;
            }
            debug!("[KSQL_H2] Destroying session to {}", self.authority);
            driver.abort();
            self.event_handlers
                .emit_disconnect(DisconnectReason::new("Session destroyed", false));
        }
    }

    fn is_closed(&self) -> bool {
        self.send_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl RequestWriter for SendStream<Bytes> {
    fn send_data(&mut self, data: Bytes, end_of_stream: bool) -> Result<()> {
        SendStream::send_data(self, data, end_of_stream)?;
        Ok(())
    }
}

/// Forward the response body of one stream into its channel.
async fn read_response(response: ResponseFuture, tx: ResponseBodySender, path: String) {
    let response = tokio::select! {
        response = response => response,
        _ = tx.closed() => {
            debug!("[KSQL_H2] {} reader dropped before response head, resetting stream", path);
            return;
        },
    };
    let response = match response {
        Ok(response) => response,
        Err(e) => {
            warn!("[KSQL_H2] {} failed before response head: {}", path, e);
            let _ = tx.send(Err(e.into())).await;
            return;
        },
    };

    let status = response.status();
    if status.is_success() {
        debug!("[KSQL_H2] {} response status={}", path, status);
    } else {
        // ksqlDB reports query errors in the body; the decoder surfaces them.
        warn!("[KSQL_H2] {} response status={}", path, status);
    }

    // Dropping `body` on return resets the stream if it is still open.
    let mut body = response.into_body();
    loop {
        let frame = tokio::select! {
            frame = body.data() => frame,
            _ = tx.closed() => {
                debug!("[KSQL_H2] {} reader dropped, resetting stream", path);
                return;
            },
        };
        let Some(frame) = frame else {
            break;
        };
        match frame {
            Ok(chunk) => {
                let len = chunk.len();
                if len == 0 {
                    continue;
                }
                if tx.send(Ok(chunk)).await.is_err() {
                    debug!("[KSQL_H2] {} reader dropped, abandoning stream", path);
                    return;
                }
                let _ = body.flow_control().release_capacity(len);
            },
            Err(e) => {
                warn!("[KSQL_H2] {} stream error: {}", path, e);
                let _ = tx.send(Err(e.into())).await;
                return;
            },
        }
    }

    debug!("[KSQL_H2] {} response body complete", path);
}

fn disconnect_reason(result: &std::result::Result<(), h2::Error>) -> DisconnectReason {
    match result {
        Ok(()) => DisconnectReason::new("Connection closed", true),
        Err(e) => DisconnectReason::new(e.to_string(), false),
    }
}

fn parse_base_url(url: &str) -> Result<(Scheme, Authority)> {
    let uri: Uri = url
        .parse()
        .map_err(|e| KsqlLinkError::ConfigurationError(format!("Invalid url '{}': {}", url, e)))?;

    match uri.scheme_str() {
        Some("http") => {},
        Some(other) => {
            return Err(KsqlLinkError::ConfigurationError(format!(
                "Unsupported scheme '{}': only http:// (HTTP/2 prior knowledge) is supported",
                other
            )))
        },
        None => {
            return Err(KsqlLinkError::ConfigurationError(format!(
                "Url '{}' has no scheme",
                url
            )))
        },
    }

    let authority = uri
        .authority()
        .cloned()
        .ok_or_else(|| KsqlLinkError::ConfigurationError(format!("Url '{}' has no host", url)))?;

    Ok((Scheme::HTTP, authority))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url() {
        let (scheme, authority) = parse_base_url("http://localhost:8088").unwrap();
        assert_eq!(scheme, Scheme::HTTP);
        assert_eq!(authority.host(), "localhost");
        assert_eq!(authority.port_u16(), Some(8088));
    }

    #[test]
    fn test_parse_base_url_ignores_path() {
        let (_, authority) = parse_base_url("http://fakehost:1234/ignored").unwrap();
        assert_eq!(authority.as_str(), "fakehost:1234");
    }

    #[test]
    fn test_parse_base_url_rejects_bad_input() {
        assert!(matches!(
            parse_base_url("https://localhost:8088"),
            Err(KsqlLinkError::ConfigurationError(_))
        ));
        assert!(matches!(
            parse_base_url("localhost:8088"),
            Err(KsqlLinkError::ConfigurationError(_))
        ));
        assert!(matches!(
            parse_base_url("not a url"),
            Err(KsqlLinkError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_disconnect_reason_marks_errors_as_forced() {
        let clean = disconnect_reason(&Ok(()));
        assert!(clean.graceful);

        let failed = disconnect_reason(&Err(h2::Error::from(h2::Reason::PROTOCOL_ERROR)));
        assert!(!failed.graceful);
        assert!(failed.to_string().ends_with("(forced)"));
    }

    #[tokio::test]
    async fn test_connect_refused_propagates() {
        // Bind then drop to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = H2Transport::connect(
            &format!("http://127.0.0.1:{}", port),
            &KsqlLinkTimeouts::fast(),
            EventHandlers::new(),
        )
        .await;

        assert!(matches!(result, Err(KsqlLinkError::Io(_))));
    }
}
