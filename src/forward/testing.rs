//! In-process test doubles for the upstream.

use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use bytes::Bytes;
use tracing_subscriber::fmt::MakeWriter;
use url::Url;

use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::error::UpstreamError;
use crate::forward::target::UpstreamSettings;
use crate::forward::upstream::{ForwardRequest, ForwardResponse, Upstream};
use crate::http::server::AppState;

/// What the fake upstream does with a call.
#[derive(Clone)]
pub enum FakeReply {
    Respond {
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    },
    /// Simulated network failure.
    Fail,
    /// Never answers.
    Hang,
}

impl FakeReply {
    pub fn ok(body: &'static str) -> Self {
        Self::status(StatusCode::OK, body)
    }

    pub fn status(status: StatusCode, body: &'static str) -> Self {
        FakeReply::Respond {
            status,
            headers: HeaderMap::new(),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        if let FakeReply::Respond { headers, .. } = &mut self {
            headers.append(name, HeaderValue::from_static(value));
        }
        self
    }
}

/// A request as the fake upstream saw it, body fully read.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub target: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// Upstream double that records every call and answers with a fixed reply.
pub struct RecordingUpstream {
    reply: FakeReply,
    calls: Mutex<Vec<RecordedCall>>,
    in_flight: Arc<AtomicUsize>,
}

struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RecordingUpstream {
    pub fn replying(reply: FakeReply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: Mutex::new(Vec::new()),
            in_flight: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }

    /// Calls currently being served.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Upstream for RecordingUpstream {
    async fn send(&self, request: ForwardRequest) -> Result<ForwardResponse, UpstreamError> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let _guard = InFlight(self.in_flight.clone());

        let body = match request.body {
            Some(body) => Some(
                axum::body::to_bytes(body, usize::MAX)
                    .await
                    .map_err(|e| UpstreamError::Transport(e.into()))?,
            ),
            None => None,
        };

        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(RecordedCall {
                method: request.method,
                target: request.target,
                headers: request.headers,
                body,
            });

        match &self.reply {
            FakeReply::Respond {
                status,
                headers,
                body,
            } => Ok(ForwardResponse {
                status: *status,
                headers: headers.clone(),
                body: Body::from(body.clone()),
            }),
            FakeReply::Fail => Err(UpstreamError::Transport(
                io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused").into(),
            )),
            FakeReply::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

/// Build handler state around `upstream`.
pub fn test_state(
    base_url: Option<&str>,
    api_key: Option<&str>,
    upstream: Arc<RecordingUpstream>,
) -> AppState {
    let config = UpstreamConfig {
        base_url: base_url.map(Into::into),
        api_key: api_key.map(Into::into),
        ..UpstreamConfig::default()
    };
    let settings = UpstreamSettings::from_config(&config, &TimeoutConfig::default())
        .expect("test settings are valid");
    AppState::new(settings, upstream)
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer poisoned").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `future` with a thread-local subscriber and return what it logged.
pub async fn capture_logs<F: Future>(future: F) -> (F::Output, String) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    let guard = tracing::subscriber::set_default(subscriber);
    let output = future.await;
    drop(guard);

    let logs = String::from_utf8_lossy(&buffer.0.lock().expect("log buffer poisoned")).into_owned();
    (output, logs)
}
