//! Shared utilities for integration testing.
//!
//! The mock upstream is a real axum server on an ephemeral port that records
//! every request it receives and answers according to the path.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header::{CONTENT_TYPE, RANGE};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use label_proxy::config::ProxyConfig;
use label_proxy::http::HttpServer;
use label_proxy::lifecycle::Shutdown;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Size of the fake audio file served by the mock.
pub const AUDIO_LEN: usize = 5000;

/// A request as the mock upstream received it.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

type Seen = Arc<Mutex<Vec<SeenRequest>>>;

pub struct MockUpstream {
    pub addr: SocketAddr,
    seen: Seen,
}

impl MockUpstream {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

/// Start the recording mock upstream.
pub async fn start_mock_upstream() -> MockUpstream {
    let seen: Seen = Arc::default();
    let app = Router::new().fallback(record).with_state(seen.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockUpstream { addr, seen }
}

async fn record(
    State(seen): State<Seen>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    seen.lock().unwrap().push(SeenRequest {
        method: method.clone(),
        uri: uri.clone(),
        headers: headers.clone(),
        body: body.clone(),
    });
    respond(&uri, &headers, body).await
}

async fn respond(uri: &Uri, headers: &HeaderMap, body: Bytes) -> Response {
    let path = uri.path();

    if path.starts_with("/storage/submissions/stream/") {
        let audio: Vec<u8> = (0..AUDIO_LEN).map(|i| (i % 256) as u8).collect();
        return match headers.get(RANGE).and_then(|v| v.to_str().ok()) {
            Some("bytes=0-999") => (
                StatusCode::PARTIAL_CONTENT,
                [
                    ("content-type", "audio/mpeg"),
                    ("content-range", "bytes 0-999/5000"),
                    ("accept-ranges", "bytes"),
                ],
                audio[..1000].to_vec(),
            )
                .into_response(),
            _ => (
                StatusCode::OK,
                [("content-type", "audio/mpeg"), ("accept-ranges", "bytes")],
                audio,
            )
                .into_response(),
        };
    }

    match path {
        "/storage/images/missing-json" => (
            StatusCode::NOT_FOUND,
            [("content-type", "application/json")],
            r#"{"error":"not found"}"#,
        )
            .into_response(),
        "/storage/images/missing-text" => {
            (StatusCode::NOT_FOUND, "Cannot GET /storage/images/missing-text").into_response()
        }
        p if p.starts_with("/storage/images/") => (
            StatusCode::OK,
            [
                ("content-type", "image/png"),
                ("etag", "\"img-1\""),
                ("last-modified", "Wed, 01 Jan 2025 00:00:00 GMT"),
                ("set-cookie", "x=1"),
            ],
            vec![0x89, b'P', b'N', b'G'],
        )
            .into_response(),
        "/redirect" => (StatusCode::FOUND, [("location", "/elsewhere")]).into_response(),
        "/slow" => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            StatusCode::OK.into_response()
        }
        _ => {
            let content_type = headers
                .get(CONTENT_TYPE)
                .cloned()
                .unwrap_or_else(|| "application/octet-stream".parse().unwrap());
            let mut response = Response::new(Body::from(body));
            response.headers_mut().insert(CONTENT_TYPE, content_type);
            response
        }
    }
}

/// Proxy configuration pointing at `base_url`.
pub fn proxy_config(base_url: Option<String>, api_key: Option<&str>) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.base_url = base_url;
    config.upstream.api_key = api_key.map(Into::into);
    config
}

pub struct RunningProxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

impl RunningProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Run the real proxy on an ephemeral port.
pub async fn spawn_proxy(config: ProxyConfig) -> RunningProxy {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();

    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.wait()));

    RunningProxy {
        addr,
        shutdown,
        handle,
    }
}

/// Client that shows redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
