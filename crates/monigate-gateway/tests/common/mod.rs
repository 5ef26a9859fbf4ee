#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use tower::util::ServiceExt;

use monigate_core::error::Result;
use monigate_core::AuditEntry;
use monigate_gateway::audit::AuditSink;
use monigate_gateway::config::{self, GatewayConfig};

pub const ADMIN: &str = "admin-token-1";
pub const DEVELOPER: &str = "dev-token-1";
pub const READONLY: &str = "ro-token-1";

pub fn config_yaml(dir: &Path, max_requests: u32) -> String {
    format!(
        r#"
version: 1
gateway:
  instance_name: "test-node"
rate_limit:
  window_secs: 60
  max_requests: {max_requests}
artifacts:
  dir: "{dir}"
audit:
  append_timeout_ms: 2000
credentials:
  - {{ token: "{ADMIN}", username: "alice", role: admin }}
  - {{ token: "{DEVELOPER}", username: "bob", role: developer }}
  - {{ token: "{READONLY}", username: "carol", role: readonly }}
"#,
        dir = dir.display(),
    )
}

pub fn test_config(dir: &Path, max_requests: u32) -> GatewayConfig {
    config::load_from_str(&config_yaml(dir, max_requests)).expect("test config must parse")
}

/// GET `path` from client `ip`, optionally with a token.
pub async fn send(app: &Router, path: &str, token: Option<&str>, ip: [u8; 4]) -> Response {
    let mut req = Request::builder().method("GET").uri(path);
    if let Some(t) = token {
        req = req.header("X-API-Token", t);
    }
    let mut req = req.body(Body::empty()).unwrap();
    req.extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((ip, 40000))));
    app.clone().oneshot(req).await.unwrap()
}

pub async fn json_body(resp: Response) -> Value {
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub async fn text_body(resp: Response) -> String {
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

pub fn assert_status(resp: &Response, expected: StatusCode) {
    assert_eq!(resp.status(), expected, "unexpected status");
}

/// In-memory audit sink for ordering assertions.
#[derive(Default)]
pub struct RecordingSink {
    pub entries: Mutex<Vec<AuditEntry>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn paths(&self) -> Vec<String> {
        self.entries.lock().unwrap().iter().map(|e| e.path.clone()).collect()
    }

    pub fn users(&self) -> Vec<String> {
        self.entries.lock().unwrap().iter().map(|e| e.user.clone()).collect()
    }
}

#[async_trait]
impl AuditSink for RecordingSink {
    async fn append(&self, entry: &AuditEntry) -> Result<()> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

/// Sink that always fails.
pub struct BrokenSink;

#[async_trait]
impl AuditSink for BrokenSink {
    async fn append(&self, _entry: &AuditEntry) -> Result<()> {
        Err(monigate_core::MonigateError::Io("disk gone".into()))
    }
}

/// Sink whose appends take `delay` before succeeding.
pub struct SlowSink {
    pub delay: Duration,
}

#[async_trait]
impl AuditSink for SlowSink {
    async fn append(&self, _entry: &AuditEntry) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}
