//! Shared test fixtures for codec, api, session, and editing test modules.
//!
//! Fakes here implement the crate's seams (`RoomTransport`, `AddressResolver`,
//! `AgentStore`) in memory so state-machine tests never open sockets.

use crate::api::{AddressResolver, AgentStore};
use crate::error::{ApiError, TransportError};
use crate::transport::{FrameListener, RoomKey, RoomTransport};
use crate::types::Agent;
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

static TEST_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Temporary directory fixture with best-effort cleanup.
#[derive(Debug)]
pub struct TestTempDir {
    path: PathBuf,
}

impl TestTempDir {
    pub fn new(prefix: &str) -> Self {
        let suffix = TEST_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let dir = std::env::temp_dir().join(format!("agentroom-{prefix}-{millis}-{suffix}"));
        fs::create_dir_all(&dir).expect("failed to create temporary fixture directory");
        Self { path: dir }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write UTF-8 text to a child path, creating parent directories as needed.
    pub fn write_text(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent directories for fixture");
        }
        fs::write(&path, content).expect("failed to write fixture file");
        path
    }
}

impl Drop for TestTempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// One agent delta envelope as the server sends it.
pub fn delta_line(thread_id: &str, text: &str) -> String {
    json!({
        "target": 8,
        "errorCode": 0,
        "data": { "threadID": thread_id, "sender": 2, "message": text }
    })
    .to_string()
}

/// A data-less envelope carrying only `errorCode`.
pub fn signal_line(code: i64) -> String {
    json!({ "target": 8, "errorCode": code }).to_string()
}

/// Serve exactly one HTTP response on a loopback port.
///
/// Returns the base URL and a handle yielding the raw request text
/// (request line, headers, and body).
pub async fn serve_http_once(status: u16, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback listener");
    let addr = listener.local_addr().expect("listener address");
    let body = body.to_string();
    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept connection");
        let request = read_http_request(&mut stream).await;
        let response = format!(
            "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        stream
            .write_all(response.as_bytes())
            .await
            .expect("write response");
        let _ = stream.shutdown().await;
        request
    });
    (format!("http://{addr}"), handle)
}

async fn read_http_request(stream: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.expect("read request");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(head_end) = text.find("\r\n\r\n") {
            let content_length = text[..head_end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// A call observed by [`RecordingTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Enter {
        room: RoomKey,
        address: String,
        subscription: u64,
    },
    Leave(RoomKey),
    Send(String),
    Reconnect(RoomKey),
}

#[derive(Default)]
struct RecordingState {
    calls: Vec<TransportCall>,
    joined: HashMap<RoomKey, FrameListener>,
    max_active: usize,
    fail_enter: bool,
    fail_send: bool,
    fail_leave: bool,
    fail_reconnect: bool,
}

/// In-memory transport that records every call.
///
/// Holds room membership like the socket transport does, so double joins
/// are rejected the same way.
#[derive(Default)]
pub struct RecordingTransport {
    state: Mutex<RecordingState>,
}

impl RecordingTransport {
    fn with_state<R>(&self, f: impl FnOnce(&mut RecordingState) -> R) -> R {
        let mut state = self.state.lock().expect("recording transport lock");
        f(&mut state)
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.with_state(|s| s.calls.clone())
    }

    /// Sent frames parsed as JSON, in send order.
    pub fn sent_frames(&self) -> Vec<serde_json::Value> {
        self.with_state(|s| {
            s.calls
                .iter()
                .filter_map(|c| match c {
                    TransportCall::Send(frame) => serde_json::from_str(frame).ok(),
                    _ => None,
                })
                .collect()
        })
    }

    pub fn reconnects(&self) -> usize {
        self.with_state(|s| {
            s.calls
                .iter()
                .filter(|c| matches!(c, TransportCall::Reconnect(_)))
                .count()
        })
    }

    pub fn active_rooms(&self) -> usize {
        self.with_state(|s| s.joined.len())
    }

    /// Highest number of rooms held at once.
    pub fn max_active_rooms(&self) -> usize {
        self.with_state(|s| s.max_active)
    }

    /// Listener of the agent room, for pushing frames from a test.
    pub fn listener(&self) -> Option<FrameListener> {
        self.with_state(|s| s.joined.get(&RoomKey::agent()).cloned())
    }

    pub fn fail_enter(&self, fail: bool) {
        self.with_state(|s| s.fail_enter = fail);
    }

    pub fn fail_send(&self, fail: bool) {
        self.with_state(|s| s.fail_send = fail);
    }

    pub fn fail_leave(&self, fail: bool) {
        self.with_state(|s| s.fail_leave = fail);
    }

    pub fn fail_reconnect(&self, fail: bool) {
        self.with_state(|s| s.fail_reconnect = fail);
    }
}

#[async_trait]
impl RoomTransport for RecordingTransport {
    async fn enter_room(
        &self,
        room: &RoomKey,
        address: &str,
        listener: FrameListener,
    ) -> Result<(), TransportError> {
        self.with_state(|s| {
            if s.fail_enter {
                return Err(TransportError::Connect("scripted failure".into()));
            }
            if s.joined.contains_key(room) {
                return Err(TransportError::AlreadyJoined(room.to_string()));
            }
            s.calls.push(TransportCall::Enter {
                room: room.clone(),
                address: address.to_string(),
                subscription: listener.subscription(),
            });
            s.joined.insert(room.clone(), listener);
            s.max_active = s.max_active.max(s.joined.len());
            Ok(())
        })
    }

    async fn leave_room(&self, room: &RoomKey) -> Result<(), TransportError> {
        self.with_state(|s| {
            s.calls.push(TransportCall::Leave(room.clone()));
            if s.joined.remove(room).is_none() {
                return Err(TransportError::NotJoined(room.to_string()));
            }
            if s.fail_leave {
                return Err(TransportError::Send("scripted failure".into()));
            }
            Ok(())
        })
    }

    async fn send(&self, room: &RoomKey, frame: &str) -> Result<(), TransportError> {
        self.with_state(|s| {
            if s.fail_send {
                return Err(TransportError::Send("scripted failure".into()));
            }
            if !s.joined.contains_key(room) {
                return Err(TransportError::NotJoined(room.to_string()));
            }
            s.calls.push(TransportCall::Send(frame.to_string()));
            Ok(())
        })
    }

    async fn reconnect(&self, room: &RoomKey) -> Result<(), TransportError> {
        self.with_state(|s| {
            s.calls.push(TransportCall::Reconnect(room.clone()));
            if s.fail_reconnect {
                // Same as the socket transport: a failed redial drops the room.
                s.joined.remove(room);
                return Err(TransportError::Connect("scripted failure".into()));
            }
            Ok(())
        })
    }
}

enum Script {
    Address(String),
    Status(u16),
    Hang,
}

/// Address resolver with a fixed answer.
pub struct ScriptedResolver {
    script: Script,
    requests: Mutex<Vec<String>>,
}

impl ScriptedResolver {
    fn with(script: Script) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn ok(address: &str) -> Self {
        Self::with(Script::Address(address.to_string()))
    }

    pub fn failing(status: u16) -> Self {
        Self::with(Script::Status(status))
    }

    /// Never answers.
    pub fn hanging() -> Self {
        Self::with(Script::Hang)
    }

    /// Agent ids looked up so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("resolver lock").clone()
    }
}

#[async_trait]
impl AddressResolver for ScriptedResolver {
    async fn resolve(&self, agent_id: &str) -> Result<String, ApiError> {
        self.requests
            .lock()
            .expect("resolver lock")
            .push(agent_id.to_string());
        match &self.script {
            Script::Address(address) => Ok(address.clone()),
            Script::Status(code) => Err(ApiError::Status {
                code: *code,
                body: "scripted".into(),
            }),
            Script::Hang => std::future::pending().await,
        }
    }
}

/// What [`FakeStore`] has been asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Create(Agent),
    Update(String, Agent),
    Describe(String),
}

/// In-memory agent store. Created agents get ids `agent-1`, `agent-2`, ...
#[derive(Default)]
pub struct FakeStore {
    calls: Mutex<Vec<StoreCall>>,
    description: Option<String>,
    fail: bool,
    hang: bool,
}

impl FakeStore {
    pub fn describing(description: &str) -> Self {
        Self {
            description: Some(description.to_string()),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Create and update calls are recorded and then never answered.
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().expect("store lock").clone()
    }

    fn record(&self, call: StoreCall) -> Result<usize, ApiError> {
        let mut calls = self.calls.lock().expect("store lock");
        calls.push(call);
        if self.fail {
            return Err(ApiError::Status {
                code: 500,
                body: "scripted".into(),
            });
        }
        Ok(calls
            .iter()
            .filter(|c| matches!(c, StoreCall::Create(_)))
            .count())
    }
}

#[async_trait]
impl AgentStore for FakeStore {
    async fn create_agent(&self, agent: &Agent) -> Result<Agent, ApiError> {
        let n = self.record(StoreCall::Create(agent.clone()))?;
        if self.hang {
            std::future::pending::<()>().await;
        }
        Ok(Agent {
            ai_agent_id: format!("agent-{n}"),
            ..agent.clone()
        })
    }

    async fn update_agent(&self, agent_id: &str, agent: &Agent) -> Result<Agent, ApiError> {
        self.record(StoreCall::Update(agent_id.to_string(), agent.clone()))?;
        if self.hang {
            std::future::pending::<()>().await;
        }
        Ok(Agent {
            ai_agent_id: agent_id.to_string(),
            ..agent.clone()
        })
    }

    async fn generate_description(&self, prompt: &str) -> Result<String, ApiError> {
        self.record(StoreCall::Describe(prompt.to_string()))?;
        Ok(self
            .description
            .clone()
            .unwrap_or_else(|| format!("Generated from: {prompt}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_dir_fixture_writes_files() {
        let fixture = TestTempDir::new("fixture");
        let file = fixture.write_text("nested/agent.toml", "name = \"x\"");
        assert_eq!(fs::read_to_string(file).unwrap(), "name = \"x\"");
        assert!(fixture.path().exists());
    }

    #[test]
    fn delta_line_uses_wire_field_names() {
        let v: serde_json::Value = serde_json::from_str(&delta_line("t", "hi")).unwrap();
        assert_eq!(v["data"]["threadID"], "t");
        assert_eq!(v["data"]["sender"], 2);
        assert_eq!(v["errorCode"], 0);
    }

    #[tokio::test]
    async fn recording_transport_rejects_double_join() {
        let transport = RecordingTransport::default();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let room = RoomKey::agent();
        transport
            .enter_room(&room, "ws://a", FrameListener::new(1, tx.clone()))
            .await
            .unwrap();
        let err = transport
            .enter_room(&room, "ws://a", FrameListener::new(2, tx))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::AlreadyJoined(_)));
        assert_eq!(transport.max_active_rooms(), 1);
    }

    #[tokio::test]
    async fn serve_http_once_captures_body() {
        let (base, request) = serve_http_once(201, "{}").await;
        let resp = reqwest::Client::new()
            .post(format!("{base}/x"))
            .body("payload")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 201);
        let request = request.await.unwrap();
        assert!(request.starts_with("POST /x "));
        assert!(request.ends_with("payload"));
    }
}
