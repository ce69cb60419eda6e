//! Common test utilities
//!
//! An in-process HTTP server with scriptable pages and a notifier that
//! records what it was asked to send.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use pagewatch::notifications::api::{ChangeNotification, NotificationResult, Notifier};

/// What the server answers for one path
#[derive(Debug, Clone)]
pub enum Reply {
    Page {
        content_type: &'static str,
        body: String,
    },
    Status(u16),
    /// Accept the request and never answer
    Hang,
}

impl Reply {
    pub fn html(body: &str) -> Self {
        Reply::Page {
            content_type: "text/html; charset=utf-8",
            body: body.to_string(),
        }
    }

    pub fn xml(body: &str) -> Self {
        Reply::Page {
            content_type: "application/xml",
            body: body.to_string(),
        }
    }
}

#[derive(Default)]
struct ServerState {
    replies: HashMap<String, Reply>,
    user_agents: Vec<String>,
    requests: usize,
}

pub struct PageServer {
    address: SocketAddr,
    state: Arc<Mutex<ServerState>>,
}

impl PageServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(ServerState::default()));

        let shared = state.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(handle(socket, shared.clone()));
            }
        });

        Self { address, state }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.address, path)
    }

    pub fn set(&self, path: &str, reply: Reply) {
        self.state
            .lock()
            .unwrap()
            .replies
            .insert(path.to_string(), reply);
    }

    pub fn user_agents(&self) -> Vec<String> {
        self.state.lock().unwrap().user_agents.clone()
    }

    pub fn requests(&self) -> usize {
        self.state.lock().unwrap().requests
    }
}

async fn handle(mut socket: TcpStream, state: Arc<Mutex<ServerState>>) {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(read) => buffer.extend_from_slice(&chunk[..read]),
        }
        if buffer.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }

    let head = String::from_utf8_lossy(&buffer).to_string();
    let path = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    let user_agent = head.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.eq_ignore_ascii_case("user-agent")
            .then(|| value.trim().to_string())
    });

    let reply = {
        let mut state = state.lock().unwrap();
        state.requests += 1;
        if let Some(agent) = user_agent {
            state.user_agents.push(agent);
        }
        state.replies.get(&path).cloned().unwrap_or(Reply::Status(404))
    };

    let response = match reply {
        Reply::Page { content_type, body } => format!(
            "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            content_type,
            body.len(),
            body
        ),
        Reply::Status(code) => format!(
            "HTTP/1.1 {} Scripted\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            code
        ),
        Reply::Hang => {
            tokio::time::sleep(Duration::from_secs(60)).await;
            return;
        }
    };
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Notifier that keeps every message it receives
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, ChangeNotification)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, ChangeNotification)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn notify(&self, owner_id: &str, change: &ChangeNotification) -> NotificationResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((owner_id.to_string(), change.clone()));
        Ok(())
    }
}
