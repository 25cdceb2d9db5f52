//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use nem_bridge::config::{DispatcherConfig, EndpointConfig};
use nem_bridge::nem::{
    AnnounceResult, KeyPair, NemError, NemResult, Network, NodeFacade, TransactionPage,
    TransferRequest,
};
use nem_bridge::rpc::{nem_registry, Dispatcher, JsonRpcResponse};
use nem_bridge::Shutdown;

pub const ALICE: &str = "575dbb3062267eff57c970a336ebbc8fbcfe12c5bd3ed7bc11eb0481d7704ced";
pub const BOB: &str = "1ba9a2a6b5b3d0e1d77a9b39e0b0f3a1c2d4e5f60718293a4b5c6d7e8f901234";

pub fn public_key(private_key: &str) -> String {
    KeyPair::from_private_key(private_key).unwrap().public_key_hex()
}

pub fn testnet_address(private_key: &str) -> String {
    let keys = KeyPair::from_private_key(private_key).unwrap();
    nem_bridge::nem::address::from_public_key_bytes(keys.public_key(), Network::Testnet)
}

/// One request as seen by the mock node.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: String,
    /// Path including the query string.
    pub target: String,
    pub body: String,
}

/// Mock NIS node on an ephemeral port.
pub struct MockNode {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<MockRequest>>>,
}

impl MockNode {
    pub fn endpoint(&self, timeout_secs: u64) -> EndpointConfig {
        EndpointConfig {
            host: format!("http://{}", self.addr.ip()),
            port: self.addr.port(),
            timeout_secs,
        }
    }

    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_request(socket: &mut TcpStream) -> Option<MockRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();

    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();
    Some(MockRequest { method, target, body })
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// Start a mock node answering every request with `respond(request)`.
///
/// `respond` returns status, JSON body and a delay before answering.
pub async fn start_mock_node<F>(respond: F) -> MockNode
where
    F: Fn(&MockRequest) -> (u16, String, Duration) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let respond = Arc::new(respond);

    let seen = Arc::clone(&requests);
    tokio::spawn(async move {
        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => break,
            };
            let respond = Arc::clone(&respond);
            let seen = Arc::clone(&seen);
            tokio::spawn(async move {
                let Some(request) = read_request(&mut socket).await else {
                    return;
                };
                let (status, body, delay) = respond(&request);
                seen.lock().unwrap().push(request);

                tokio::time::sleep(delay).await;
                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    status_text(status),
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    MockNode { addr, requests }
}

/// Facade with scripted node answers and per-address delays.
///
/// Local key operations use the trait defaults.
pub struct ScriptedFacade {
    pub calls: AtomicUsize,
}

impl ScriptedFacade {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn page_for(&self, address: &str) -> NemResult<TransactionPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match address {
            "slow" => tokio::time::sleep(Duration::from_millis(300)).await,
            "hang" => std::future::pending::<()>().await,
            "broken" => {
                return Err(NemError::Node {
                    status: 500,
                    message: "database unavailable".to_string(),
                    body: Some(json!({"status": 500, "message": "database unavailable"})),
                })
            }
            _ => {}
        }
        let page: TransactionPage = serde_json::from_value(json!({
            "data": [{
                "meta": {"id": 1, "height": 2, "hash": {"data": address}, "innerHash": {}},
                "transaction": {"type": 257, "recipient": address}
            }]
        }))
        .map_err(|e| NemError::Decode(e.to_string()))?;
        Ok(page)
    }
}

#[async_trait]
impl NodeFacade for ScriptedFacade {
    fn network(&self) -> Network {
        Network::Testnet
    }

    async fn send_transfer(&self, request: TransferRequest) -> NemResult<AnnounceResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(AnnounceResult {
            kind: 1,
            code: 1,
            message: format!("SUCCESS {}", request.recipient),
            transaction_hash: None,
            inner_transaction_hash: None,
        })
    }

    async fn incoming_transactions(&self, address: &str) -> NemResult<TransactionPage> {
        self.page_for(address).await
    }

    async fn outgoing_transactions(&self, address: &str) -> NemResult<TransactionPage> {
        self.page_for(address).await
    }
}

/// Run a dispatcher over `input` to completion and return its response frames.
pub async fn serve_lines(facade: Arc<dyn NodeFacade>, input: &str) -> Vec<JsonRpcResponse> {
    let dispatcher = Dispatcher::new(nem_registry().unwrap(), facade, &DispatcherConfig::default());
    let shutdown = Shutdown::new();
    let mut out: Vec<u8> = Vec::new();

    dispatcher
        .serve(BufReader::new(input.as_bytes()), &mut out, shutdown.subscribe())
        .await
        .unwrap();

    parse_output(&out)
}

/// Split raw dispatcher output into response frames, checking each is one line.
pub fn parse_output(out: &[u8]) -> Vec<JsonRpcResponse> {
    let text = std::str::from_utf8(out).unwrap();
    assert!(text.is_empty() || text.ends_with('\n'), "output must end with a newline");
    text.lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

pub fn request(id: Value, method: &str, kwargs: Value) -> String {
    json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": {"args": [], "kwargs": kwargs},
        "id": id,
    })
    .to_string()
}
