use std::sync::{Arc, Mutex};
use std::time::Duration;

use chat_gateway::{GatewayClient, GatewayConfig, GatewayError};
use chat_provider::{ChatMessage, ChatProvider, ChatRequest, StreamError};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
struct Reply {
    status: u16,
    chunks: Vec<(u64, Vec<u8>)>,
    /// Keeps the connection open after the chunks instead of finishing the body.
    hang: bool,
}

impl Reply {
    fn text(status: u16, chunks: &[&str]) -> Self {
        Self {
            status,
            chunks: chunks
                .iter()
                .map(|chunk| (0, chunk.as_bytes().to_vec()))
                .collect(),
            hang: false,
        }
    }
}

struct StubGateway {
    base_url: String,
    seen: Arc<Mutex<Vec<(String, String)>>>,
    handle: JoinHandle<()>,
}

impl StubGateway {
    async fn start(reply: Reply) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("local TCP listener should bind");
        let addr = listener.local_addr().expect("listener address");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let handle = tokio::spawn({
            let seen = Arc::clone(&seen);
            async move {
                while let Ok((socket, _)) = listener.accept().await {
                    let seen = Arc::clone(&seen);
                    let reply = reply.clone();
                    tokio::spawn(async move { serve(socket, reply, seen).await });
                }
            }
        });
        Self {
            base_url: format!("http://{addr}"),
            seen,
            handle,
        }
    }

    fn requests(&self) -> Vec<(String, String)> {
        self.seen.lock().expect("seen lock").clone()
    }
}

impl Drop for StubGateway {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(mut socket: TcpStream, reply: Reply, seen: Arc<Mutex<Vec<(String, String)>>>) {
    let mut raw = Vec::new();
    let mut buf = [0_u8; 1024];
    let header_end = loop {
        let Ok(read) = socket.read(&mut buf).await else {
            return;
        };
        if read == 0 {
            return;
        }
        raw.extend_from_slice(&buf[..read]);
        if let Some(pos) = raw.windows(4).position(|window| window == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&raw[..header_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    while raw.len() < header_end + content_length {
        let Ok(read) = socket.read(&mut buf).await else {
            return;
        };
        if read == 0 {
            break;
        }
        raw.extend_from_slice(&buf[..read]);
    }
    let request_line = head.lines().next().unwrap_or_default().to_string();
    let body = String::from_utf8_lossy(&raw[header_end..]).to_string();
    seen.lock().expect("seen lock").push((request_line, body));

    let headers = format!(
        "HTTP/1.1 {} X\r\nContent-Type: text/plain\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n",
        reply.status
    );
    if socket.write_all(headers.as_bytes()).await.is_err() {
        return;
    }
    for (delay_ms, bytes) in reply.chunks {
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
        let frame = [
            format!("{:x}\r\n", bytes.len()).into_bytes(),
            bytes,
            b"\r\n".to_vec(),
        ]
        .concat();
        if socket.write_all(&frame).await.is_err() {
            return;
        }
        let _ = socket.flush().await;
    }
    if reply.hang {
        tokio::time::sleep(Duration::from_secs(30)).await;
        return;
    }
    let _ = socket.write_all(b"0\r\n\r\n").await;
}

fn request(message: &str, history: Vec<ChatMessage>) -> ChatRequest {
    ChatRequest {
        session_id: "sess-1".to_string(),
        message: message.to_string(),
        history,
    }
}

fn client(base_url: &str) -> GatewayClient {
    GatewayClient::new(GatewayConfig::new(base_url)).expect("client should build")
}

#[tokio::test]
async fn chat_streams_body_and_posts_expected_json() {
    let gateway = StubGateway::start(Reply::text(200, &["Hello ", "wor", "ld"])).await;
    let mut fragments: Vec<String> = Vec::new();

    client(&gateway.base_url)
        .stream_chat(
            request("hi", vec![ChatMessage::user("before")]),
            CancellationToken::new(),
            &mut fragments,
        )
        .await
        .expect("stream should succeed");

    assert_eq!(fragments.concat(), "Hello world");
    let requests = gateway.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].0.starts_with("POST /chat "));
    let body: Value = serde_json::from_str(&requests[0].1).expect("json body");
    assert_eq!(
        body,
        json!({
            "message": "hi",
            "sessionId": "sess-1",
            "history": [{"role": "user", "content": "before"}]
        })
    );
}

#[tokio::test]
async fn rate_limit_status_maps_to_rate_limited() {
    let gateway = StubGateway::start(Reply::text(429, &["slow down"])).await;
    let mut fragments: Vec<String> = Vec::new();

    let result = client(&gateway.base_url)
        .stream_chat(request("hi", Vec::new()), CancellationToken::new(), &mut fragments)
        .await;

    assert_eq!(result, Err(StreamError::RateLimited));
    assert!(fragments.is_empty());
}

#[tokio::test]
async fn server_error_carries_status_and_body() {
    let gateway = StubGateway::start(Reply::text(500, &["boom"])).await;
    let mut fragments: Vec<String> = Vec::new();

    let result = client(&gateway.base_url)
        .stream_chat(request("hi", Vec::new()), CancellationToken::new(), &mut fragments)
        .await;

    let error = result.expect_err("500 should fail");
    assert_eq!(error.to_string(), "AI gateway error (status 500): boom");
}

#[tokio::test]
async fn cancellation_stops_a_hanging_body() {
    let mut reply = Reply::text(200, &["partial "]);
    reply.hang = true;
    let gateway = StubGateway::start(reply).await;
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let mut fragments: Vec<String> = Vec::new();
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        client(&gateway.base_url).stream_chat(request("hi", Vec::new()), cancel, &mut fragments),
    )
    .await
    .expect("cancellation should end the stream promptly");

    assert_eq!(result, Err(StreamError::Cancelled));
    assert_eq!(fragments, vec!["partial ".to_string()]);
}

#[tokio::test]
async fn unreachable_gateway_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let mut fragments: Vec<String> = Vec::new();
    let result = client(&format!("http://{addr}"))
        .stream_chat(request("hi", Vec::new()), CancellationToken::new(), &mut fragments)
        .await;

    assert!(matches!(result, Err(StreamError::Transport(_))));
}

#[tokio::test]
async fn health_reports_non_ok_status() {
    let healthy = StubGateway::start(Reply::text(200, &["ok"])).await;
    client(&healthy.base_url)
        .health()
        .await
        .expect("200 should be healthy");
    assert!(healthy.requests()[0].0.starts_with("GET /health "));

    let unhealthy = StubGateway::start(Reply::text(503, &["down"])).await;
    let error = client(&unhealthy.base_url)
        .health()
        .await
        .expect_err("503 should be unhealthy");
    assert!(matches!(error, GatewayError::Unhealthy(503)));
}
