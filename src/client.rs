//! HTTP client for the Hecate daemon.
//!
//! One client serves both transports the resolver can produce: plain URLs go
//! through reqwest, Unix sockets speak HTTP/1.0 directly over the stream.
//! HTTP/1.0 responses cannot be chunked, so streaming bodies read as plain
//! newline-delimited lines until EOF, which is exactly the shape the
//! daemon's event-stream endpoints produce.

use std::path::Path;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

use crate::connection::Transport;

// === Errors ===

/// Typed failures crossing the daemon boundary.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("socket I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("daemon returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Parse(String),
}

impl DaemonError {
    /// Transport-level failures recover via retry/reconnect; the rest are
    /// surfaced and dropped.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, DaemonError::Http(_) | DaemonError::Io(_))
    }
}

// === Daemon API types ===

/// Daemon liveness as shown in the status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HealthStatus {
    #[default]
    Unknown,
    Healthy,
    Degraded,
    Error,
}

impl HealthStatus {
    /// Short label used in the UI footer.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            HealthStatus::Unknown => "…",
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Error => "error",
        }
    }
}

/// One entry in the daemon's conversation index.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Pairing handshake data for the pair overlay.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PairingTicket {
    pub code: String,
    #[serde(default)]
    pub expires_secs: Option<u64>,
}

/// Request body for `/chat/stream`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation: Option<String>,
    pub message: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

/// Events from an in-flight chat response stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// Incremental response text.
    Delta { text: String },
    /// Tool activity inside the response, surfaced to the active panel.
    ToolCall { name: String, input: Value },
    /// The response finished cleanly.
    Done,
    /// The stream broke or the daemon reported failure.
    Failed { message: String },
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
struct ConversationIndex {
    conversations: Vec<Conversation>,
}

// === Client ===

/// Thin request layer over the resolved transport.
#[derive(Debug, Clone)]
pub struct DaemonClient {
    transport: Transport,
    http: reqwest::Client,
}

impl DaemonClient {
    #[must_use]
    pub fn new(transport: Transport) -> Self {
        Self {
            transport,
            http: reqwest::Client::new(),
        }
    }

    #[must_use]
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Liveness probe. Failure is a status, never an error: the poller must
    /// outlive any daemon outage.
    pub async fn health(&self) -> HealthStatus {
        match self.get_body("/health").await {
            Ok(body) => health_from_body(&body),
            Err(err) => {
                tracing::debug!("health probe failed: {}", err);
                HealthStatus::Error
            }
        }
    }

    /// Conversation index for the browse overlay.
    pub async fn conversations(&self) -> Result<Vec<Conversation>, DaemonError> {
        let body = self.get_body("/conversations").await?;
        let index: ConversationIndex = serde_json::from_str(&body)
            .map_err(|err| DaemonError::Parse(format!("conversation index: {err}")))?;
        Ok(index.conversations)
    }

    /// Request a pairing code for the pair overlay.
    pub async fn pairing_code(&self) -> Result<PairingTicket, DaemonError> {
        let body = self.post_body("/pair", "{}").await?;
        serde_json::from_str(&body)
            .map_err(|err| DaemonError::Parse(format!("pairing ticket: {err}")))
    }

    /// Open the fact feed as a line stream. Framing and reconnect policy
    /// belong to the caller.
    pub async fn open_fact_stream(&self) -> Result<BodyLines, DaemonError> {
        self.open_lines("GET", "/facts/stream", None).await
    }

    /// Stream a chat response. Yields `ChatEvent`s until `Done` or `Failed`;
    /// the caller wraps this in its own cancellation scope.
    pub async fn chat_stream(
        &self,
        request: &ChatRequest,
    ) -> Result<ChatEventStream, DaemonError> {
        let payload = serde_json::to_string(request)
            .map_err(|err| DaemonError::Parse(format!("chat request: {err}")))?;
        let mut lines = self.open_lines("POST", "/chat/stream", Some(payload)).await?;

        let stream = async_stream::stream! {
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if let Some(event) = parse_chat_line(&line) {
                            let done = matches!(event, ChatEvent::Done);
                            yield event;
                            if done {
                                break;
                            }
                        }
                    }
                    Ok(None) => {
                        yield ChatEvent::Done;
                        break;
                    }
                    Err(err) => {
                        yield ChatEvent::Failed {
                            message: err.to_string(),
                        };
                        break;
                    }
                }
            }
        };
        Ok(Box::pin(stream))
    }

    // === Transport plumbing ===

    async fn get_body(&self, path: &str) -> Result<String, DaemonError> {
        match &self.transport {
            Transport::Url(base) => {
                let url = format!("{}{path}", base.trim_end_matches('/'));
                let response = self.http.get(&url).send().await?;
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                if !status.is_success() {
                    return Err(DaemonError::Status {
                        status: status.as_u16(),
                        body,
                    });
                }
                Ok(body)
            }
            Transport::Socket(socket) => {
                let head = format!(
                    "GET {path} HTTP/1.0\r\nHost: hecate\r\nAccept: application/json\r\nConnection: close\r\n\r\n"
                );
                let mut reader = socket_request(socket, &head).await?;
                let mut body = String::new();
                reader.read_to_string_lossy(&mut body).await?;
                Ok(body)
            }
        }
    }

    async fn post_body(&self, path: &str, payload: &str) -> Result<String, DaemonError> {
        match &self.transport {
            Transport::Url(base) => {
                let url = format!("{}{path}", base.trim_end_matches('/'));
                let response = self
                    .http
                    .post(&url)
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(payload.to_string())
                    .send()
                    .await?;
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                if !status.is_success() {
                    return Err(DaemonError::Status {
                        status: status.as_u16(),
                        body,
                    });
                }
                Ok(body)
            }
            Transport::Socket(socket) => {
                let head = format!(
                    "POST {path} HTTP/1.0\r\nHost: hecate\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
                    payload.len()
                );
                let mut reader = socket_request(socket, &head).await?;
                let mut body = String::new();
                reader.read_to_string_lossy(&mut body).await?;
                Ok(body)
            }
        }
    }

    async fn open_lines(
        &self,
        method: &str,
        path: &str,
        payload: Option<String>,
    ) -> Result<BodyLines, DaemonError> {
        match &self.transport {
            Transport::Url(base) => {
                let url = format!("{}{path}", base.trim_end_matches('/'));
                let mut request = match method {
                    "POST" => self.http.post(&url),
                    _ => self.http.get(&url),
                };
                request = request.header(reqwest::header::ACCEPT, "text/event-stream");
                if let Some(payload) = payload {
                    request = request
                        .header(reqwest::header::CONTENT_TYPE, "application/json")
                        .body(payload);
                }
                let response = request.send().await?;
                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(DaemonError::Status {
                        status: status.as_u16(),
                        body,
                    });
                }
                Ok(BodyLines::http(response.bytes_stream()))
            }
            Transport::Socket(socket) => {
                let head = match &payload {
                    Some(payload) => format!(
                        "{method} {path} HTTP/1.0\r\nHost: hecate\r\nAccept: text/event-stream\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
                        payload.len()
                    ),
                    None => format!(
                        "{method} {path} HTTP/1.0\r\nHost: hecate\r\nAccept: text/event-stream\r\nConnection: close\r\n\r\n"
                    ),
                };
                let reader = socket_request(socket, &head).await?;
                Ok(BodyLines::Socket(reader))
            }
        }
    }
}

// === Line-oriented response bodies ===

/// Chat events behind one pointer so both transports share a signature.
pub type ChatEventStream = Pin<Box<dyn Stream<Item = ChatEvent> + Send>>;

type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

/// A streaming response body exposed as newline-delimited lines, whichever
/// transport produced it.
pub enum BodyLines {
    Http {
        stream: ByteStream,
        buffer: Vec<u8>,
        ended: bool,
    },
    Socket(SocketBody),
}

impl BodyLines {
    fn http<S>(stream: S) -> Self
    where
        S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
    {
        BodyLines::Http {
            stream: Box::pin(stream),
            buffer: Vec::new(),
            ended: false,
        }
    }

    /// Next line with the trailing `\r?\n` removed; `None` at end of body.
    pub async fn next_line(&mut self) -> Result<Option<String>, DaemonError> {
        match self {
            BodyLines::Http {
                stream,
                buffer,
                ended,
            } => loop {
                if let Some(position) = buffer.iter().position(|&byte| byte == b'\n') {
                    let raw: Vec<u8> = buffer.drain(..=position).collect();
                    let line = String::from_utf8_lossy(&raw[..position])
                        .trim_end_matches('\r')
                        .to_string();
                    return Ok(Some(line));
                }
                if *ended {
                    return Ok(None);
                }
                match stream.next().await {
                    Some(Ok(chunk)) => buffer.extend_from_slice(&chunk),
                    Some(Err(err)) => return Err(DaemonError::Http(err)),
                    None => *ended = true,
                }
            },
            BodyLines::Socket(body) => body.next_line().await,
        }
    }
}

/// HTTP/1.0 response body on a Unix socket, headers already consumed.
pub struct SocketBody {
    reader: BufReader<UnixStream>,
}

impl SocketBody {
    async fn next_line(&mut self) -> Result<Option<String>, DaemonError> {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line).await?;
        if read == 0 {
            return Ok(None);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }

    async fn read_to_string_lossy(&mut self, out: &mut String) -> Result<(), DaemonError> {
        let mut bytes = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut self.reader, &mut bytes).await?;
        out.push_str(&String::from_utf8_lossy(&bytes));
        Ok(())
    }
}

/// Send a raw HTTP/1.0 request over the socket and position the reader at
/// the start of the body.
async fn socket_request(socket: &Path, head: &str) -> Result<SocketBody, DaemonError> {
    let mut stream = UnixStream::connect(socket).await?;
    stream.write_all(head.as_bytes()).await?;
    stream.flush().await?;

    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line).await?;
    let status = parse_status_line(&line)?;

    // Drain headers to the blank separator.
    loop {
        line.clear();
        let read = reader.read_line(&mut line).await?;
        if read == 0 || line.trim().is_empty() {
            break;
        }
    }

    if !(200..300).contains(&status) {
        let mut body = SocketBody { reader };
        let mut text = String::new();
        body.read_to_string_lossy(&mut text).await?;
        return Err(DaemonError::Status {
            status,
            body: text,
        });
    }
    Ok(SocketBody { reader })
}

/// Parse `HTTP/1.x NNN Reason` into the status code.
fn parse_status_line(line: &str) -> Result<u16, DaemonError> {
    let mut parts = line.split_whitespace();
    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/") {
        return Err(DaemonError::Parse(format!("bad status line: {line:?}")));
    }
    parts
        .next()
        .and_then(|code| code.parse().ok())
        .ok_or_else(|| DaemonError::Parse(format!("bad status line: {line:?}")))
}

/// Map a `/health` body to a status. Accepts a JSON envelope or a bare
/// token; anything unrecognized counts as degraded.
fn health_from_body(body: &str) -> HealthStatus {
    let token = serde_json::from_str::<HealthResponse>(body)
        .map(|response| response.status)
        .unwrap_or_else(|_| body.trim().to_string());
    match token.to_ascii_lowercase().as_str() {
        "healthy" | "ok" => HealthStatus::Healthy,
        "error" | "down" => HealthStatus::Error,
        _ => HealthStatus::Degraded,
    }
}

/// Decode one chat-stream line into an event. Heartbeats and the `[DONE]`
/// sentinel produce `Done`; unknown envelopes are skipped.
fn parse_chat_line(line: &str) -> Option<ChatEvent> {
    if line.is_empty() || line.starts_with(':') {
        return None;
    }
    let data = line.strip_prefix("data:")?.trim_start();
    if data == "[DONE]" {
        return Some(ChatEvent::Done);
    }
    let value: Value = match serde_json::from_str(data) {
        Ok(value) => value,
        Err(err) => {
            return Some(ChatEvent::Failed {
                message: format!("malformed chat chunk: {err}"),
            });
        }
    };
    if let Some(delta) = value.get("delta").and_then(Value::as_str) {
        return Some(ChatEvent::Delta {
            text: delta.to_string(),
        });
    }
    if let Some(call) = value.get("tool_call") {
        let name = call
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        let input = call.get("input").cloned().unwrap_or(Value::Null);
        return Some(ChatEvent::ToolCall { name, input });
    }
    if value.get("done").and_then(Value::as_bool) == Some(true) {
        return Some(ChatEvent::Done);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn status_line_parse_accepts_both_http_versions() {
        assert_eq!(parse_status_line("HTTP/1.0 200 OK\r\n").unwrap(), 200);
        assert_eq!(parse_status_line("HTTP/1.1 503 Busy\r\n").unwrap(), 503);
        assert!(parse_status_line("SPDY nope").is_err());
        assert!(parse_status_line("HTTP/1.1").is_err());
    }

    #[test]
    fn health_body_maps_to_status() {
        assert_eq!(health_from_body("{\"status\":\"healthy\"}"), HealthStatus::Healthy);
        assert_eq!(health_from_body("ok"), HealthStatus::Healthy);
        assert_eq!(health_from_body("{\"status\":\"draining\"}"), HealthStatus::Degraded);
        assert_eq!(health_from_body("{\"status\":\"down\"}"), HealthStatus::Error);
    }

    #[test]
    fn chat_lines_decode_to_events() {
        assert_eq!(parse_chat_line(""), None);
        assert_eq!(parse_chat_line(": keepalive"), None);
        assert_eq!(parse_chat_line("data: [DONE]"), Some(ChatEvent::Done));
        assert_eq!(
            parse_chat_line("data: {\"delta\":\"hi\"}"),
            Some(ChatEvent::Delta {
                text: "hi".to_string()
            })
        );
        let event = parse_chat_line("data: {\"tool_call\":{\"name\":\"scry\",\"input\":{\"q\":1}}}");
        match event {
            Some(ChatEvent::ToolCall { name, input }) => {
                assert_eq!(name, "scry");
                assert_eq!(input["q"], 1);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn malformed_chat_chunk_fails_without_panicking() {
        match parse_chat_line("data: {not json") {
            Some(ChatEvent::Failed { message }) => {
                assert!(message.contains("malformed"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn chat_stream_yields_deltas_then_done() {
        let server = MockServer::start().await;
        let body = concat!(
            "data: {\"delta\":\"He\"}\n",
            "data: {\"delta\":\"cate\"}\n",
            ": keepalive\n",
            "data: {\"tool_call\":{\"name\":\"scry\",\"input\":{\"depth\":2}}}\n",
            "data: [DONE]\n",
        );
        Mock::given(method("POST"))
            .and(path("/chat/stream"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let client = DaemonClient::new(Transport::Url(server.uri()));
        let request = ChatRequest {
            conversation: None,
            message: "hello".to_string(),
            model: "hecate-core".to_string(),
            system: None,
        };
        let mut stream = client.chat_stream(&request).await.unwrap();
        let mut events = Vec::new();
        while let Some(event) = stream.next().await {
            events.push(event);
        }

        assert_eq!(events.len(), 4, "events: {events:#?}");
        assert_eq!(
            events[0],
            ChatEvent::Delta {
                text: "He".to_string()
            }
        );
        assert_eq!(
            events[1],
            ChatEvent::Delta {
                text: "cate".to_string()
            }
        );
        match &events[2] {
            ChatEvent::ToolCall { name, input } => {
                assert_eq!(name, "scry");
                assert_eq!(input["depth"], 2);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(events[3], ChatEvent::Done);
    }

    #[tokio::test]
    async fn health_probe_maps_outages_to_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("{\"status\":\"healthy\"}"),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;

        let client = DaemonClient::new(Transport::Url(server.uri()));
        assert_eq!(client.health().await, HealthStatus::Healthy);
        // The mock is spent, so the next probe sees a failing daemon.
        assert_eq!(client.health().await, HealthStatus::Error);
    }
}
