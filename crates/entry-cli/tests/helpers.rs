//! Test helpers: a scripted in-process gateway.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use entry_cli::{ConnectionRequest, SessionMode};
use entry_proto::{RequestMessage, RequestType, ResponseMessage, WindowSize, WireFormat};
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http;
use tokio_tungstenite::{WebSocketStream, accept_hdr_async};

/// Default test timeout.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One scripted gateway action.
#[derive(Debug)]
pub enum Step {
    /// Encode and send a response.
    Send(ResponseMessage),
    /// Send bytes as-is in a binary frame.
    SendRaw(Vec<u8>),
    /// Read until this many client requests have been recorded.
    Expect(usize),
    /// Drop the TCP connection without a close handshake.
    Hangup,
    /// Send a websocket close frame.
    CloseFrame,
}

/// What the gateway saw.
#[derive(Debug, Default)]
pub struct Recorded {
    /// Upgrade request path.
    pub path: String,
    /// Upgrade request query string.
    pub query: Option<String>,
    /// Upgrade request headers, lowercase names.
    pub headers: HashMap<String, String>,
    /// Decoded client requests, in arrival order.
    pub requests: Vec<RequestMessage>,
    /// Window sizes parsed from WINCH requests, in arrival order.
    pub sizes: Vec<WindowSize>,
    /// Web-mode container announcements.
    pub announcements: Vec<serde_json::Value>,
}

/// Gateway that serves exactly one connection.
pub struct MockGateway {
    pub addr: SocketAddr,
    handle: JoinHandle<Recorded>,
}

impl MockGateway {
    /// Start a gateway that runs `script` on the first connection, then
    /// drains the connection until the client goes away.
    pub async fn start(format: WireFormat, script: Vec<Step>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut recorded = Recorded::default();
            let mut ws = accept_recording(stream, &mut recorded).await;

            for step in script {
                match step {
                    Step::Send(msg) => {
                        let bytes = format.encode_response(&msg).unwrap();
                        ws.send(frame(format, bytes)).await.unwrap();
                    }
                    Step::SendRaw(bytes) => ws.send(Message::Binary(bytes)).await.unwrap(),
                    Step::Expect(n) => {
                        while recorded.requests.len() < n {
                            match ws.next().await {
                                Some(Ok(message)) => record(format, message, &mut recorded),
                                _ => return recorded,
                            }
                        }
                    }
                    Step::Hangup => return recorded,
                    Step::CloseFrame => {
                        let _ = ws.close(None).await;
                    }
                }
            }

            while let Some(Ok(message)) = ws.next().await {
                record(format, message, &mut recorded);
            }
            recorded
        });

        Self { addr, handle }
    }

    /// Start a gateway that refuses the upgrade with `status`.
    pub async fn rejecting(status: u16) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let callback = move |_: &Request, _: Response| -> Result<Response, ErrorResponse> {
                Err(http::Response::builder()
                    .status(status)
                    .body(Some("denied".to_string()))
                    .unwrap())
            };
            let _ = accept_hdr_async(stream, callback).await;
            Recorded::default()
        });

        Self { addr, handle }
    }

    /// Request pointing at this gateway.
    pub fn request(&self, mode: SessionMode) -> ConnectionRequest {
        ConnectionRequest::new(
            self.addr.ip().to_string(),
            self.addr.port().to_string(),
            "172.17.0.2",
            "abc123",
            "xterm",
        )
        .with_mode(mode)
    }

    /// Wait for the connection to finish and return what was seen.
    pub async fn finish(self) -> Recorded {
        timeout(TEST_TIMEOUT, self.handle)
            .await
            .expect("gateway did not finish")
            .expect("gateway task panicked")
    }
}

async fn accept_recording(stream: TcpStream, recorded: &mut Recorded) -> WebSocketStream<TcpStream> {
    let callback = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        recorded.path = req.uri().path().to_string();
        recorded.query = req.uri().query().map(str::to_string);
        for (name, value) in req.headers() {
            recorded.headers.insert(
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            );
        }
        Ok(resp)
    };
    accept_hdr_async(stream, callback).await.unwrap()
}

fn frame(format: WireFormat, bytes: Vec<u8>) -> Message {
    if format.is_text() {
        Message::Text(String::from_utf8(bytes).unwrap())
    } else {
        Message::Binary(bytes)
    }
}

fn record(format: WireFormat, message: Message, recorded: &mut Recorded) {
    let bytes = match message {
        Message::Binary(bytes) => bytes,
        Message::Text(text) => {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
                if value.get("container_id").is_some() {
                    recorded.announcements.push(value);
                    return;
                }
            }
            text.into_bytes()
        }
        _ => return,
    };
    if let Ok(request) = format.decode_request(&bytes) {
        // The gateway rejects anything but "<width> <height>".
        if matches!(request.kind(), Ok(RequestType::Winch)) {
            let size = WindowSize::parse(&request.content).unwrap();
            recorded.sizes.push(size);
        }
        recorded.requests.push(request);
    }
}
