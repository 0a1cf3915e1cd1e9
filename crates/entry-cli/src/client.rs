//! Gateway websocket client.
//!
//! Opens the websocket to the gateway, passing the target container and
//! terminal type as request headers, and hands the connection to a
//! [`Session`].
//!
//! # Example
//!
//! ```rust,no_run
//! use entry_cli::{AttachClient, ClientConfig, ConnectionRequest};
//!
//! # async fn example() -> Result<(), entry_cli::AttachError> {
//! let request = ConnectionRequest::new("10.0.0.1", "8080", "172.17.0.2", "abc123", "xterm");
//! let client = AttachClient::connect(&request, &ClientConfig::default()).await?;
//! let session = client.into_session();
//! # let _ = session;
//! # Ok(())
//! # }
//! ```

use entry_proto::{WireFormat, web_announcement};
use futures::SinkExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::AttachError;
use crate::request::{ConnectionRequest, SessionMode};
use crate::session::Session;

/// Connected, not yet relaying, gateway client.
pub struct AttachClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    mode: SessionMode,
    config: ClientConfig,
}

impl std::fmt::Debug for AttachClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachClient")
            .field("mode", &self.mode)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AttachClient {
    /// Connect to the gateway described by `request`.
    ///
    /// In web mode the container announcement is sent right after the
    /// upgrade, since that is how the gateway learns the container there.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is malformed, the connection fails or
    /// times out, or the gateway rejects the upgrade.
    pub async fn connect(
        request: &ConnectionRequest,
        config: &ClientConfig,
    ) -> Result<Self, AttachError> {
        let endpoint = request.endpoint_url(config.wire_format);
        let ws_request = build_request(&endpoint, request)?;

        debug!(url = %endpoint, mode = ?request.mode, "Connecting to gateway");

        let (mut ws, response) = timeout(config.connect_timeout, connect_async(ws_request))
            .await
            .map_err(|_| AttachError::Timeout(config.connect_timeout))?
            .map_err(|e| AttachError::from_handshake(e, &endpoint))?;

        debug!(status = %response.status(), "WebSocket upgraded");

        if config.wire_format == WireFormat::Json {
            let hello = web_announcement(&request.container_id)?;
            ws.send(Message::Text(hello))
                .await
                .map_err(AttachError::from_transport)?;
        }

        info!(
            container = %request.container_id,
            dockerd = %request.dockerd_ip,
            "Connected to gateway"
        );

        Ok(Self {
            ws,
            mode: request.mode,
            config: *config,
        })
    }

    /// Start relaying.
    #[must_use]
    pub fn into_session(self) -> Session<MaybeTlsStream<TcpStream>> {
        Session::new(self.ws, self.mode, &self.config)
    }
}

/// Builds the upgrade request with the gateway's custom headers.
fn build_request(endpoint: &str, request: &ConnectionRequest) -> Result<Request, AttachError> {
    let mut ws_request = endpoint
        .into_client_request()
        .map_err(|e| AttachError::InvalidEndpoint(e.to_string()))?;

    for (name, value) in request.headers() {
        let value = HeaderValue::from_str(value)
            .map_err(|e| AttachError::InvalidEndpoint(format!("header {name}: {e}")))?;
        ws_request
            .headers_mut()
            .insert(HeaderName::from_static(name), value);
    }

    Ok(ws_request)
}
