//! Attach error types.
//!
//! Every variant maps to its own user-facing message through
//! [`AttachError::user_message`]. The raw error is only logged.

use std::io;
use std::time::Duration;

use entry_proto::ProtoError;
use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::error::ProtocolError;

/// Message shown when the gateway drops the session.
pub const SERVER_STOPPED_MESSAGE: &str = "Server stops the connection. Ask admin for help.";

/// Errors that end an attach attempt or a running session.
#[derive(Debug, Error)]
pub enum AttachError {
    /// The endpoint URL or one of the headers could not be built.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Nothing is listening at the gateway address.
    #[error("connection refused by {0}")]
    ConnectionRefused(String),

    /// The gateway did not finish the handshake in time.
    #[error("no answer from gateway within {0:?}")]
    Timeout(Duration),

    /// The websocket upgrade failed.
    #[error("websocket handshake failed: {0}")]
    Handshake(String),

    /// The gateway refused the upgrade with 401 or 403.
    #[error("gateway rejected the session with HTTP {0}")]
    Authentication(u16),

    /// The connection ended before the gateway sent a close notice.
    #[error("gateway closed the connection")]
    RemoteClosed,

    /// The websocket failed mid-session.
    #[error("transport error: {0}")]
    Transport(String),

    /// A frame could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtoError),

    /// The local terminal could not be configured.
    #[error("terminal error: {0}")]
    Terminal(#[source] io::Error),

    /// Reading stdin or writing stdout/stderr failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl AttachError {
    /// Classifies an error raised while opening the websocket.
    pub(crate) fn from_handshake(err: WsError, endpoint: &str) -> Self {
        match err {
            WsError::Io(e) if e.kind() == io::ErrorKind::ConnectionRefused => {
                Self::ConnectionRefused(endpoint.to_string())
            }
            WsError::Io(e) => Self::Transport(e.to_string()),
            WsError::Http(response) => {
                let status = response.status().as_u16();
                if status == 401 || status == 403 {
                    Self::Authentication(status)
                } else {
                    Self::Handshake(format!("HTTP {status}"))
                }
            }
            WsError::Url(e) => Self::InvalidEndpoint(e.to_string()),
            WsError::HttpFormat(e) => Self::InvalidEndpoint(e.to_string()),
            WsError::ConnectionClosed | WsError::AlreadyClosed => Self::RemoteClosed,
            other => Self::Handshake(other.to_string()),
        }
    }

    /// Classifies an error raised while the session is running.
    pub(crate) fn from_transport(err: WsError) -> Self {
        match err {
            WsError::ConnectionClosed
            | WsError::AlreadyClosed
            | WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake) => Self::RemoteClosed,
            WsError::Io(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::ConnectionReset
                        | io::ErrorKind::ConnectionAborted
                        | io::ErrorKind::BrokenPipe
                        | io::ErrorKind::UnexpectedEof
                ) =>
            {
                Self::RemoteClosed
            }
            other => Self::Transport(other.to_string()),
        }
    }

    /// Short, stable name for log fields.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidEndpoint(_) => "invalid_endpoint",
            Self::ConnectionRefused(_) => "connection_refused",
            Self::Timeout(_) => "timeout",
            Self::Handshake(_) => "handshake",
            Self::Authentication(_) => "authentication",
            Self::RemoteClosed => "remote_closed",
            Self::Transport(_) => "transport",
            Self::Protocol(_) => "protocol",
            Self::Terminal(_) => "terminal",
            Self::Io(_) => "io",
        }
    }

    /// Message printed for the user in place of the raw error.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidEndpoint(_) => "Invalid gateway address. Ask admin for help.",
            Self::ConnectionRefused(_) => "Gateway refused the connection. Ask admin for help.",
            Self::Timeout(_) => "Gateway did not answer in time. Ask admin for help.",
            Self::Handshake(_) => "Gateway rejected the session. Ask admin for help.",
            Self::Authentication(_) => {
                "You are not allowed to enter this container. Ask admin for help."
            }
            Self::RemoteClosed | Self::Transport(_) => SERVER_STOPPED_MESSAGE,
            Self::Protocol(_) => "Could not talk to the gateway. Ask admin for help.",
            Self::Terminal(_) | Self::Io(_) => "Local terminal failed. Ask admin for help.",
        }
    }
}
