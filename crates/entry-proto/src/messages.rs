//! Protocol message definitions.
//!
//! The layouts match the gateway's protobuf schema:
//!
//! ```text
//! message RequestMessage  { RequestType  msgType = 1; bytes content = 2; }
//! message ResponseMessage { ResponseType msgType = 1; bytes content = 2; }
//! ```

use std::fmt;

use prost::Message;

use crate::error::ProtoError;

/// Kind of a client-to-gateway message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum RequestType {
    /// Raw bytes for the remote shell's stdin.
    Plain = 0,
    /// Window size change, content is `"<width> <height>"`.
    Winch = 1,
}

/// Kind of a gateway-to-client message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ResponseType {
    /// Output from the remote stdout.
    Stdout = 0,
    /// Output from the remote stderr.
    Stderr = 1,
    /// Session is over; content is a message for the user.
    Close = 2,
    /// Keep-alive sent periodically by the gateway.
    Ping = 3,
}

/// Message sent from the client to the gateway.
#[derive(Clone, PartialEq, Message)]
pub struct RequestMessage {
    /// Message type discriminator, a [`RequestType`].
    #[prost(enumeration = "RequestType", tag = "1")]
    pub msg_type: i32,
    /// Payload.
    #[prost(bytes = "vec", tag = "2")]
    pub content: Vec<u8>,
}

impl RequestMessage {
    /// Keystrokes (or any stdin bytes) for the remote shell.
    #[must_use]
    pub fn plain(content: impl Into<Vec<u8>>) -> Self {
        Self {
            msg_type: RequestType::Plain.into(),
            content: content.into(),
        }
    }

    /// Window size change notification.
    #[must_use]
    pub fn winch(size: WindowSize) -> Self {
        Self {
            msg_type: RequestType::Winch.into(),
            content: size.to_string().into_bytes(),
        }
    }

    /// Returns the decoded message type.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::InvalidMessageType`] for unknown discriminators.
    pub fn kind(&self) -> Result<RequestType, ProtoError> {
        RequestType::try_from(self.msg_type)
            .map_err(|_| ProtoError::InvalidMessageType(self.msg_type))
    }
}

/// Message sent from the gateway to the client.
#[derive(Clone, PartialEq, Message)]
pub struct ResponseMessage {
    /// Message type discriminator, a [`ResponseType`].
    #[prost(enumeration = "ResponseType", tag = "1")]
    pub msg_type: i32,
    /// Payload.
    #[prost(bytes = "vec", tag = "2")]
    pub content: Vec<u8>,
}

impl ResponseMessage {
    /// Builds a response of the given type.
    #[must_use]
    pub fn new(kind: ResponseType, content: impl Into<Vec<u8>>) -> Self {
        Self {
            msg_type: kind.into(),
            content: content.into(),
        }
    }

    /// Remote stdout chunk.
    #[must_use]
    pub fn stdout(content: impl Into<Vec<u8>>) -> Self {
        Self::new(ResponseType::Stdout, content)
    }

    /// Remote stderr chunk.
    #[must_use]
    pub fn stderr(content: impl Into<Vec<u8>>) -> Self {
        Self::new(ResponseType::Stderr, content)
    }

    /// End-of-session notice.
    #[must_use]
    pub fn close(content: impl Into<Vec<u8>>) -> Self {
        Self::new(ResponseType::Close, content)
    }

    /// Keep-alive, carrying `"ping"` like the gateway does.
    #[must_use]
    pub fn ping() -> Self {
        Self::new(ResponseType::Ping, b"ping".to_vec())
    }

    /// Returns the decoded message type.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::InvalidMessageType`] for unknown discriminators.
    pub fn kind(&self) -> Result<ResponseType, ProtoError> {
        ResponseType::try_from(self.msg_type)
            .map_err(|_| ProtoError::InvalidMessageType(self.msg_type))
    }
}

/// Terminal dimensions carried by a WINCH message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    /// Columns.
    pub width: u16,
    /// Rows.
    pub height: u16,
}

impl WindowSize {
    /// Creates a window size.
    #[must_use]
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Parses a WINCH payload.
    ///
    /// The payload must be exactly two decimal integers separated by a single
    /// space. The gateway drops anything else, so this does too.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::InvalidWindowSize`] if the payload is malformed.
    pub fn parse(payload: &[u8]) -> Result<Self, ProtoError> {
        let invalid = || ProtoError::InvalidWindowSize(String::from_utf8_lossy(payload).into_owned());

        let text = std::str::from_utf8(payload).map_err(|_| invalid())?;
        let parts: Vec<&str> = text.split(' ').collect();
        let [width, height] = parts.as_slice() else {
            return Err(invalid());
        };

        let width = width.parse::<u16>().map_err(|_| invalid())?;
        let height = height.parse::<u16>().map_err(|_| invalid())?;
        Ok(Self { width, height })
    }
}

impl fmt::Display for WindowSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.width, self.height)
    }
}

impl From<(u16, u16)> for WindowSize {
    fn from((width, height): (u16, u16)) -> Self {
        Self { width, height }
    }
}
