//! Frame encodings.
//!
//! Terminal clients talk protobuf. Browser clients connect with
//! `?method=web`, announce the container in a JSON object and then exchange
//! JSON frames whose `content` is base64, which is how the gateway's JSON
//! marshaller renders byte slices.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use prost::Message;
use serde::{Deserialize, Serialize};

use crate::error::ProtoError;
use crate::messages::{RequestMessage, ResponseMessage};

/// Query string that switches the gateway into JSON mode.
pub const WEB_METHOD_QUERY: &str = "method=web";

/// Encoding used for every frame of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireFormat {
    /// Protobuf in binary frames.
    #[default]
    Protobuf,
    /// JSON in text frames.
    Json,
}

/// JSON shape of both message kinds.
#[derive(Debug, Default, Serialize, Deserialize)]
struct JsonFrame {
    #[serde(rename = "msgType", default, skip_serializing_if = "is_zero")]
    msg_type: i32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    content: String,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_zero(v: &i32) -> bool {
    *v == 0
}

impl JsonFrame {
    fn new(msg_type: i32, content: &[u8]) -> Self {
        Self {
            msg_type,
            content: STANDARD.encode(content),
        }
    }

    fn to_bytes(&self) -> Result<Vec<u8>, ProtoError> {
        serde_json::to_vec(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }

    fn from_bytes(bytes: &[u8]) -> Result<(i32, Vec<u8>), ProtoError> {
        let frame: Self =
            serde_json::from_slice(bytes).map_err(|e| ProtoError::Decoding(e.to_string()))?;
        let content = STANDARD
            .decode(frame.content.as_bytes())
            .map_err(|e| ProtoError::Decoding(format!("content is not base64: {e}")))?;
        Ok((frame.msg_type, content))
    }
}

impl WireFormat {
    /// Whether frames of this format travel as websocket text messages.
    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(self, Self::Json)
    }

    /// Query string the endpoint URL needs for this format, if any.
    #[must_use]
    pub const fn query(self) -> Option<&'static str> {
        match self {
            Self::Protobuf => None,
            Self::Json => Some(WEB_METHOD_QUERY),
        }
    }

    /// Encodes a client message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message type is unknown or serialization fails.
    pub fn encode_request(self, msg: &RequestMessage) -> Result<Vec<u8>, ProtoError> {
        msg.kind()?;
        match self {
            Self::Protobuf => Ok(msg.encode_to_vec()),
            Self::Json => JsonFrame::new(msg.msg_type, &msg.content).to_bytes(),
        }
    }

    /// Decodes a client message.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are malformed or the type is unknown.
    pub fn decode_request(self, bytes: &[u8]) -> Result<RequestMessage, ProtoError> {
        let msg = match self {
            Self::Protobuf => RequestMessage::decode(bytes)
                .map_err(|e| ProtoError::Decoding(e.to_string()))?,
            Self::Json => {
                let (msg_type, content) = JsonFrame::from_bytes(bytes)?;
                RequestMessage { msg_type, content }
            }
        };
        msg.kind()?;
        Ok(msg)
    }

    /// Encodes a gateway message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message type is unknown or serialization fails.
    pub fn encode_response(self, msg: &ResponseMessage) -> Result<Vec<u8>, ProtoError> {
        msg.kind()?;
        match self {
            Self::Protobuf => Ok(msg.encode_to_vec()),
            Self::Json => JsonFrame::new(msg.msg_type, &msg.content).to_bytes(),
        }
    }

    /// Decodes a gateway message.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are malformed or the type is unknown.
    pub fn decode_response(self, bytes: &[u8]) -> Result<ResponseMessage, ProtoError> {
        let msg = match self {
            Self::Protobuf => ResponseMessage::decode(bytes)
                .map_err(|e| ProtoError::Decoding(e.to_string()))?,
            Self::Json => {
                let (msg_type, content) = JsonFrame::from_bytes(bytes)?;
                ResponseMessage { msg_type, content }
            }
        };
        msg.kind()?;
        Ok(msg)
    }
}

/// First frame of a web-mode session: names the container to enter.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn web_announcement(container_id: &str) -> Result<String, ProtoError> {
    serde_json::to_string(&serde_json::json!({ "container_id": container_id }))
        .map_err(|e| ProtoError::Encoding(e.to_string()))
}
