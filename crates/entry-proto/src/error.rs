//! Error types for the entry-proto crate.

use thiserror::Error;

/// Errors that can occur while encoding or decoding gateway messages.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// Failed to encode a message.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Failed to decode a message.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// Message type discriminator is not one this protocol knows.
    #[error("invalid message type: {0}")]
    InvalidMessageType(i32),

    /// A WINCH payload was not `"<width> <height>"`.
    #[error("invalid window size: {0:?}")]
    InvalidWindowSize(String),
}
