//! # entry-proto
//!
//! Wire messages spoken between the `entry` attach client and the gateway
//! that brokers a shell inside a container.
//!
//! Every websocket frame carries exactly one message. The client sends
//! [`RequestMessage`]s (keystrokes and window size changes), the gateway
//! answers with [`ResponseMessage`]s (output, keep-alive pings, and a final
//! close notice). Two encodings exist, selected with [`WireFormat`]:
//! protobuf for terminal clients and JSON for browser clients.
//!
//! ```text
//! ┌─────────────┐  RequestMessage (PLAIN/WINCH)   ┌─────────┐   exec   ┌───────────┐
//! │ entry (cli) │────────────────────────────────►│ gateway │─────────►│ container │
//! │             │◄────────────────────────────────│         │◄─────────│           │
//! └─────────────┘  ResponseMessage (STDOUT/...)   └─────────┘          └───────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod error;
pub mod messages;
pub mod utf8;

pub use codec::{WireFormat, web_announcement};
pub use error::ProtoError;
pub use messages::{RequestMessage, RequestType, ResponseMessage, ResponseType, WindowSize};
pub use utf8::valid_utf8_prefix_len;
