//! # entry-cli
//!
//! Attaches the local terminal to a shell inside a remote container.
//!
//! The `entry` binary takes the gateway address, the docker daemon address
//! and a container ID, then opens a websocket to the gateway's `/enter`
//! endpoint and relays keystrokes, window size changes, and output until
//! the remote shell exits.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐  ws://<ng_ip>:<ng_port>/enter   ┌─────────┐
//! │ entry (local) │◄───────────────────────────────►│ gateway │──► docker exec
//! └───────────────┘  headers: dockerd_ip,           └─────────┘
//!                    container_id, term-type
//! ```
//!
//! [`cli::Cli`] builds a [`request::ConnectionRequest`];
//! [`client::AttachClient`] performs the handshake and hands over a
//! [`session::Session`] that runs the relay loop. [`commands::EnterCommand`]
//! ties these together and turns every failure into a user-facing message.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod request;
pub mod session;
pub mod terminal;

pub use cli::Cli;
pub use client::AttachClient;
pub use commands::{EnterCommand, EnterStatus};
pub use config::ClientConfig;
pub use error::AttachError;
pub use request::{ConnectionRequest, SessionMode};
pub use session::{LocalIo, Session, SessionOutcome};
