//! Enter command implementation.
//!
//! Connects, puts the terminal in raw mode, relays until the session ends,
//! and converts any failure into a message for the user. Failures never
//! escape [`EnterCommand::execute`].

use std::io::Write;
use std::process::ExitCode;

use entry_proto::WindowSize;
use futures::stream;
use tracing::{error, info};

use crate::client::AttachClient;
use crate::config::ClientConfig;
use crate::error::AttachError;
use crate::request::{ConnectionRequest, SessionMode};
use crate::session::{LocalIo, SessionOutcome};
use crate::terminal::{self, RawModeGuard};

/// How an enter command finished.
#[derive(Debug)]
pub enum EnterStatus {
    /// The session ran and ended normally.
    Finished(SessionOutcome),
    /// The session failed; the user has been told.
    Failed(AttachError),
}

impl EnterStatus {
    /// Whether the session failed.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Process exit status. Failures exit with 0 unless `fail_on_error`
    /// is set.
    #[must_use]
    pub const fn exit_status(&self, fail_on_error: bool) -> u8 {
        if fail_on_error && self.is_failure() { 1 } else { 0 }
    }

    /// Logs `err`, tells the user about it on `writer`, and wraps it.
    pub fn report<W: Write>(err: AttachError, writer: &mut W) -> Self {
        error!(kind = err.kind(), error = %err, "Cannot enter container");
        if let Err(write_err) = writeln!(writer, "{}", err.user_message()) {
            error!(error = %write_err, "Failed to report session error");
        }
        Self::Failed(err)
    }

    /// [`Self::exit_status`] as an [`ExitCode`].
    #[must_use]
    pub fn exit_code(&self, fail_on_error: bool) -> ExitCode {
        ExitCode::from(self.exit_status(fail_on_error))
    }
}

/// Enter command executor.
pub struct EnterCommand<'a> {
    request: &'a ConnectionRequest,
    config: &'a ClientConfig,
}

impl<'a> EnterCommand<'a> {
    /// Create a new enter command.
    #[must_use]
    pub const fn new(request: &'a ConnectionRequest, config: &'a ClientConfig) -> Self {
        Self { request, config }
    }

    /// Execute the enter command.
    ///
    /// Errors are logged and replaced by a user message written to `writer`.
    pub async fn execute<W: Write>(&self, writer: &mut W) -> EnterStatus {
        match self.attach().await {
            Ok(outcome) => {
                info!(container = %self.request.container_id, outcome = ?outcome, "Session finished");
                EnterStatus::Finished(outcome)
            }
            Err(e) => {
                error!(container = %self.request.container_id, "Session failed");
                EnterStatus::report(e, writer)
            }
        }
    }

    async fn attach(&self) -> Result<SessionOutcome, AttachError> {
        let session = AttachClient::connect(self.request, self.config)
            .await?
            .into_session();

        match self.request.mode {
            SessionMode::Interactive => {
                // Restored when this scope ends, before any error is printed.
                let _raw = RawModeGuard::enable()?;
                let io = LocalIo::new(tokio::io::stdin(), tokio::io::stdout(), tokio::io::stderr());
                let resizes = terminal::resize_events()?;
                session.run(io, resizes, terminal::window_size()).await
            }
            SessionMode::ReadOnly => {
                let io = LocalIo::new(tokio::io::empty(), tokio::io::stdout(), tokio::io::stderr());
                tokio::select! {
                    result = session.run(io, stream::pending::<WindowSize>(), None) => result,
                    _ = tokio::signal::ctrl_c() => Ok(SessionOutcome::Interrupted),
                }
            }
        }
    }
}
