//! Local terminal handling: raw mode, window size, resize notifications.

use std::io::{self, IsTerminal};

use crossterm::terminal;
use entry_proto::WindowSize;
use futures::stream::{self, BoxStream, StreamExt};
use tracing::{debug, warn};

use crate::error::AttachError;

/// Keeps the local terminal in raw mode until dropped.
///
/// Nothing happens when stdin is not a terminal (pipes, tests), so input is
/// forwarded as-is in that case.
#[derive(Debug)]
pub struct RawModeGuard {
    enabled: bool,
}

impl RawModeGuard {
    /// Switches stdin to raw mode if it is a terminal.
    pub fn enable() -> Result<Self, AttachError> {
        if !io::stdin().is_terminal() {
            debug!("stdin is not a terminal, leaving mode untouched");
            return Ok(Self { enabled: false });
        }
        terminal::enable_raw_mode().map_err(AttachError::Terminal)?;
        Ok(Self { enabled: true })
    }

    /// Whether raw mode was actually switched on.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.enabled {
            if let Err(e) = terminal::disable_raw_mode() {
                warn!(error = %e, "Failed to restore terminal mode");
            }
        }
    }
}

/// Current size of the local terminal, if stdout is one.
#[must_use]
pub fn window_size() -> Option<WindowSize> {
    if !io::stdout().is_terminal() {
        return None;
    }
    terminal::size().ok().map(WindowSize::from)
}

/// Stream of window sizes, one per `SIGWINCH`.
#[cfg(unix)]
pub fn resize_events() -> Result<BoxStream<'static, WindowSize>, AttachError> {
    use tokio::signal::unix::{SignalKind, signal};

    let winch = signal(SignalKind::window_change()).map_err(AttachError::Terminal)?;
    let sizes = stream::unfold(winch, |mut winch| async move {
        winch.recv().await?;
        Some((window_size(), winch))
    })
    .filter_map(|size| async move { size });
    Ok(sizes.boxed())
}

/// Stream of window sizes. Resize notifications are not wired up on this
/// platform, so the stream never yields.
#[cfg(not(unix))]
pub fn resize_events() -> Result<BoxStream<'static, WindowSize>, AttachError> {
    Ok(stream::pending().boxed())
}
