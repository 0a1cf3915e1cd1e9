//! Client configuration.

use std::time::Duration;

use entry_proto::WireFormat;

/// Default time allowed for the TCP connect and websocket upgrade.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default size of a single stdin read, matching the gateway's read buffer.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024;

/// Tunables for the attach client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Time allowed for the TCP connect and websocket upgrade.
    pub connect_timeout: Duration,
    /// Frame encoding.
    pub wire_format: WireFormat,
    /// Maximum bytes forwarded per PLAIN message.
    pub read_buffer_size: usize,
    /// Whether the window size is sent as soon as the session starts.
    pub send_initial_size: bool,
}

impl ClientConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            wire_format: WireFormat::Protobuf,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            send_initial_size: true,
        }
    }

    /// Set the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the wire format.
    #[must_use]
    pub const fn with_wire_format(mut self, format: WireFormat) -> Self {
        self.wire_format = format;
        self
    }

    /// Set the stdin read size. Zero is bumped to one byte.
    #[must_use]
    pub const fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = if size == 0 { 1 } else { size };
        self
    }

    /// Enable or disable the window size announcement at session start.
    #[must_use]
    pub const fn with_initial_resize(mut self, enabled: bool) -> Self {
        self.send_initial_size = enabled;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}
