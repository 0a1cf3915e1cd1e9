//! Command-line argument parsing with clap.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};
use entry_proto::WireFormat;

use crate::config::ClientConfig;
use crate::logging::LogConfig;
use crate::request::{ConnectionRequest, SessionMode};

/// Enter a container's shell through the entry gateway.
#[derive(Parser, Debug, Clone)]
#[command(name = "entry")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Gateway IP address.
    pub ng_ip: String,

    /// Gateway port.
    pub ng_port: String,

    /// Address of the docker daemon running the container.
    pub dockerd_ip: String,

    /// Container to enter.
    pub container_id: String,

    /// Follow the container's output without opening a shell.
    #[arg(long)]
    pub attach: bool,

    /// Frame encoding spoken with the gateway.
    #[arg(long, value_enum, default_value_t = Method::Protobuf)]
    pub method: Method,

    /// Seconds allowed for connecting to the gateway.
    #[arg(long, env = "ENTRY_CONNECT_TIMEOUT", default_value_t = 10, value_name = "SECS")]
    pub connect_timeout: u64,

    /// Exit with a non-zero status when the session fails.
    #[arg(long)]
    pub fail_on_error: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Write logs to this file instead of stderr.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Wire format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum Method {
    /// Protobuf frames, as terminal clients use.
    #[default]
    Protobuf,
    /// JSON frames, as browser clients use.
    Web,
}

impl From<Method> for WireFormat {
    fn from(method: Method) -> Self {
        match method {
            Method::Protobuf => Self::Protobuf,
            Method::Web => Self::Json,
        }
    }
}

impl Cli {
    /// Builds the connection request for the given terminal type.
    #[must_use]
    pub fn connection_request(&self, term_type: impl Into<String>) -> ConnectionRequest {
        let mode = if self.attach {
            SessionMode::ReadOnly
        } else {
            SessionMode::Interactive
        };
        ConnectionRequest::new(
            &self.ng_ip,
            &self.ng_port,
            &self.dockerd_ip,
            &self.container_id,
            term_type,
        )
        .with_mode(mode)
    }

    /// Builds the client configuration.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new()
            .with_connect_timeout(Duration::from_secs(self.connect_timeout))
            .with_wire_format(self.method.into())
    }

    /// Builds the logging configuration.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            verbosity: self.verbose,
            file: self.log_file.clone(),
        }
    }
}
