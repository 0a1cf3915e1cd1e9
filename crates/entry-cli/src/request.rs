//! Connection request: where to connect and what to tell the gateway.

use std::ffi::OsString;

use entry_proto::WireFormat;

use crate::error::AttachError;

/// Terminal type sent when `TERM` is unset.
pub const DEFAULT_TERM_TYPE: &str = "xterm";

/// Header carrying the docker daemon address.
pub const DOCKERD_IP_HEADER: &str = "dockerd_ip";

/// Header carrying the container identifier.
pub const CONTAINER_ID_HEADER: &str = "container_id";

/// Header carrying the local terminal type.
pub const TERM_TYPE_HEADER: &str = "term-type";

/// What kind of session to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionMode {
    /// Interactive shell: stdin and window size are forwarded.
    #[default]
    Interactive,
    /// Follow the container's output only.
    ReadOnly,
}

impl SessionMode {
    /// Gateway endpoint path for this mode.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Interactive => "/enter",
            Self::ReadOnly => "/attach",
        }
    }

    /// Whether local input is sent to the container.
    #[must_use]
    pub const fn forwards_input(self) -> bool {
        matches!(self, Self::Interactive)
    }
}

/// Everything needed to open one session. Built once per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRequest {
    /// Gateway host, used verbatim in the URL.
    pub gateway_host: String,
    /// Gateway port, used verbatim in the URL.
    pub gateway_port: String,
    /// Address of the docker daemon running the container.
    pub dockerd_ip: String,
    /// Target container.
    pub container_id: String,
    /// Local terminal type.
    pub term_type: String,
    /// Interactive or read-only.
    pub mode: SessionMode,
}

impl ConnectionRequest {
    /// Creates an interactive request.
    #[must_use]
    pub fn new(
        gateway_host: impl Into<String>,
        gateway_port: impl Into<String>,
        dockerd_ip: impl Into<String>,
        container_id: impl Into<String>,
        term_type: impl Into<String>,
    ) -> Self {
        Self {
            gateway_host: gateway_host.into(),
            gateway_port: gateway_port.into(),
            dockerd_ip: dockerd_ip.into(),
            container_id: container_id.into(),
            term_type: term_type.into(),
            mode: SessionMode::Interactive,
        }
    }

    /// Sets the session mode.
    #[must_use]
    pub fn with_mode(mut self, mode: SessionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Websocket endpoint, e.g. `ws://10.0.0.1:8080/enter`.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!(
            "ws://{}:{}{}",
            self.gateway_host,
            self.gateway_port,
            self.mode.path()
        )
    }

    /// Endpoint including the query string the wire format needs.
    #[must_use]
    pub fn endpoint_url(&self, format: WireFormat) -> String {
        match format.query() {
            Some(query) => format!("{}?{query}", self.endpoint()),
            None => self.endpoint(),
        }
    }

    /// Custom headers as name/value pairs, in wire order.
    #[must_use]
    pub fn headers(&self) -> [(&'static str, &str); 3] {
        [
            (DOCKERD_IP_HEADER, self.dockerd_ip.as_str()),
            (CONTAINER_ID_HEADER, self.container_id.as_str()),
            (TERM_TYPE_HEADER, self.term_type.as_str()),
        ]
    }

    /// Headers rendered as `name: value` lines.
    #[must_use]
    pub fn header_lines(&self) -> Vec<String> {
        self.headers()
            .iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect()
    }
}

/// Picks the terminal type from a `TERM` value, falling back to
/// [`DEFAULT_TERM_TYPE`] when it is unset.
#[must_use]
pub fn resolve_term_type(term: Option<String>) -> String {
    term.unwrap_or_else(|| DEFAULT_TERM_TYPE.to_string())
}

/// Like [`resolve_term_type`] for a raw environment value.
///
/// # Errors
///
/// A `TERM` that is set but not valid UTF-8 cannot be sent as a header and
/// is reported as [`AttachError::InvalidEndpoint`].
pub fn resolve_os_term_type(term: Option<OsString>) -> Result<String, AttachError> {
    let term = term
        .map(|value| {
            value.into_string().map_err(|raw| {
                AttachError::InvalidEndpoint(format!(
                    "TERM is not valid UTF-8: {}",
                    raw.to_string_lossy()
                ))
            })
        })
        .transpose()?;
    Ok(resolve_term_type(term))
}

/// Reads `TERM` from the process environment.
///
/// # Errors
///
/// See [`resolve_os_term_type`].
pub fn term_type_from_env() -> Result<String, AttachError> {
    resolve_os_term_type(std::env::var_os("TERM"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn sample(term: Option<String>) -> ConnectionRequest {
        ConnectionRequest::new(
            "10.0.0.1",
            "8080",
            "172.17.0.2",
            "abc123",
            resolve_term_type(term),
        )
    }

    #[test]
    fn endpoint_and_headers_for_sample_args() {
        let request = sample(None);
        assert_eq!(request.endpoint(), "ws://10.0.0.1:8080/enter");
        assert_eq!(
            request.header_lines(),
            vec![
                "dockerd_ip: 172.17.0.2",
                "container_id: abc123",
                "term-type: xterm",
            ]
        );
    }

    #[test]
    fn term_from_environment_is_forwarded() {
        let request = sample(Some("screen".into()));
        assert!(request.header_lines().contains(&"term-type: screen".to_string()));
    }

    #[test]
    fn unset_term_defaults_to_xterm() {
        assert_eq!(resolve_term_type(None), "xterm");
    }

    #[test]
    fn os_term_is_resolved_like_a_string() {
        assert_eq!(resolve_os_term_type(None).unwrap(), "xterm");
        assert_eq!(resolve_os_term_type(Some("screen".into())).unwrap(), "screen");
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_term_is_an_error_not_the_default() {
        use std::os::unix::ffi::OsStringExt;

        let raw = OsString::from_vec(vec![b'x', 0xFF, b'm']);
        let err = resolve_os_term_type(Some(raw)).unwrap_err();
        assert!(matches!(err, AttachError::InvalidEndpoint(ref msg) if msg.contains("TERM")), "{err:?}");
    }

    #[test]
    fn empty_term_is_kept_verbatim() {
        assert_eq!(resolve_term_type(Some(String::new())), "");
    }

    #[test_case("10.0.0.1", "8080", "ws://10.0.0.1:8080/enter" ; "ipv4")]
    #[test_case("gateway.local", "80", "ws://gateway.local:80/enter" ; "hostname")]
    #[test_case("h", "not-a-port", "ws://h:not-a-port/enter" ; "port is not validated")]
    fn endpoint_uses_arguments_literally(host: &str, port: &str, expected: &str) {
        let request = ConnectionRequest::new(host, port, "d", "c", "xterm");
        assert_eq!(request.endpoint(), expected);
    }

    #[test]
    fn read_only_mode_targets_attach() {
        let request = sample(None).with_mode(SessionMode::ReadOnly);
        assert_eq!(request.endpoint(), "ws://10.0.0.1:8080/attach");
        assert!(!request.mode.forwards_input());
    }

    #[test]
    fn web_format_appends_method_query() {
        let request = sample(None);
        assert_eq!(
            request.endpoint_url(WireFormat::Json),
            "ws://10.0.0.1:8080/enter?method=web"
        );
        assert_eq!(
            request.endpoint_url(WireFormat::Protobuf),
            "ws://10.0.0.1:8080/enter"
        );
    }
}
