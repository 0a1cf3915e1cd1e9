//! Relay loop between the local terminal and the remote shell.
//!
//! One task multiplexes three sources with `tokio::select!`:
//!
//! - websocket frames from the gateway, written to stdout or stderr;
//! - local input, sent as PLAIN messages;
//! - window size changes, sent as WINCH messages.
//!
//! Output is written on character boundaries: a trailing incomplete UTF-8
//! sequence is held back until the rest of it arrives.
//!
//! The session ends when the gateway sends its CLOSE notice, or, after local
//! input hit EOF, when the close handshake completes.

use std::io;

use entry_proto::utf8::MAX_INCOMPLETE_TAIL;
use entry_proto::{
    RequestMessage, ResponseMessage, ResponseType, WindowSize, WireFormat, valid_utf8_prefix_len,
};
use futures::{SinkExt, Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace, warn};

use crate::config::ClientConfig;
use crate::error::AttachError;
use crate::request::SessionMode;

/// How a session ended without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The gateway sent a CLOSE notice; the text was shown to the user.
    Farewell(String),
    /// Local input ended and the connection was closed from this side.
    LocalHangup,
    /// The user interrupted a read-only session.
    Interrupted,
}

/// Local writer that only emits whole characters.
struct Output<W> {
    writer: W,
    carry: Vec<u8>,
}

impl<W: AsyncWrite + Unpin> Output<W> {
    const fn new(writer: W) -> Self {
        Self {
            writer,
            carry: Vec::new(),
        }
    }

    /// Writes `chunk`, holding back an incomplete character at its end.
    /// Tails longer than any incomplete character are written as-is.
    async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.carry.extend_from_slice(chunk);
        let complete = valid_utf8_prefix_len(&self.carry);
        let cut = if self.carry.len() - complete <= MAX_INCOMPLETE_TAIL {
            complete
        } else {
            self.carry.len()
        };
        if cut > 0 {
            self.writer.write_all(&self.carry[..cut]).await?;
            self.writer.flush().await?;
            self.carry = self.carry.split_off(cut);
        }
        Ok(())
    }

    /// Writes whatever is held back.
    async fn flush_carry(&mut self) -> io::Result<()> {
        if !self.carry.is_empty() {
            self.writer.write_all(&self.carry).await?;
            self.carry.clear();
        }
        self.writer.flush().await
    }
}

/// Local endpoints of the relay.
#[derive(Debug)]
pub struct LocalIo<I, O, E> {
    /// Bytes for the remote shell.
    pub input: I,
    /// Destination for remote stdout and the farewell text.
    pub stdout: O,
    /// Destination for remote stderr.
    pub stderr: E,
}

impl<I, O, E> LocalIo<I, O, E> {
    /// Bundles the three local endpoints.
    pub const fn new(input: I, stdout: O, stderr: E) -> Self {
        Self {
            input,
            stdout,
            stderr,
        }
    }
}

/// What to do after a frame from the gateway.
enum Flow {
    Continue,
    Done(SessionOutcome),
}

/// An established connection ready to relay.
pub struct Session<S> {
    ws: WebSocketStream<S>,
    format: WireFormat,
    mode: SessionMode,
    read_buffer_size: usize,
    send_initial_size: bool,
}

impl<S> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("format", &self.format)
            .field("mode", &self.mode)
            .field("read_buffer_size", &self.read_buffer_size)
            .field("send_initial_size", &self.send_initial_size)
            .finish_non_exhaustive()
    }
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an upgraded websocket.
    pub fn new(ws: WebSocketStream<S>, mode: SessionMode, config: &ClientConfig) -> Self {
        Self {
            ws,
            format: config.wire_format,
            mode,
            read_buffer_size: config.read_buffer_size.max(1),
            send_initial_size: config.send_initial_size,
        }
    }

    /// Relays until the session ends.
    ///
    /// `initial_size` is announced before anything else so the remote shell
    /// starts with the right geometry, unless the configuration turned that
    /// off. Read-only sessions never touch
    /// `io.input`, `resizes`, or `initial_size`.
    ///
    /// # Errors
    ///
    /// Returns [`AttachError::RemoteClosed`] if the gateway drops the
    /// connection without a CLOSE notice, and transport or local IO errors
    /// as they happen.
    pub async fn run<I, O, E, R>(
        self,
        io: LocalIo<I, O, E>,
        resizes: R,
        initial_size: Option<WindowSize>,
    ) -> Result<SessionOutcome, AttachError>
    where
        I: AsyncRead + Unpin,
        O: AsyncWrite + Unpin,
        E: AsyncWrite + Unpin,
        R: Stream<Item = WindowSize> + Unpin,
    {
        let LocalIo {
            mut input,
            stdout,
            stderr,
        } = io;
        let mut stdout = Output::new(stdout);
        let mut stderr = Output::new(stderr);

        let result = self
            .relay(&mut input, &mut stdout, &mut stderr, resizes, initial_size)
            .await;

        for flushed in [stdout.flush_carry().await, stderr.flush_carry().await] {
            if let Err(e) = flushed {
                trace!(error = %e, "Flushing held back output failed");
            }
        }
        result
    }

    async fn relay<I, O, E, R>(
        self,
        input: &mut I,
        stdout: &mut Output<O>,
        stderr: &mut Output<E>,
        mut resizes: R,
        initial_size: Option<WindowSize>,
    ) -> Result<SessionOutcome, AttachError>
    where
        I: AsyncRead + Unpin,
        O: AsyncWrite + Unpin,
        E: AsyncWrite + Unpin,
        R: Stream<Item = WindowSize> + Unpin,
    {
        let Self {
            mut ws,
            format,
            mode,
            read_buffer_size,
            send_initial_size,
        } = self;

        let mut input_open = mode.forwards_input();
        let mut resizes_open = mode.forwards_input();
        let mut hung_up = false;
        let mut buf = vec![0u8; read_buffer_size];

        if input_open && send_initial_size {
            if let Some(size) = initial_size {
                debug!(width = size.width, height = size.height, "Sending initial window size");
                send(&mut ws, format, &RequestMessage::winch(size)).await?;
            }
        }

        loop {
            tokio::select! {
                frame = ws.next() => {
                    let message = match frame {
                        Some(Ok(message)) => message,
                        Some(Err(e)) => {
                            if hung_up {
                                debug!(error = %e, "Connection ended after local hangup");
                                return Ok(SessionOutcome::LocalHangup);
                            }
                            return Err(AttachError::from_transport(e));
                        }
                        None => return ended(hung_up),
                    };

                    match handle_frame(message, format, stdout, stderr).await? {
                        Flow::Continue => {}
                        Flow::Done(outcome) => {
                            if let Err(e) = ws.close(None).await {
                                trace!(error = %e, "Close after farewell failed");
                            }
                            return Ok(outcome);
                        }
                    }
                }

                read = input.read(&mut buf), if input_open => {
                    match read? {
                        0 => {
                            debug!("Local input closed, closing connection");
                            input_open = false;
                            resizes_open = false;
                            hung_up = true;
                            if let Err(e) = ws.close(None).await {
                                debug!(error = %e, "Close after hangup failed");
                                return Ok(SessionOutcome::LocalHangup);
                            }
                        }
                        n => {
                            trace!(bytes = n, "Forwarding input");
                            send(&mut ws, format, &RequestMessage::plain(&buf[..n])).await?;
                        }
                    }
                }

                size = resizes.next(), if resizes_open => {
                    match size {
                        Some(size) => {
                            debug!(width = size.width, height = size.height, "Window resized");
                            send(&mut ws, format, &RequestMessage::winch(size)).await?;
                        }
                        None => resizes_open = false,
                    }
                }
            }
        }
    }
}

/// Result for a connection that ended without a CLOSE notice.
fn ended(hung_up: bool) -> Result<SessionOutcome, AttachError> {
    if hung_up {
        Ok(SessionOutcome::LocalHangup)
    } else {
        Err(AttachError::RemoteClosed)
    }
}

async fn send<S>(
    ws: &mut WebSocketStream<S>,
    format: WireFormat,
    msg: &RequestMessage,
) -> Result<(), AttachError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let bytes = format.encode_request(msg)?;
    let frame = if format.is_text() {
        // JSON with base64 content is always ASCII.
        Message::Text(String::from_utf8_lossy(&bytes).into_owned())
    } else {
        Message::Binary(bytes)
    };
    ws.send(frame).await.map_err(AttachError::from_transport)
}

async fn handle_frame<O, E>(
    message: Message,
    format: WireFormat,
    stdout: &mut Output<O>,
    stderr: &mut Output<E>,
) -> Result<Flow, AttachError>
where
    O: AsyncWrite + Unpin,
    E: AsyncWrite + Unpin,
{
    let response = match &message {
        Message::Binary(bytes) => decode(format, bytes),
        Message::Text(text) => decode(format, text.as_bytes()),
        Message::Close(frame) => {
            debug!(frame = ?frame, "Gateway sent close frame");
            return Ok(Flow::Continue);
        }
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => return Ok(Flow::Continue),
    };

    let Some((kind, response)) = response else {
        return Ok(Flow::Continue);
    };

    match kind {
        ResponseType::Stdout => stdout.write_chunk(&response.content).await?,
        ResponseType::Stderr => stderr.write_chunk(&response.content).await?,
        ResponseType::Ping => trace!("Gateway keep-alive"),
        ResponseType::Close => {
            let text = String::from_utf8_lossy(&response.content).into_owned();
            stdout.flush_carry().await?;
            let writer = &mut stdout.writer;
            writer.write_all(&response.content).await?;
            writer.write_all(b"\r\n").await?;
            writer.flush().await?;
            debug!("Gateway ended the session");
            return Ok(Flow::Done(SessionOutcome::Farewell(text)));
        }
    }

    Ok(Flow::Continue)
}

/// Frames that fail to decode are skipped, like the gateway does.
fn decode(format: WireFormat, bytes: &[u8]) -> Option<(ResponseType, ResponseMessage)> {
    match format.decode_response(bytes) {
        Ok(response) => match response.kind() {
            Ok(kind) => Some((kind, response)),
            Err(e) => {
                warn!(error = %e, "Dropping gateway message");
                None
            }
        },
        Err(e) => {
            warn!(error = %e, "Dropping undecodable gateway message");
            None
        }
    }
}
