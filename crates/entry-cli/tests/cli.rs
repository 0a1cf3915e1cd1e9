//! End-to-end tests of the `entry` binary.

mod helpers;

use std::io::ErrorKind;
use std::net::TcpListener;

use assert_cmd::Command;
use entry_proto::{ResponseMessage, WireFormat};
use helpers::*;
use predicates::prelude::*;

fn entry() -> Command {
    let mut cmd = Command::cargo_bin("entry").unwrap();
    cmd.env_remove("RUST_LOG").env_remove("ENTRY_CONNECT_TIMEOUT");
    cmd
}

fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[test]
fn three_arguments_is_usage_error_without_connecting() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let port = listener.local_addr().unwrap().port().to_string();

    entry()
        .args(["127.0.0.1", port.as_str(), "172.17.0.2"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage"));

    let err = listener.accept().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WouldBlock, "binary must not connect");
}

#[test]
fn five_arguments_is_usage_error_without_connecting() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let port = listener.local_addr().unwrap().port().to_string();

    entry()
        .args(["127.0.0.1", port.as_str(), "172.17.0.2", "abc123", "extra"])
        .assert()
        .code(2);

    let err = listener.accept().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WouldBlock, "binary must not connect");
}

#[test]
fn unreachable_gateway_prints_admin_message_and_exits_zero() {
    let port = closed_port().to_string();

    entry()
        .args(["127.0.0.1", port.as_str(), "172.17.0.2", "abc123"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("Ask admin for help."));
}

#[test]
fn fail_on_error_turns_session_error_into_exit_status() {
    let port = closed_port().to_string();

    entry()
        .args(["--fail-on-error", "127.0.0.1", port.as_str(), "172.17.0.2", "abc123"])
        .write_stdin("")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Ask admin for help."));
}

#[tokio::test(flavor = "multi_thread")]
async fn term_is_forwarded_and_farewell_printed() {
    let gateway = MockGateway::start(
        WireFormat::Protobuf,
        vec![
            Step::Send(ResponseMessage::stdout(b"hello from container\r\n".to_vec())),
            Step::Send(ResponseMessage::close(b"You quit the container safely.".to_vec())),
        ],
    )
    .await;
    let host = gateway.addr.ip().to_string();
    let port = gateway.addr.port().to_string();

    let output = tokio::task::spawn_blocking(move || {
        entry()
            .args([host.as_str(), port.as_str(), "172.17.0.2", "abc123"])
            .env("TERM", "screen")
            .write_stdin("")
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("hello from container"), "{stdout}");
    assert!(stdout.contains("You quit the container safely."), "{stdout}");

    let recorded = gateway.finish().await;
    assert_eq!(recorded.path, "/enter");
    assert_eq!(recorded.headers["term-type"], "screen");
    assert_eq!(recorded.headers["dockerd_ip"], "172.17.0.2");
    assert_eq!(recorded.headers["container_id"], "abc123");
}

#[tokio::test(flavor = "multi_thread")]
async fn unset_term_is_sent_as_xterm() {
    let gateway = MockGateway::start(
        WireFormat::Protobuf,
        vec![Step::Send(ResponseMessage::close(b"bye".to_vec()))],
    )
    .await;
    let host = gateway.addr.ip().to_string();
    let port = gateway.addr.port().to_string();

    let output = tokio::task::spawn_blocking(move || {
        entry()
            .args([host.as_str(), port.as_str(), "172.17.0.2", "abc123"])
            .env_remove("TERM")
            .write_stdin("")
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success());
    let recorded = gateway.finish().await;
    assert_eq!(recorded.headers["term-type"], "xterm");
}

#[tokio::test(flavor = "multi_thread")]
async fn dropped_session_prints_generic_message() {
    let gateway = MockGateway::start(WireFormat::Protobuf, vec![Step::Hangup]).await;
    let host = gateway.addr.ip().to_string();
    let port = gateway.addr.port().to_string();

    // Keep stdin open so the only way out is the gateway hanging up.
    let output = tokio::task::spawn_blocking(move || {
        let mut child = std::process::Command::new(assert_cmd::cargo::cargo_bin("entry"))
            .args([host.as_str(), port.as_str(), "172.17.0.2", "abc123"])
            .env_remove("RUST_LOG")
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .unwrap();
        let stdin = child.stdin.take();
        let output = child.wait_with_output().unwrap();
        drop(stdin);
        output
    })
    .await
    .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Server stops the connection. Ask admin for help."),
        "{stdout}"
    );
    gateway.finish().await;
}
