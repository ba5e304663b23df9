//! Agent integration tests
//!
//! Runs the full descriptor → connect → handshake sequence against a fake
//! gpg-agent listening on a real loopback port.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use gb_core::{AgentClient, BridgeError, RelayMode, StreamBridge};
use gb_protocol::{ProtocolError, GREETING};

const TOKEN: [u8; 16] = *b"\x00\x01\x02\x03nonce\nvalu\xfe\xff";

/// Inbound messages seen by the fake agent, in order
#[derive(Debug, PartialEq)]
enum Inbound {
    Token(Vec<u8>),
    Line(String),
}

/// Write a descriptor file for `port` into a fresh temp dir
fn write_descriptor(port: u16) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("S.gpg-agent");

    let mut bytes = format!("{}\n", port).into_bytes();
    bytes.extend_from_slice(&TOKEN);
    std::fs::write(&path, bytes).expect("Failed to write descriptor");

    (dir, path)
}

/// Start a fake agent that greets with `greeting`, answers every command
/// line with the next entry of `replies`, and records what it receives
async fn spawn_agent(
    greeting: &'static [u8],
    replies: Vec<&'static [u8]>,
) -> (u16, JoinHandle<Vec<Inbound>>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake agent");
    let port = listener.local_addr().expect("No local addr").port();

    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("Failed to accept");
        let mut stream = BufReader::new(stream);
        let mut inbound = Vec::new();

        let mut token = [0u8; 16];
        stream.read_exact(&mut token).await.expect("Failed to read token");
        inbound.push(Inbound::Token(token.to_vec()));
        stream.write_all(greeting).await.expect("Failed to greet");

        let mut replies = replies.into_iter();
        loop {
            let mut line = String::new();
            match stream.read_line(&mut line).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            inbound.push(Inbound::Line(line));
            if let Some(reply) = replies.next() {
                stream.write_all(reply).await.expect("Failed to reply");
            }
        }
        inbound
    });

    (port, handle)
}

#[tokio::test]
async fn test_version_end_to_end() {
    let (port, agent) = spawn_agent(GREETING, vec![b"D 2.4.0\n"]).await;
    let (_dir, path) = write_descriptor(port);

    let version = AgentClient::new().version(&path).await.unwrap();
    let inbound = agent.await.unwrap();

    assert_eq!(version, "2.4.0");
    assert_eq!(
        inbound,
        vec![
            Inbound::Token(TOKEN.to_vec()),
            Inbound::Line("GETINFO version\n".to_string()),
            Inbound::Line("BYE\n".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_wrong_greeting_fails_authentication() {
    let (port, agent) = spawn_agent(b"ERR failure\n", vec![]).await;
    let (_dir, path) = write_descriptor(port);

    let err = AgentClient::new().version(&path).await.unwrap_err();
    let inbound = agent.await.unwrap();

    match err {
        BridgeError::Authentication { received } => assert_eq!(received, "ERR failure\n"),
        other => panic!("Expected Authentication error, got {:?}", other),
    }
    // Nothing but the token went out
    assert_eq!(inbound, vec![Inbound::Token(TOKEN.to_vec())]);
}

#[tokio::test]
async fn test_malformed_version_reply() {
    let (port, agent) = spawn_agent(GREETING, vec![b"garbage\n"]).await;
    let (_dir, path) = write_descriptor(port);

    let err = AgentClient::new().version(&path).await.unwrap_err();
    let inbound = agent.await.unwrap();

    assert!(matches!(
        err,
        BridgeError::Protocol(ProtocolError::MissingSeparator { .. })
    ));
    // BYE still goes out before the reply is parsed
    assert_eq!(inbound.last(), Some(&Inbound::Line("BYE\n".to_string())));
}

#[tokio::test]
async fn test_query_end_to_end() {
    let (port, agent) = spawn_agent(GREETING, vec![b"D 3141\n"]).await;
    let (_dir, path) = write_descriptor(port);

    let response = AgentClient::new()
        .query(&path, &gb_protocol::Command::GetInfo("pid".into()))
        .await
        .unwrap();
    agent.await.unwrap();

    assert_eq!(response.tag, "D");
    assert_eq!(response.payload, "3141");
}

#[tokio::test]
async fn test_relay_end_to_end() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (_dir, path) = write_descriptor(port);

    let agent = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut token = [0u8; 16];
        stream.read_exact(&mut token).await.unwrap();
        stream.write_all(GREETING).await.unwrap();

        let mut request = vec![0u8; 20];
        stream.read_exact(&mut request).await.unwrap();
        stream.write_all(b"D 2.4.0\nOK\n").await.unwrap();
        request
    });

    let mut input: &[u8] = b"GETINFO version\nBYE\n";
    let mut output = Vec::new();
    let stats = AgentClient::new()
        .relay(&path, &StreamBridge::new(RelayMode::Sequential), &mut input, &mut output)
        .await
        .unwrap();

    assert_eq!(agent.await.unwrap(), b"GETINFO version\nBYE\n");
    assert_eq!(output, b"D 2.4.0\nOK\n");
    assert_eq!(stats.sent, 20);
    assert_eq!(stats.received, 11);
}

#[tokio::test]
async fn test_connection_refused() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let (_dir, path) = write_descriptor(port);

    let err = AgentClient::new().version(&path).await.unwrap_err();
    assert!(matches!(err, BridgeError::Connection { .. }));
}

#[tokio::test]
async fn test_bad_descriptor_port() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("S.gpg-agent");
    std::fs::write(&path, b"abc\n0123456789abcdef").unwrap();

    let err = AgentClient::new().version(&path).await.unwrap_err();
    assert!(matches!(err, BridgeError::Format(_)));
}

#[tokio::test]
async fn test_truncated_descriptor_token() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("S.gpg-agent");
    std::fs::write(&path, b"12345\n0123").unwrap();

    let err = AgentClient::new().version(&path).await.unwrap_err();
    assert!(matches!(err, BridgeError::Io(_)));
}

#[tokio::test]
async fn test_missing_descriptor_file() {
    let err = AgentClient::new()
        .version(Path::new("/nonexistent/gpg-bridge/S.gpg-agent"))
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Io(_)));
}
