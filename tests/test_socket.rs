mod common;

use std::time::Duration;

use common::ResetStream;
use rawhttp::error::TransportError;
use rawhttp::net::Connection;
use rawhttp::net::socket::{SocketEvent, attach};
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;

const SETTLE: Duration = Duration::from_millis(50);

#[tokio::test]
async fn test_socket_starts_paused() {
    let (mut client, server) = tokio::io::duplex(8);
    let (events, _writer) = attach(server, 4);
    assert!(!events.is_flowing());

    // Nobody reads the pipe, so the client cannot get more than its capacity in.
    let write = timeout(SETTLE, client.write_all(&[7u8; 64])).await;
    assert!(write.is_err());
}

#[tokio::test]
async fn test_one_chunk_per_resume() {
    let (mut client, server) = tokio::io::duplex(1024);
    let (mut events, _writer) = attach(server, 4);
    client.write_all(b"abcdefgh").await.unwrap();

    events.resume();
    let first = events.next_event().await;
    events.pause();
    assert!(matches!(first, Some(SocketEvent::Data(ref d)) if &d[..] == b"abcd"));

    // Paused: the second half stays in the pipe.
    assert!(timeout(SETTLE, events.next_event()).await.is_err());

    events.resume();
    let second = events.next_event().await;
    events.pause();
    assert!(matches!(second, Some(SocketEvent::Data(ref d)) if &d[..] == b"efgh"));
}

#[tokio::test]
async fn test_reads_until_end_then_keeps_reporting_end() {
    let (mut client, server) = tokio::io::duplex(1024);
    let mut conn = Connection::with_read_size(server, 3);
    client.write_all(b"hello").await.unwrap();
    client.shutdown().await.unwrap();

    let mut received = Vec::new();
    while let Some(data) = conn.read().await.unwrap() {
        received.extend_from_slice(&data);
    }

    assert_eq!(received, b"hello");
    assert!(conn.read().await.unwrap().is_none());
    assert!(conn.read().await.unwrap().is_none());
}

#[tokio::test]
async fn test_write_reaches_peer() {
    let (mut client, server) = tokio::io::duplex(1024);
    let mut conn = Connection::new(server);

    conn.write(b"pong").await.unwrap();
    conn.close().await.unwrap();

    let mut out = Vec::new();
    tokio::io::AsyncReadExt::read_to_end(&mut client, &mut out)
        .await
        .unwrap();
    assert_eq!(out, b"pong");
}

#[tokio::test]
async fn test_write_error_is_sticky() {
    let (client, server) = tokio::io::duplex(1024);
    let mut conn = Connection::new(server);
    drop(client);

    let first = conn.write(b"lost").await.unwrap_err();
    let second = conn.write(b"also lost").await.unwrap_err();

    assert!(matches!(first, TransportError::Io(_)));
    assert_eq!(first.to_string(), second.to_string());
}

#[tokio::test]
async fn test_read_error_is_sticky() {
    let mut conn = Connection::new(ResetStream::default());

    let first = conn.read().await.unwrap_err();
    let second = conn.read().await.unwrap_err();

    assert!(matches!(first, TransportError::Io(ref err) if err.kind() == std::io::ErrorKind::ConnectionReset));
    assert_eq!(first.to_string(), second.to_string());
}
