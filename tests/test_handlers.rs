mod common;

use std::path::PathBuf;

use common::{dechunk, exchange, split_response};
use rawhttp::config::{HandlersConfig, HttpConfig};
use rawhttp::handlers::DemoHandler;

fn handler(files_root: PathBuf) -> DemoHandler {
    let cfg = HandlersConfig {
        files_root,
        sheep_interval_ms: 1,
    };
    DemoHandler::new(&cfg, false)
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("rawhttp-{name}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[tokio::test]
async fn test_default_route_says_hello() {
    let (out, _) = exchange(handler(".".into()), HttpConfig::default(), b"GET /anything HTTP/1.1\r\n\r\n").await;

    assert_eq!(out, "HTTP/1.1 200 OK\r\nContent-Length: 12\r\n\r\nHello World!");
}

#[tokio::test]
async fn test_echo_route() {
    let input = b"POST /echo HTTP/1.1\r\nContent-Length: 4\r\n\r\nping";
    let (out, result) = exchange(handler(".".into()), HttpConfig::default(), input).await;

    assert!(result.is_ok());
    assert_eq!(out, "HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\nping");
}

#[tokio::test]
async fn test_sheep_route_counts_in_chunks() {
    let (out, result) = exchange(handler(".".into()), HttpConfig::default(), b"GET /sheep HTTP/1.1\r\n\r\n").await;
    assert!(result.is_ok());

    let (head, body) = split_response(&out);
    assert_eq!(head, "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked");

    let expected: String = (0..100).map(|i| format!("{i}\n")).collect();
    assert_eq!(String::from_utf8(dechunk(body.as_bytes())).unwrap(), expected);
}

#[tokio::test]
async fn test_files_route_serves_file() {
    let dir = scratch_dir("files");
    std::fs::write(dir.join("hello.txt"), "from disk\n").unwrap();

    let (out, result) = exchange(handler(dir.clone()), HttpConfig::default(), b"GET /files/hello.txt HTTP/1.1\r\n\r\n").await;

    assert!(result.is_ok());
    assert_eq!(out, "HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nfrom disk\n");
    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_files_route_missing_file() {
    let dir = scratch_dir("missing");

    let (out, result) = exchange(handler(dir.clone()), HttpConfig::default(), b"GET /files/nope.txt HTTP/1.1\r\n\r\n").await;

    assert!(result.is_ok());
    assert_eq!(out, "HTTP/1.1 404 Not Found\r\nContent-Length: 13\r\n\r\n404 Not Found");
    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_files_route_refuses_to_leave_root() {
    let dir = scratch_dir("escape");
    let inner = dir.join("public");
    std::fs::create_dir_all(&inner).unwrap();
    std::fs::write(dir.join("secret.txt"), "hidden").unwrap();

    let (out, _) = exchange(handler(inner), HttpConfig::default(), b"GET /files/../secret.txt HTTP/1.1\r\n\r\n").await;

    assert!(out.starts_with("HTTP/1.1 404 Not Found\r\n"), "{out}");
    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_directory_is_not_served() {
    let dir = scratch_dir("dirs");
    std::fs::create_dir_all(dir.join("sub")).unwrap();

    let (out, _) = exchange(handler(dir.clone()), HttpConfig::default(), b"GET /files/sub HTTP/1.1\r\n\r\n").await;

    assert!(out.starts_with("HTTP/1.1 404 Not Found\r\n"), "{out}");
    std::fs::remove_dir_all(&dir).unwrap();
}
