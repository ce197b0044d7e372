//! Shared helpers: in-memory connections and a few canned handlers.

#![allow(dead_code)]

use futures_util::future::BoxFuture;
use rawhttp::config::HttpConfig;
use rawhttp::http::body::BodyReader;
use rawhttp::http::connection::serve_http;
use rawhttp::http::handler::Handler;
use rawhttp::http::request::Request;
use rawhttp::http::response::{Response, ResponseBuilder, StatusCode};
use rawhttp::net::Connection;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};

/// Sends `input` to a fresh connection served by `handler`, closes the
/// client's sending side and collects everything the server writes back.
pub async fn exchange<H>(handler: H, config: HttpConfig, input: &[u8]) -> (String, anyhow::Result<()>)
where
    H: Handler + 'static,
{
    let (mut client, server) = tokio::io::duplex(64 * 1024);
    let task = tokio::spawn(async move {
        let conn = Connection::with_read_size(server, config.read_buffer_size);
        serve_http(conn, &handler, config).await
    });

    client.write_all(input).await.unwrap();
    client.shutdown().await.unwrap();

    let mut out = Vec::new();
    client.read_to_end(&mut out).await.unwrap();
    let result = task.await.unwrap();

    (String::from_utf8_lossy(&out).into_owned(), result)
}

/// Decodes a chunked body (no trailers) into its payload.
pub fn dechunk(mut body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        let line_end = body.windows(2).position(|w| w == b"\r\n").unwrap();
        let size = usize::from_str_radix(std::str::from_utf8(&body[..line_end]).unwrap(), 16).unwrap();
        body = &body[line_end + 2..];
        if size == 0 {
            assert_eq!(body, b"\r\n");
            return out;
        }
        out.extend_from_slice(&body[..size]);
        assert_eq!(&body[size..size + 2], b"\r\n");
        body = &body[size + 2..];
    }
}

/// Splits a raw response into its head (without the blank line) and body.
pub fn split_response(raw: &str) -> (&str, &str) {
    raw.split_once("\r\n\r\n").unwrap()
}

/// Always answers `Hello World!` and never touches the request body.
pub struct Hello;

impl Handler for Hello {
    fn handle<'a>(&'a self, request: Request<'a>) -> BoxFuture<'a, anyhow::Result<Response<'a>>> {
        Box::pin(async move { Ok(Response::ok(&request.head, BodyReader::from_bytes("Hello World!"))) })
    }
}

/// Streams the request body straight back.
pub struct Echo;

impl Handler for Echo {
    fn handle<'a>(&'a self, request: Request<'a>) -> BoxFuture<'a, anyhow::Result<Response<'a>>> {
        Box::pin(async move {
            let Request { head, body } = request;
            Ok(ResponseBuilder::new(StatusCode::Ok).body(body).build(&head))
        })
    }
}

/// Fails every request with an error the driver does not recognize.
pub struct Broken;

impl Handler for Broken {
    fn handle<'a>(&'a self, _request: Request<'a>) -> BoxFuture<'a, anyhow::Result<Response<'a>>> {
        Box::pin(async move { Err(anyhow::anyhow!("handler exploded")) })
    }
}

/// A stream whose reads always fail with a connection reset. Writes are
/// accepted and counted in `written`.
#[derive(Default)]
pub struct ResetStream {
    pub written: Arc<AtomicUsize>,
}

impl AsyncRead for ResetStream {
    fn poll_read(self: Pin<&mut Self>, _cx: &mut Context<'_>, _buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")))
    }
}

impl AsyncWrite for ResetStream {
    fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        self.written.fetch_add(buf.len(), Ordering::SeqCst);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
