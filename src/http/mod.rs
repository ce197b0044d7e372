//! HTTP/1.1 message layer and connection driver.
//!
//! The HTTP layer is organized into several submodules:
//!
//! - **`connection`**: The per-connection driver implementing the request-response state machine
//! - **`parser`**: Parses request heads, `Content-Length` values and chunk-size lines
//! - **`request`**: Request heads and the body framings (fixed length, chunked, empty)
//! - **`response`**: Response heads, status codes and the builder that fixes framing headers
//! - **`writer`**: Serializes responses and streams their bodies to the client
//! - **`body`**: The pull-based body abstraction shared by requests and responses
//! - **`gzip`**: Streaming gzip encoding of response bodies
//! - **`header`**: Header lines with case-insensitive lookup
//! - **`handler`**: The contract between the driver and application code
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌──────────────────┐
//!        │ AwaitingRequest  │ ← Read and parse the next request head
//!        └──────┬───────────┘
//!               │ Request received          (clean EOF → Closed)
//!               ▼
//!        ┌──────────────────┐
//!        │    Handling      │ ← Handler produces a response
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │   Responding     │ ← Head and body go out
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ Keep-Alive → drain request body → AwaitingRequest
//!               └─ HTTP/1.0 or Connection: close → Closed
//! ```
//!
//! # Example
//!
//! ```ignore
//! use rawhttp::http::connection::serve_http;
//! use rawhttp::net::Connection;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!
//!     loop {
//!         let (socket, _addr) = listener.accept().await?;
//!         tokio::spawn(async move {
//!             let conn = Connection::new(socket);
//!             if let Err(e) = serve_http(conn, &hello, Default::default()).await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod body;
pub mod connection;
pub mod gzip;
pub mod handler;
pub mod header;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;

pub use body::{BodyRead, BodyReader};
pub use connection::{HttpConnection, serve_http};
pub use handler::Handler;
pub use request::{Method, Request, RequestHead, Version};
pub use response::{Response, ResponseBuilder, StatusCode};
