//! Error taxonomy shared by the transport and HTTP layers.
//!
//! - [`HttpError`]: a client-facing protocol failure carrying a status code.
//!   The connection driver turns it into a response and closes normally.
//! - [`TransportError`]: the underlying stream failed. No response can be
//!   guaranteed; the failure is surfaced to whoever spawned the connection.
//! - Anything else reaching the driver is treated as an internal error.

use std::io;
use std::sync::Arc;

use crate::http::response::StatusCode;

/// A protocol-level failure that maps onto an HTTP error response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{status}: {message}")]
pub struct HttpError {
    pub status: StatusCode,
    pub message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BadRequest, message)
    }

    /// The peer closed the stream in the middle of a message.
    pub fn unexpected_eof() -> Self {
        Self::bad_request("Unexpected EOF")
    }

    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NotImplemented, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::InternalServerError, "Internal Server Error")
    }
}

/// Failure of the underlying byte stream.
///
/// Cloneable so a terminal error can be replayed to every later call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("transport i/o error: {0}")]
    Io(#[source] Arc<io::Error>),

    /// The socket's event pump went away without reporting end or error.
    #[error("socket event source closed unexpectedly")]
    SourceClosed,
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        TransportError::Io(Arc::new(err))
    }
}

/// Returned by [`ByteBuffer::pop`](crate::buffer::ByteBuffer::pop) when asked
/// for more bytes than it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("buffer underflow: requested {requested} bytes, {available} available")]
pub struct BufferUnderflow {
    pub requested: usize,
    pub available: usize,
}

/// Finds the first error of type `E` in an `anyhow` error chain.
pub fn find_cause<E>(err: &anyhow::Error) -> Option<&E>
where
    E: std::error::Error + 'static,
{
    err.chain().find_map(|cause| cause.downcast_ref::<E>())
}
