//! Sequential read/write façade over an event-driven socket.
//!
//! [`Connection::read`] resumes the socket, waits for exactly one event and
//! pauses the socket again, so the transport never runs ahead of the
//! consumer. Reads take `&mut self`, which rules out a second concurrent read
//! at compile time.

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, WriteHalf};

use crate::error::TransportError;
use crate::net::socket::{self, SocketEvent, SocketEvents};

/// Default number of bytes requested from the socket per read.
pub const DEFAULT_READ_SIZE: usize = 8192;

pub struct Connection<S> {
    reader: ConnectionReader,
    writer: ConnectionWriter<S>,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    pub fn new(stream: S) -> Self {
        Self::with_read_size(stream, DEFAULT_READ_SIZE)
    }

    pub fn with_read_size(stream: S, read_size: usize) -> Self {
        let (events, write_half) = socket::attach(stream, read_size);
        Self {
            reader: ConnectionReader::new(events),
            writer: ConnectionWriter::new(write_half),
        }
    }

    /// Next chunk of bytes, or `None` once the peer has closed.
    pub async fn read(&mut self) -> Result<Option<Bytes>, TransportError> {
        self.reader.read().await
    }

    pub async fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.writer.write(data).await
    }

    pub async fn close(&mut self) -> Result<(), TransportError> {
        self.writer.close().await
    }

    /// Separates the two directions so a request body can be read while the
    /// response is being written.
    pub fn into_split(self) -> (ConnectionReader, ConnectionWriter<S>) {
        (self.reader, self.writer)
    }
}

/// Inbound half of a [`Connection`].
#[derive(Debug)]
pub struct ConnectionReader {
    events: SocketEvents,
    ended: bool,
    error: Option<TransportError>,
}

impl ConnectionReader {
    fn new(events: SocketEvents) -> Self {
        Self {
            events,
            ended: false,
            error: None,
        }
    }

    /// Next chunk of bytes, or `None` once the peer has closed.
    ///
    /// After the peer closes every call returns `None`; after a transport
    /// error every call fails with that error.
    pub async fn read(&mut self) -> Result<Option<Bytes>, TransportError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        if self.ended {
            return Ok(None);
        }

        self.events.resume();
        let event = self.events.next_event().await;
        self.events.pause();

        match event {
            Some(SocketEvent::Data(data)) => Ok(Some(data)),
            Some(SocketEvent::End) => {
                tracing::trace!("peer closed its sending side");
                self.ended = true;
                Ok(None)
            }
            Some(SocketEvent::Error(err)) => Err(self.fail(err.into())),
            None => Err(self.fail(TransportError::SourceClosed)),
        }
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Stops reading from the socket for good.
    pub fn destroy(&mut self) {
        self.events.destroy();
        self.ended = true;
    }

    fn fail(&mut self, err: TransportError) -> TransportError {
        self.error = Some(err.clone());
        err
    }
}

/// Outbound half of a [`Connection`].
pub struct ConnectionWriter<S> {
    inner: WriteHalf<S>,
    error: Option<TransportError>,
}

impl<S> ConnectionWriter<S>
where
    S: AsyncRead + AsyncWrite,
{
    fn new(inner: WriteHalf<S>) -> Self {
        Self { inner, error: None }
    }

    /// Writes all of `data` and waits for it to be flushed.
    pub async fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }

        let result = async {
            self.inner.write_all(data).await?;
            self.inner.flush().await
        }
        .await;

        result.map_err(|err| {
            let err = TransportError::from(err);
            self.error = Some(err.clone());
            err
        })
    }

    /// Shuts down the sending side.
    pub async fn close(&mut self) -> Result<(), TransportError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        self.inner.shutdown().await.map_err(TransportError::from)
    }
}
