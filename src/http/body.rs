//! Pull-based message bodies.
//!
//! A body is read one chunk at a time until it reports end of stream. Its
//! length is either declared up front (sent as `Content-Length`) or unknown
//! (sent chunked). Bodies that hold a resource release it in
//! [`BodyRead::close`], which the response writer calls exactly once.

use std::pin::Pin;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use futures_util::stream::{Stream, StreamExt};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::error::HttpError;
use crate::http::gzip::GzipBody;
use crate::http::response::StatusCode;

const FILE_READ_SIZE: usize = 64 * 1024;

/// A source of body bytes.
pub trait BodyRead: Send {
    /// Declared byte count, `None` when unknown.
    fn length(&self) -> Option<u64>;

    /// The next chunk, or `None` at end of body. Never yields an empty chunk.
    fn read(&mut self) -> BoxFuture<'_, anyhow::Result<Option<Bytes>>>;

    /// Releases whatever the body holds.
    fn close(&mut self) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async { Ok(()) })
    }
}

/// Type-erased body handed between the parser, handlers and the writer.
pub struct BodyReader<'a> {
    inner: Box<dyn BodyRead + 'a>,
}

impl std::fmt::Debug for BodyReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BodyReader")
            .field("length", &self.length())
            .finish_non_exhaustive()
    }
}

impl<'a> BodyReader<'a> {
    pub fn new(inner: impl BodyRead + 'a) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }

    pub fn empty() -> Self {
        Self::from_bytes(Bytes::new())
    }

    /// A body of known length served from memory.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self::new(BytesBody {
            length: data.len() as u64,
            data: Some(data),
        })
    }

    /// A lazily produced body of unknown length. Closing it drops the stream.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = anyhow::Result<Bytes>> + Send + 'a,
    {
        Self::new(StreamBody {
            stream: Some(Box::pin(stream)),
        })
    }

    /// A file of `size` bytes. Closing it closes the file.
    pub fn from_file(file: File, size: u64) -> Self {
        Self::new(FileBody {
            file: Some(file),
            size,
            read: 0,
        })
    }

    pub fn length(&self) -> Option<u64> {
        self.inner.length()
    }

    pub async fn read(&mut self) -> anyhow::Result<Option<Bytes>> {
        loop {
            match self.inner.read().await? {
                Some(chunk) if chunk.is_empty() => continue,
                other => return Ok(other),
            }
        }
    }

    pub async fn close(&mut self) -> anyhow::Result<()> {
        self.inner.close().await
    }

    /// Reads and discards everything left. Returns the number of bytes skipped.
    pub async fn drain(&mut self) -> anyhow::Result<u64> {
        let mut skipped = 0;
        while let Some(chunk) = self.read().await? {
            skipped += chunk.len() as u64;
        }
        Ok(skipped)
    }

    pub async fn read_to_end(&mut self) -> anyhow::Result<Vec<u8>> {
        let mut out = Vec::new();
        while let Some(chunk) = self.read().await? {
            out.extend_from_slice(&chunk);
        }
        Ok(out)
    }

    /// Wraps the body in a streaming gzip encoder. The result has no known
    /// length.
    pub fn with_gzip(self) -> Self {
        BodyReader::new(GzipBody::new(self))
    }
}

struct BytesBody {
    data: Option<Bytes>,
    length: u64,
}

impl BodyRead for BytesBody {
    fn length(&self) -> Option<u64> {
        Some(self.length)
    }

    fn read(&mut self) -> BoxFuture<'_, anyhow::Result<Option<Bytes>>> {
        let next = self.data.take().filter(|d| !d.is_empty());
        Box::pin(async move { Ok(next) })
    }
}

struct StreamBody<'a> {
    stream: Option<Pin<Box<dyn Stream<Item = anyhow::Result<Bytes>> + Send + 'a>>>,
}

impl BodyRead for StreamBody<'_> {
    fn length(&self) -> Option<u64> {
        None
    }

    fn read(&mut self) -> BoxFuture<'_, anyhow::Result<Option<Bytes>>> {
        Box::pin(async move {
            let Some(stream) = self.stream.as_mut() else {
                return Ok(None);
            };
            let next = stream.next().await;
            match next {
                Some(chunk) => chunk.map(Some),
                None => {
                    self.stream = None;
                    Ok(None)
                }
            }
        })
    }

    fn close(&mut self) -> BoxFuture<'_, anyhow::Result<()>> {
        self.stream = None;
        Box::pin(async { Ok(()) })
    }
}

struct FileBody {
    file: Option<File>,
    size: u64,
    read: u64,
}

impl FileBody {
    fn size_changed(&self) -> anyhow::Error {
        tracing::warn!(expected = self.size, read = self.read, "file size changed while serving");
        HttpError::new(StatusCode::InternalServerError, "File Size Changed").into()
    }
}

impl BodyRead for FileBody {
    fn length(&self) -> Option<u64> {
        Some(self.size)
    }

    fn read(&mut self) -> BoxFuture<'_, anyhow::Result<Option<Bytes>>> {
        Box::pin(async move {
            let Some(file) = self.file.as_mut() else {
                return Ok(None);
            };

            let mut chunk = Vec::with_capacity(FILE_READ_SIZE);
            let n = file.read_buf(&mut chunk).await?;
            if n == 0 {
                if self.read == self.size {
                    return Ok(None);
                }
                return Err(self.size_changed());
            }

            self.read += n as u64;
            // The length has already gone out in the head.
            if self.read > self.size {
                return Err(self.size_changed());
            }
            Ok(Some(Bytes::from(chunk)))
        })
    }

    fn close(&mut self) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            if let Some(file) = self.file.take() {
                drop(file);
                tracing::trace!("file body released");
            }
            Ok(())
        })
    }
}
