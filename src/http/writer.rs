use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::http::parser::CRLF;
use crate::http::response::{Response, ResponseHead};
use crate::net::ConnectionWriter;

/// Terminating zero-size chunk with an empty trailer section.
pub const LAST_CHUNK: &[u8] = b"0\r\n\r\n";

/// Encodes the status line and headers, including the blank line.
pub fn serialize_head(head: &ResponseHead) -> Bytes {
    let mut buf = BytesMut::new();

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        head.version.as_str(),
        head.status.as_u16(),
        head.reason
    );
    buf.put_slice(status_line.as_bytes());

    // Headers
    for header in &head.headers {
        buf.put_slice(header.name.as_bytes());
        buf.put_slice(b": ");
        buf.put_slice(header.value.as_bytes());
        buf.put_slice(CRLF);
    }

    // Header/body separator
    buf.put_slice(CRLF);

    buf.freeze()
}

/// Frames `data` as one chunk: hex size, CRLF, bytes, CRLF.
pub fn encode_chunk(data: &[u8]) -> Bytes {
    let size = format!("{:x}\r\n", data.len());
    let mut buf = BytesMut::with_capacity(size.len() + data.len() + CRLF.len());
    buf.put_slice(size.as_bytes());
    buf.put_slice(data);
    buf.put_slice(CRLF);
    buf.freeze()
}

/// Streams a [`Response`] onto a connection.
pub struct ResponseWriter<'w, S> {
    conn: &'w mut ConnectionWriter<S>,
    written: u64,
}

impl<'w, S> ResponseWriter<'w, S>
where
    S: AsyncRead + AsyncWrite,
{
    pub fn new(conn: &'w mut ConnectionWriter<S>) -> Self {
        Self { conn, written: 0 }
    }

    /// Body bytes written so far, before any chunk framing.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Writes the head and then the body in the framing the response chose.
    ///
    /// The body is closed afterwards whatever the outcome, and only once.
    pub async fn send(&mut self, mut response: Response<'_>) -> anyhow::Result<()> {
        let result = self.send_parts(&mut response).await;
        let closed = response.body.close().await;
        result?;
        closed
    }

    async fn send_parts(&mut self, response: &mut Response<'_>) -> anyhow::Result<()> {
        self.conn.write(&serialize_head(&response.head)).await?;

        if response.body_ignored {
            return Ok(());
        }
        if response.chunked {
            self.write_chunked_body(response).await
        } else {
            self.write_fixed_body(response).await
        }
    }

    async fn write_chunked_body(&mut self, response: &mut Response<'_>) -> anyhow::Result<()> {
        while let Some(data) = response.body.read().await? {
            self.conn.write(&encode_chunk(&data)).await?;
            self.written += data.len() as u64;
        }
        self.conn.write(LAST_CHUNK).await?;
        Ok(())
    }

    async fn write_fixed_body(&mut self, response: &mut Response<'_>) -> anyhow::Result<()> {
        let declared = response.body.length().unwrap_or(0);

        while let Some(data) = response.body.read().await? {
            self.written += data.len() as u64;
            if self.written > declared {
                anyhow::bail!("body exceeded its declared length of {declared} bytes");
            }
            self.conn.write(&data).await?;
        }

        if self.written != declared {
            anyhow::bail!(
                "body ended after {} of {declared} declared bytes",
                self.written
            );
        }
        Ok(())
    }
}
