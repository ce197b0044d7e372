use bytes::{Bytes, BytesMut};
use futures_util::future::BoxFuture;

use crate::buffer::ByteBuffer;
use crate::config::HttpConfig;
use crate::error::HttpError;
use crate::http::body::{BodyRead, BodyReader};
use crate::http::header::{CONNECTION, CONTENT_LENGTH, Header, Headers, TRANSFER_ENCODING};
use crate::http::parser::{self, CRLF, CRLF2};
use crate::http::response::StatusCode;
use crate::net::ConnectionReader;

/// HTTP request methods.
///
/// Any method token is accepted; methods outside the common set are kept
/// as [`Method::Other`]. Whether a request can be served is decided by its
/// body framing, not by its method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// DELETE - Delete a resource
    DELETE,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// OPTIONS - Describe communication options
    OPTIONS,
    /// PATCH - Partial modification of a resource
    PATCH,
    /// Any other method token (e.g. `TRACE`, `PROPFIND`), case preserved
    Other(String),
}

impl Method {
    /// Parses an HTTP method token. `None` if it is not a valid token.
    ///
    /// # Example
    ///
    /// ```
    /// # use rawhttp::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("TRACE"), Some(Method::Other("TRACE".into())));
    /// assert_eq!(Method::from_str("G{T"), None);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        let method = match s {
            "GET" => Method::GET,
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            "HEAD" => Method::HEAD,
            "OPTIONS" => Method::OPTIONS,
            "PATCH" => Method::PATCH,
            _ if is_token(s) => Method::Other(s.to_string()),
            _ => return None,
        };
        Some(method)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::HEAD => "HEAD",
            Method::OPTIONS => "OPTIONS",
            Method::PATCH => "PATCH",
            Method::Other(name) => name,
        }
    }

    /// Methods whose requests carry no body unless framing headers say so.
    pub fn implies_empty_body(&self) -> bool {
        matches!(self, Method::GET | Method::HEAD)
    }
}

/// RFC 9110 `token`: one or more visible ASCII characters, no delimiters.
fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Http10,
    Http11,
}

impl Version {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "HTTP/1.0" => Some(Version::Http10),
            "HTTP/1.1" => Some(Version::Http11),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Version::Http10 => "HTTP/1.0",
            Version::Http11 => "HTTP/1.1",
        }
    }
}

/// Request line and headers, parsed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    pub method: Method,
    /// The request target as sent (e.g. "/index.html?q=1")
    pub uri: String,
    pub version: Version,
    pub headers: Headers,
}

impl RequestHead {
    /// Retrieves a header value by name, case-insensitively.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    /// Whether the connection may carry another request after this one.
    ///
    /// HTTP/1.0 never does; HTTP/1.1 does unless the client sent
    /// `Connection: close`.
    pub fn keep_alive(&self) -> bool {
        match self.version {
            Version::Http10 => false,
            Version::Http11 => !self.headers.has_token(CONNECTION, "close"),
        }
    }
}

/// Builder for request heads, mostly useful when testing handlers.
pub struct RequestBuilder {
    method: Option<Method>,
    uri: Option<String>,
    version: Version,
    headers: Headers,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            uri: None,
            version: Version::Http11,
            headers: Headers::new(),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    pub fn build(self) -> Result<RequestHead, &'static str> {
        Ok(RequestHead {
            method: self.method.ok_or("method missing")?,
            uri: self.uri.ok_or("uri missing")?,
            version: self.version,
            headers: self.headers,
        })
    }
}

/// A request as handed to a handler: its head and a body that streams from
/// the connection.
#[derive(Debug)]
pub struct Request<'a> {
    pub head: RequestHead,
    pub body: BodyReader<'a>,
}

#[derive(Debug)]
enum Framing {
    Empty,
    Length { total: u64, remaining: u64 },
    Chunked(ChunkState),
}

#[derive(Debug)]
enum ChunkState {
    /// Expecting a chunk-size line.
    Size,
    /// Inside a chunk; `data` holds what has arrived so far.
    Data { remaining: usize, data: BytesMut },
    /// Past the zero-size chunk, skipping trailer lines; `seen` counts the
    /// trailer bytes so far.
    Trailers { seen: usize },
    Done,
}

/// Reading side of one connection: the socket, its buffer and the framing of
/// the body currently being read.
#[derive(Debug)]
pub struct Incoming {
    conn: ConnectionReader,
    buf: ByteBuffer,
    framing: Framing,
    config: HttpConfig,
}

impl Incoming {
    pub fn new(conn: ConnectionReader, config: HttpConfig) -> Self {
        Self {
            conn,
            buf: ByteBuffer::new(),
            framing: Framing::Empty,
            config,
        }
    }

    /// Reads the next request. `Ok(None)` means the peer closed the
    /// connection cleanly between requests.
    pub async fn read_request(&mut self) -> anyhow::Result<Option<Request<'_>>> {
        let Some(head) = self.read_head().await? else {
            return Ok(None);
        };
        Ok(Some(Request {
            head,
            body: self.body(),
        }))
    }

    /// Reads and parses the next header block and sets up the body framing.
    pub async fn read_head(&mut self) -> anyhow::Result<Option<RequestHead>> {
        let limit = self.config.max_header_bytes;
        let mut scanned = 0;
        let end = loop {
            if let Some(pos) = self.buf.index_of(CRLF2, scanned) {
                break pos;
            }
            scanned = self.buf.size().saturating_sub(CRLF2.len() - 1);

            if self.buf.size() > limit {
                return Err(head_too_large().into());
            }

            match self.conn.read().await? {
                Some(data) => self.buf.push(&data),
                None if self.buf.is_empty() => return Ok(None),
                None => return Err(HttpError::unexpected_eof().into()),
            }
        };
        if end > limit {
            return Err(head_too_large().into());
        }

        let block = self.buf.pop(end + CRLF2.len())?;
        let head = parser::parse_request_head(&block[..end]).map_err(HttpError::from)?;
        self.framing = select_framing(&head, &self.config)?;

        tracing::trace!(method = head.method.as_str(), uri = %head.uri, "request head parsed");
        Ok(Some(head))
    }

    /// A reader over the current request's body.
    pub fn body(&mut self) -> BodyReader<'_> {
        BodyReader::new(RequestBody { incoming: self })
    }

    /// Declared length of the current body, `None` when chunked.
    pub fn body_length(&self) -> Option<u64> {
        match &self.framing {
            Framing::Empty => Some(0),
            Framing::Length { total, .. } => Some(*total),
            Framing::Chunked(_) => None,
        }
    }

    /// Next piece of the current body, `None` once it is complete.
    pub async fn read_body(&mut self) -> anyhow::Result<Option<Bytes>> {
        let Self {
            conn,
            buf,
            framing,
            config,
        } = self;

        match framing {
            Framing::Empty => Ok(None),
            Framing::Length { remaining, .. } => {
                if *remaining == 0 {
                    return Ok(None);
                }
                if buf.is_empty() {
                    fill(conn, buf).await?;
                }
                let n = (*remaining).min(buf.size() as u64) as usize;
                *remaining -= n as u64;
                Ok(Some(buf.pop(n)?))
            }
            Framing::Chunked(state) => read_chunk(conn, buf, state, config).await,
        }
    }

    /// Discards whatever is left of the current body.
    pub async fn drain_body(&mut self) -> anyhow::Result<u64> {
        let mut skipped = 0;
        while let Some(chunk) = self.read_body().await? {
            skipped += chunk.len() as u64;
        }
        Ok(skipped)
    }

    /// Stops reading from the socket.
    pub fn destroy(&mut self) {
        self.conn.destroy();
    }
}

struct RequestBody<'a> {
    incoming: &'a mut Incoming,
}

impl BodyRead for RequestBody<'_> {
    fn length(&self) -> Option<u64> {
        self.incoming.body_length()
    }

    fn read(&mut self) -> BoxFuture<'_, anyhow::Result<Option<Bytes>>> {
        Box::pin(self.incoming.read_body())
    }
}

fn select_framing(head: &RequestHead, config: &HttpConfig) -> Result<Framing, HttpError> {
    let mut length = None;
    for value in head.headers.get_all(CONTENT_LENGTH) {
        let parsed = parser::parse_content_length(Some(value))?;
        if length.is_some() && length != parsed {
            return Err(HttpError::bad_request("Conflicting Content-Length"));
        }
        length = parsed;
    }
    let chunked = head.headers.has_token(TRANSFER_ENCODING, "chunked");

    if length.is_some() && chunked && config.reject_ambiguous_framing {
        return Err(HttpError::bad_request(
            "Content-Length with Transfer-Encoding",
        ));
    }

    if let Some(total) = length {
        Ok(Framing::Length {
            total,
            remaining: total,
        })
    } else if chunked {
        Ok(Framing::Chunked(ChunkState::Size))
    } else if head.method.implies_empty_body() {
        Ok(Framing::Empty)
    } else {
        // Reading to the end of the connection (HTTP/1.0 style) is not supported.
        Err(HttpError::not_implemented("Body Framing Not Supported"))
    }
}

fn head_too_large() -> HttpError {
    HttpError::new(
        StatusCode::RequestHeaderFieldsTooLarge,
        "Request Header Fields Too Large",
    )
}

/// Reads one more chunk from the socket into `buf`.
async fn fill(conn: &mut ConnectionReader, buf: &mut ByteBuffer) -> anyhow::Result<()> {
    match conn.read().await? {
        Some(data) => {
            buf.push(&data);
            Ok(())
        }
        None => Err(HttpError::unexpected_eof().into()),
    }
}

/// Pops one CRLF-terminated line, without the CRLF.
async fn read_line(
    conn: &mut ConnectionReader,
    buf: &mut ByteBuffer,
    limit: usize,
) -> anyhow::Result<Bytes> {
    let mut scanned = 0;
    loop {
        if let Some(pos) = buf.index_of(CRLF, scanned) {
            let line = buf.pop(pos)?;
            buf.pop(CRLF.len())?;
            return Ok(line);
        }
        scanned = buf.size().saturating_sub(CRLF.len() - 1);

        if buf.size() > limit {
            return Err(HttpError::bad_request("Line Too Long").into());
        }
        fill(conn, buf).await?;
    }
}

async fn read_chunk(
    conn: &mut ConnectionReader,
    buf: &mut ByteBuffer,
    state: &mut ChunkState,
    config: &HttpConfig,
) -> anyhow::Result<Option<Bytes>> {
    loop {
        match state {
            ChunkState::Size => {
                let line = read_line(conn, buf, config.max_header_bytes).await?;
                let size = parser::parse_chunk_size(&line).map_err(HttpError::from)?;
                if size == 0 {
                    *state = ChunkState::Trailers { seen: 0 };
                } else if size > config.max_chunk_size {
                    return Err(HttpError::new(StatusCode::PayloadTooLarge, "Chunk Too Large").into());
                } else {
                    *state = ChunkState::Data {
                        remaining: size,
                        data: BytesMut::new(),
                    };
                }
            }
            ChunkState::Data { remaining, data } => {
                while *remaining > 0 {
                    if buf.is_empty() {
                        fill(conn, buf).await?;
                    }
                    let n = (*remaining).min(buf.size());
                    data.extend_from_slice(&buf.pop(n)?);
                    *remaining -= n;
                }

                while buf.size() < CRLF.len() {
                    fill(conn, buf).await?;
                }
                if buf.pop(CRLF.len())? != CRLF {
                    return Err(HttpError::bad_request("Malformed Chunk").into());
                }

                let chunk = std::mem::take(data).freeze();
                *state = ChunkState::Size;
                return Ok(Some(chunk));
            }
            ChunkState::Trailers { seen } => {
                // Trailer fields are accepted and dropped, within the header limit.
                let line = read_line(conn, buf, config.max_header_bytes).await?;
                if line.is_empty() {
                    *state = ChunkState::Done;
                    return Ok(None);
                }
                *seen += line.len() + CRLF.len();
                if *seen > config.max_header_bytes {
                    return Err(head_too_large().into());
                }
                if Header::parse(&String::from_utf8_lossy(&line)).is_none() {
                    return Err(HttpError::bad_request("Bad Trailer").into());
                }
            }
            ChunkState::Done => return Ok(None),
        }
    }
}
