use std::fmt;

use crate::error::HttpError;
use crate::http::body::BodyReader;
use crate::http::gzip::{self, GZIP};
use crate::http::header::{
    ACCEPT_ENCODING, CONNECTION, CONTENT_ENCODING, CONTENT_LENGTH, Header, Headers,
    TRANSFER_ENCODING,
};
use crate::http::request::{Method, RequestHead, Version};

/// HTTP status codes supported by the server.
///
/// - `Ok` (200): Request successful
/// - `Created` (201): Resource created successfully
/// - `NoContent` (204): Successful request with no content
/// - `BadRequest` (400): Malformed request or framing
/// - `NotFound` (404): Resource not found
/// - `MethodNotAllowed` (405): HTTP method not supported by the handler
/// - `PayloadTooLarge` (413): A body chunk exceeds the configured limit
/// - `RequestHeaderFieldsTooLarge` (431): The header block exceeds the limit
/// - `InternalServerError` (500): Server error
/// - `NotImplemented` (501): Unsupported method or body framing
/// - `HttpVersionNotSupported` (505): Not an HTTP/1.x request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok,
    Created,
    NoContent,
    BadRequest,
    NotFound,
    MethodNotAllowed,
    PayloadTooLarge,
    RequestHeaderFieldsTooLarge,
    InternalServerError,
    NotImplemented,
    HttpVersionNotSupported,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use rawhttp::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotImplemented.as_u16(), 501);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::Created => 201,
            StatusCode::NoContent => 204,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::PayloadTooLarge => 413,
            StatusCode::RequestHeaderFieldsTooLarge => 431,
            StatusCode::InternalServerError => 500,
            StatusCode::NotImplemented => 501,
            StatusCode::HttpVersionNotSupported => 505,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::NoContent => "No Content",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::PayloadTooLarge => "Payload Too Large",
            StatusCode::RequestHeaderFieldsTooLarge => "Request Header Fields Too Large",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
            StatusCode::HttpVersionNotSupported => "HTTP Version Not Supported",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

/// Status line and headers of a response. Complete once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub version: Version,
    pub status: StatusCode,
    pub reason: String,
    pub headers: Headers,
}

/// A response ready to be written to a connection.
///
/// The framing headers (`Content-Length` or `Transfer-Encoding: chunked`,
/// plus `Content-Encoding: gzip` when compressed) are fixed at construction
/// and match how [`ResponseWriter`](crate::http::writer::ResponseWriter)
/// frames the body.
#[derive(Debug)]
pub struct Response<'a> {
    pub head: ResponseHead,
    pub(crate) body: BodyReader<'a>,
    pub(crate) chunked: bool,
    pub(crate) compressed: bool,
    pub(crate) body_ignored: bool,
}

impl<'a> Response<'a> {
    /// 200 OK with `body`, negotiated against `request`.
    pub fn ok(request: &RequestHead, body: BodyReader<'a>) -> Self {
        ResponseBuilder::new(StatusCode::Ok).body(body).build(request)
    }

    pub fn is_chunked(&self) -> bool {
        self.chunked
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Whether the body is left off the wire (responses to `HEAD`).
    pub fn is_body_ignored(&self) -> bool {
        self.body_ignored
    }

    pub fn into_body(self) -> BodyReader<'a> {
        self.body
    }
}

impl Response<'static> {
    /// Bodiless response describing a protocol failure. The error message is
    /// used as the reason phrase.
    pub fn error(err: &HttpError) -> Self {
        let mut headers = Headers::new();
        headers.insert(CONNECTION, "close");
        headers.insert(CONTENT_LENGTH, "0");

        Response {
            head: ResponseHead {
                version: Version::Http11,
                status: err.status,
                reason: err.message.clone(),
                headers,
            },
            body: BodyReader::empty(),
            chunked: false,
            compressed: false,
            body_ignored: false,
        }
    }
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("Content-Type", "application/json")
///     .body(BodyReader::from_bytes("{}"))
///     .build(&request.head);
/// ```
pub struct ResponseBuilder<'a> {
    status: StatusCode,
    reason: Option<String>,
    headers: Headers,
    body: BodyReader<'a>,
    compression: bool,
}

impl<'a> ResponseBuilder<'a> {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            reason: None,
            headers: Headers::new(),
            body: BodyReader::empty(),
            compression: true,
        }
    }

    /// 404 Not Found with a short text body.
    pub fn not_found() -> Self {
        Self::new(StatusCode::NotFound).body(BodyReader::from_bytes(&b"404 Not Found"[..]))
    }

    /// Appends a header. Framing headers are replaced at build time.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Overrides the reason phrase.
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn body(mut self, body: BodyReader<'a>) -> Self {
        self.body = body;
        self
    }

    /// Enables or disables gzip negotiation (on by default).
    pub fn compression(mut self, enabled: bool) -> Self {
        self.compression = enabled;
        self
    }

    /// Builds the final response for `request`.
    ///
    /// Compresses the body when the request accepts gzip, then appends either
    /// `Content-Length` (known length) or `Transfer-Encoding: chunked`.
    /// Responses to `HEAD` keep their headers but never send the body.
    pub fn build(mut self, request: &RequestHead) -> Response<'a> {
        for name in [CONTENT_LENGTH, TRANSFER_ENCODING, CONTENT_ENCODING] {
            self.headers.remove(name);
        }

        let compressed = self.compression
            && request
                .headers
                .get_list(ACCEPT_ENCODING)
                .iter()
                .copied()
                .any(gzip::accepts_gzip);

        let mut body = self.body;
        if compressed {
            body = body.with_gzip();
            self.headers.push(Header::new(CONTENT_ENCODING, GZIP));
        }

        let chunked = match body.length() {
            Some(length) => {
                self.headers.push(Header::new(CONTENT_LENGTH, length.to_string()));
                false
            }
            None => {
                self.headers.push(Header::new(TRANSFER_ENCODING, "chunked"));
                true
            }
        };

        Response {
            head: ResponseHead {
                version: request.version,
                reason: self
                    .reason
                    .unwrap_or_else(|| self.status.reason_phrase().to_string()),
                status: self.status,
                headers: self.headers,
            },
            body,
            chunked,
            compressed,
            body_ignored: request.method == Method::HEAD,
        }
    }
}
