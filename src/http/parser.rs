use crate::error::HttpError;
use crate::http::header::{Header, Headers};
use crate::http::request::{Method, RequestHead, Version};
use crate::http::response::StatusCode;

pub const CRLF: &[u8] = b"\r\n";
pub const CRLF2: &[u8] = b"\r\n\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("malformed request line")]
    InvalidRequest,
    #[error("malformed method token")]
    InvalidMethod,
    #[error("unsupported HTTP version")]
    InvalidVersion,
    #[error("malformed header line")]
    InvalidHeader,
    #[error("invalid Content-Length")]
    InvalidContentLength,
    #[error("invalid chunk size")]
    InvalidChunkSize,
}

impl From<ParseError> for HttpError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::InvalidVersion => HttpError::new(
                StatusCode::HttpVersionNotSupported,
                "HTTP Version Not Supported",
            ),
            ParseError::InvalidRequest => HttpError::bad_request("Bad Request"),
            ParseError::InvalidMethod => HttpError::bad_request("Bad Method"),
            ParseError::InvalidHeader => HttpError::bad_request("Bad Header"),
            ParseError::InvalidContentLength => HttpError::bad_request("Bad Content-Length"),
            ParseError::InvalidChunkSize => HttpError::bad_request("Bad Chunk Size"),
        }
    }
}

/// Parses a header block: the request line and header lines, without the
/// terminating empty line.
pub fn parse_request_head(block: &[u8]) -> Result<RequestHead, ParseError> {
    let text = std::str::from_utf8(block).map_err(|_| ParseError::InvalidRequest)?;

    let mut lines = text.split("\r\n");

    // Request line
    let request_line = lines.next().ok_or(ParseError::InvalidRequest)?;
    let mut parts = request_line.split(' ').map(str::trim);

    let method = parts.next().ok_or(ParseError::InvalidRequest)?;
    let uri = parts.next().ok_or(ParseError::InvalidRequest)?;
    let version = parts.next().ok_or(ParseError::InvalidRequest)?;
    if parts.next().is_some() || method.is_empty() || uri.is_empty() {
        return Err(ParseError::InvalidRequest);
    }

    let method = Method::from_str(method).ok_or(ParseError::InvalidMethod)?;
    let version = Version::parse(version).ok_or(ParseError::InvalidVersion)?;

    // Headers
    let headers = lines
        .filter(|line| !line.is_empty())
        .map(|line| Header::parse(line).ok_or(ParseError::InvalidHeader))
        .collect::<Result<Headers, _>>()?;

    Ok(RequestHead {
        method,
        uri: uri.to_string(),
        version,
        headers,
    })
}

/// `Content-Length` as a byte count, `None` when absent.
pub fn parse_content_length(value: Option<&str>) -> Result<Option<u64>, ParseError> {
    let Some(value) = value else {
        return Ok(None);
    };

    let value = value.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidContentLength);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| ParseError::InvalidContentLength)
}

/// Size from a chunk-size line; chunk extensions are ignored.
pub fn parse_chunk_size(line: &[u8]) -> Result<usize, ParseError> {
    let line = std::str::from_utf8(line).map_err(|_| ParseError::InvalidChunkSize)?;
    let size = line.split(';').next().unwrap_or_default().trim();
    if size.is_empty() {
        return Err(ParseError::InvalidChunkSize);
    }
    usize::from_str_radix(size, 16).map_err(|_| ParseError::InvalidChunkSize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let head = parse_request_head(b"GET / HTTP/1.1\r\nHost: example.com").unwrap();

        assert_eq!(head.uri, "/");
        assert_eq!(head.headers.get("host"), Some("example.com"));
    }

    #[test]
    fn chunk_size_ignores_extensions() {
        assert_eq!(parse_chunk_size(b"1a;name=value"), Ok(26));
        assert_eq!(parse_chunk_size(b"0"), Ok(0));
        assert_eq!(parse_chunk_size(b"zz"), Err(ParseError::InvalidChunkSize));
    }
}
