//! Sample request handlers served by the binary.
//!
//! - `/echo` streams the request body back
//! - `/sheep` counts slowly, one line per interval, with chunked framing
//! - `/files/<path>` serves a file below the configured root
//! - anything else says `Hello World!`

use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use futures_util::stream;

use crate::config::{Config, HandlersConfig};
use crate::http::body::BodyReader;
use crate::http::handler::Handler;
use crate::http::request::Request;
use crate::http::response::{Response, ResponseBuilder, StatusCode};

const SHEEP_COUNT: u32 = 100;

#[derive(Debug, Clone)]
pub struct DemoHandler {
    files_root: PathBuf,
    sheep_interval: Duration,
    compression: bool,
}

impl DemoHandler {
    pub fn new(cfg: &HandlersConfig, compression: bool) -> Self {
        Self {
            files_root: cfg.files_root.clone(),
            sheep_interval: Duration::from_millis(cfg.sheep_interval_ms),
            compression,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(&cfg.handlers, cfg.http.compression)
    }

    async fn route<'a>(&'a self, request: Request<'a>) -> anyhow::Result<Response<'a>> {
        let Request { head, body } = request;

        let builder = if head.uri == "/echo" {
            ResponseBuilder::new(StatusCode::Ok).body(body)
        } else if head.uri == "/sheep" {
            ResponseBuilder::new(StatusCode::Ok).body(self.sheep_counter())
        } else if let Some(path) = head.uri.strip_prefix("/files/") {
            match self.open_file(path).await? {
                Some(file) => ResponseBuilder::new(StatusCode::Ok).body(file),
                None => ResponseBuilder::not_found(),
            }
        } else {
            ResponseBuilder::new(StatusCode::Ok).body(BodyReader::from_bytes(&b"Hello World!"[..]))
        };

        Ok(builder.compression(self.compression).build(&head))
    }

    fn sheep_counter(&self) -> BodyReader<'static> {
        let interval = self.sheep_interval;
        let counter = stream::unfold(0, move |i| async move {
            if i >= SHEEP_COUNT {
                return None;
            }
            tokio::time::sleep(interval).await;
            Some((Ok::<_, anyhow::Error>(Bytes::from(format!("{i}\n"))), i + 1))
        });
        BodyReader::from_stream(counter)
    }

    /// Opens a regular file below the root; `None` when there is none to serve.
    async fn open_file(&self, path: &str) -> anyhow::Result<Option<BodyReader<'static>>> {
        let Some(relative) = safe_relative_path(path) else {
            return Ok(None);
        };

        let file = match tokio::fs::File::open(self.files_root.join(relative)).await {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let meta = file.metadata().await?;
        if !meta.is_file() {
            return Ok(None);
        }
        Ok(Some(BodyReader::from_file(file, meta.len())))
    }
}

impl Handler for DemoHandler {
    fn handle<'a>(&'a self, request: Request<'a>) -> BoxFuture<'a, anyhow::Result<Response<'a>>> {
        Box::pin(self.route(request))
    }
}

/// `path` as a relative path that cannot leave the served directory.
fn safe_relative_path(path: &str) -> Option<&Path> {
    let path = Path::new(path);
    let normal = path
        .components()
        .all(|component| matches!(component, Component::Normal(_)));
    (normal && !path.as_os_str().is_empty()).then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_escaping_paths() {
        assert!(safe_relative_path("index.html").is_some());
        assert!(safe_relative_path("docs/a.txt").is_some());
        assert!(safe_relative_path("../secret").is_none());
        assert!(safe_relative_path("docs/../../secret").is_none());
        assert!(safe_relative_path("/etc/passwd").is_none());
        assert!(safe_relative_path("").is_none());
    }
}
