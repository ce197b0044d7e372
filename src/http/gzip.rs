//! Streaming gzip encoding of a body.
//!
//! Each chunk pulled from the inner body is fed to the encoder and followed by
//! a sync flush, so slow producers still reach the client chunk by chunk.

use std::io::Write;

use bytes::Bytes;
use flate2::Compression;
use flate2::write::GzEncoder;
use futures_util::future::BoxFuture;

use crate::http::body::{BodyRead, BodyReader};

pub const GZIP: &str = "gzip";

pub struct GzipBody<'a> {
    inner: BodyReader<'a>,
    encoder: Option<GzEncoder<Vec<u8>>>,
}

impl<'a> GzipBody<'a> {
    pub fn new(inner: BodyReader<'a>) -> Self {
        Self {
            inner,
            encoder: Some(GzEncoder::new(Vec::new(), Compression::default())),
        }
    }

    async fn next_chunk(&mut self) -> anyhow::Result<Option<Bytes>> {
        loop {
            if self.encoder.is_none() {
                return Ok(None);
            }

            let Some(data) = self.inner.read().await? else {
                let trailer = match self.encoder.take() {
                    Some(encoder) => encoder.finish()?,
                    None => Vec::new(),
                };
                return Ok((!trailer.is_empty()).then(|| Bytes::from(trailer)));
            };

            let Some(encoder) = self.encoder.as_mut() else {
                return Ok(None);
            };
            encoder.write_all(&data)?;
            encoder.flush()?;

            let out = std::mem::take(encoder.get_mut());
            if !out.is_empty() {
                return Ok(Some(Bytes::from(out)));
            }
        }
    }
}

impl BodyRead for GzipBody<'_> {
    fn length(&self) -> Option<u64> {
        None
    }

    fn read(&mut self) -> BoxFuture<'_, anyhow::Result<Option<Bytes>>> {
        Box::pin(self.next_chunk())
    }

    fn close(&mut self) -> BoxFuture<'_, anyhow::Result<()>> {
        self.encoder = None;
        Box::pin(self.inner.close())
    }
}

/// Whether an `Accept-Encoding` item offers gzip, honouring `q=0`.
pub fn accepts_gzip(item: &str) -> bool {
    let mut parts = item.split(';').map(str::trim);
    let coding = parts.next().unwrap_or_default();
    if !coding.eq_ignore_ascii_case(GZIP) {
        return false;
    }

    let refused = parts
        .filter_map(|param| param.split_once('='))
        .filter(|(name, _)| name.trim().eq_ignore_ascii_case("q"))
        .any(|(_, q)| q.trim().parse::<f32>().is_ok_and(|q| q <= 0.0));
    !refused
}
