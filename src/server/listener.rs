use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{Instrument, info};

use crate::config::{Config, HttpConfig};
use crate::http::connection::serve_http;
use crate::http::handler::Handler;
use crate::net::Connection;

pub async fn run<H>(cfg: &Config, handler: Arc<H>) -> anyhow::Result<()>
where
    H: Handler + 'static,
{
    let listener = TcpListener::bind(&cfg.server.listen_addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    serve(listener, handler, cfg.http).await
}

/// Accepts connections forever, one task per connection.
pub async fn serve<H>(listener: TcpListener, handler: Arc<H>, config: HttpConfig) -> anyhow::Result<()>
where
    H: Handler + 'static,
{
    loop {
        let (socket, peer) = listener.accept().await?;
        info!("Accepted connection from {}", peer);

        let handler = Arc::clone(&handler);
        let span = tracing::info_span!("connection", %peer);
        tokio::spawn(
            async move {
                let conn = Connection::with_read_size(socket, config.read_buffer_size);
                if let Err(e) = serve_http(conn, handler.as_ref(), config).await {
                    tracing::error!("Connection error from {}: {:#}", peer, e);
                }
            }
            .instrument(span),
        );
    }
}
