use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, trace, warn};

use crate::config::HttpConfig;
use crate::error::{HttpError, TransportError, find_cause};
use crate::http::handler::Handler;
use crate::http::request::Incoming;
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;
use crate::net::{Connection, ConnectionWriter};

/// Drives the request/response exchanges of one client connection.
pub struct HttpConnection<S> {
    incoming: Incoming,
    writer: ConnectionWriter<S>,
    state: ConnectionState,
    served: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    /// Waiting for (or parsing) the next request head.
    AwaitingRequest,
    /// The handler is producing a response.
    Handling,
    /// The response is going out; its head may already be on the wire.
    Responding,
    Closed,
}

/// Serves `conn` until the client goes away or a failure ends the connection.
pub async fn serve_http<S, H>(conn: Connection<S>, handler: &H, config: HttpConfig) -> anyhow::Result<()>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
    H: Handler + ?Sized,
{
    HttpConnection::new(conn, config).run(handler).await
}

impl<S> HttpConnection<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    pub fn new(conn: Connection<S>, config: HttpConfig) -> Self {
        let (reader, writer) = conn.into_split();
        Self {
            incoming: Incoming::new(reader, config),
            writer,
            state: ConnectionState::AwaitingRequest,
            served: 0,
        }
    }

    /// Runs the exchange loop, then closes the connection.
    ///
    /// Protocol errors are answered with their status and end the connection
    /// normally. Transport errors are returned as they are. Anything else is
    /// answered with a 500 when possible and then returned.
    pub async fn run<H: Handler + ?Sized>(mut self, handler: &H) -> anyhow::Result<()> {
        let outcome = match self.serve(handler).await {
            Ok(()) => Ok(()),
            Err(err) => self.recover(err).await,
        };

        self.state = ConnectionState::Closed;
        if let Err(err) = self.writer.close().await {
            debug!(error = %err, "failed to shut down connection");
        }
        self.incoming.destroy();

        debug!(requests = self.served, "connection closed");
        outcome
    }

    async fn serve<H: Handler + ?Sized>(&mut self, handler: &H) -> anyhow::Result<()> {
        loop {
            self.state = ConnectionState::AwaitingRequest;
            let Some(request) = self.incoming.read_request().await? else {
                return Ok(());
            };

            let keep_alive = request.head.keep_alive();
            let method = request.head.method.clone();
            let uri = request.head.uri.clone();

            self.state = ConnectionState::Handling;
            let response = handler.handle(request).await?;
            debug!(
                method = method.as_str(),
                uri = %uri,
                status = response.head.status.as_u16(),
                "request handled"
            );

            self.state = ConnectionState::Responding;
            let mut out = ResponseWriter::new(&mut self.writer);
            out.send(response).await?;
            trace!(bytes = out.written(), "response body sent");
            self.served += 1;

            if !keep_alive {
                return Ok(());
            }

            // The next head starts right after this body.
            self.state = ConnectionState::AwaitingRequest;
            let skipped = self.incoming.drain_body().await?;
            if skipped > 0 {
                debug!(bytes = skipped, "drained unread request body");
            }
        }
    }

    async fn recover(&mut self, err: anyhow::Error) -> anyhow::Result<()> {
        if find_cause::<TransportError>(&err).is_some() {
            return Err(err);
        }

        // A second response would corrupt the one already under way.
        let response_started = self.state == ConnectionState::Responding;

        if let Some(http_err) = find_cause::<HttpError>(&err).cloned() {
            if response_started {
                warn!(error = %err, "protocol error while responding");
                return Ok(());
            }

            warn!(
                status = http_err.status.as_u16(),
                reason = %http_err.message,
                "protocol error"
            );
            ResponseWriter::new(&mut self.writer)
                .send(Response::error(&http_err))
                .await?;
            return Ok(());
        }

        if !response_started {
            let internal = Response::error(&HttpError::internal());
            if let Err(write_err) = ResponseWriter::new(&mut self.writer).send(internal).await {
                debug!(error = %write_err, "could not deliver 500 response");
            }
        }
        Err(err)
    }
}
