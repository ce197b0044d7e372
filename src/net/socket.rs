//! Event-driven view of a byte stream with pause/resume flow control.
//!
//! A pump task owns the read half of the stream and reports what happens on
//! it as [`SocketEvent`]s. It only touches the stream while the flow state is
//! "flowing", and after each delivered chunk it waits for the consumer to
//! toggle the flow state before reading again. Sockets start paused.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, WriteHalf};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Notification from the transport.
#[derive(Debug)]
pub enum SocketEvent {
    /// New bytes arrived.
    Data(Bytes),
    /// The peer closed its sending side.
    End,
    /// The transport failed. No further events follow.
    Error(std::io::Error),
}

/// Receiving side of an attached socket.
#[derive(Debug)]
pub struct SocketEvents {
    events: mpsc::Receiver<SocketEvent>,
    flow: watch::Sender<bool>,
    pump: JoinHandle<()>,
}

/// Splits `stream` and starts its pump in the paused state.
///
/// Must be called from within a tokio runtime.
pub fn attach<S>(stream: S, read_size: usize) -> (SocketEvents, WriteHalf<S>)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, writer) = tokio::io::split(stream);
    let (flow, flow_rx) = watch::channel(false);
    let (events_tx, events) = mpsc::channel(1);
    let pump = tokio::spawn(pump(reader, flow_rx, events_tx, read_size.max(1)));

    (SocketEvents { events, flow, pump }, writer)
}

impl SocketEvents {
    /// Lets the pump deliver data.
    pub fn resume(&self) {
        self.flow.send_replace(true);
    }

    /// Stops delivery until the next [`resume`](Self::resume).
    pub fn pause(&self) {
        self.flow.send_replace(false);
    }

    pub fn is_flowing(&self) -> bool {
        *self.flow.borrow()
    }

    /// Waits for the next event. `None` once the pump has stopped.
    pub async fn next_event(&mut self) -> Option<SocketEvent> {
        self.events.recv().await
    }

    /// Stops the pump. Bytes not yet read stay in the kernel.
    pub fn destroy(&self) {
        self.pump.abort();
    }
}

impl Drop for SocketEvents {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

async fn pump<R>(
    mut reader: R,
    mut flow: watch::Receiver<bool>,
    events: mpsc::Sender<SocketEvent>,
    read_size: usize,
) where
    R: AsyncRead + Unpin,
{
    loop {
        if flow.wait_for(|flowing| *flowing).await.is_err() {
            return;
        }

        let mut chunk = BytesMut::with_capacity(read_size);
        let event = match reader.read_buf(&mut chunk).await {
            Ok(0) => SocketEvent::End,
            Ok(_) => SocketEvent::Data(chunk.freeze()),
            Err(err) => SocketEvent::Error(err),
        };

        let terminal = !matches!(event, SocketEvent::Data(_));
        if events.send(event).await.is_err() || terminal {
            return;
        }

        // Hold off until the consumer has seen the chunk and re-armed.
        if flow.changed().await.is_err() {
            return;
        }
    }
}
