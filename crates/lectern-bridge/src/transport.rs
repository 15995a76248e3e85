//! In-process message transport between a content sandbox and its host.
//!
//! The bridge never shares memory across the boundary: every call crosses as
//! a serialized JSON frame over a one-directional-at-a-time, ordered,
//! asynchronous channel pair, the in-process stand-in for a cross-origin
//! `postMessage` channel. [`channel_pair`] wires two [`Endpoint`]s together;
//! whichever side holds an endpoint can send frames to the peer and receive
//! the peer's frames in order.

use tokio::sync::mpsc;

/// Errors raised by the frame channel.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The peer endpoint was dropped and the channel is gone.
    #[error("message channel closed")]
    Closed,
}

/// One side of a connected frame channel.
#[derive(Debug)]
pub struct Endpoint {
    tx: mpsc::UnboundedSender<String>,
    rx: mpsc::UnboundedReceiver<String>,
}

impl Endpoint {
    /// Sends a serialized frame to the peer.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] when the peer endpoint is gone.
    pub fn send(&self, frame: String) -> Result<(), TransportError> {
        self.tx.send(frame).map_err(|_| TransportError::Closed)
    }

    /// Receives the next frame from the peer, or `None` once the channel is
    /// closed and drained.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Splits the endpoint into a cloneable sender and the receiving half.
    #[must_use]
    pub fn split(self) -> (FrameSender, FrameReceiver) {
        (FrameSender(self.tx), FrameReceiver(self.rx))
    }
}

/// Cloneable sending half of an [`Endpoint`].
#[derive(Debug, Clone)]
pub struct FrameSender(mpsc::UnboundedSender<String>);

impl FrameSender {
    /// Sends a serialized frame to the peer.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] when the peer endpoint is gone.
    pub fn send(&self, frame: String) -> Result<(), TransportError> {
        self.0.send(frame).map_err(|_| TransportError::Closed)
    }
}

/// Receiving half of an [`Endpoint`].
#[derive(Debug)]
pub struct FrameReceiver(mpsc::UnboundedReceiver<String>);

impl FrameReceiver {
    /// Receives the next frame, or `None` once the channel is closed and
    /// drained.
    pub async fn recv(&mut self) -> Option<String> {
        self.0.recv().await
    }
}

/// Creates a connected pair of endpoints: one for the content sandbox, one
/// for the host.
///
/// Frames sent on either endpoint arrive at the other in send order.
#[must_use]
pub fn channel_pair() -> (Endpoint, Endpoint) {
    let (content_tx, host_rx) = mpsc::unbounded_channel();
    let (host_tx, content_rx) = mpsc::unbounded_channel();
    (
        Endpoint {
            tx: content_tx,
            rx: content_rx,
        },
        Endpoint {
            tx: host_tx,
            rx: host_rx,
        },
    )
}
