//! In-process channel pair between the transport state machine and whatever
//! drives the socket.
//!
//! The production driver is [`crate::transport::socket`]; tests hold the
//! [`WireEnd`] themselves and play the part of the network.

use tokio::sync::mpsc;

/// What the socket side reports to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// The channel finished opening.
    Opened,
    /// One inbound text frame, still undecoded.
    Text(String),
    /// The channel is gone, either because opening failed or because it closed.
    Closed { reason: Option<String> },
}

/// Transport-side end of the link.
pub struct TransportLink {
    pub(crate) events: mpsc::UnboundedReceiver<LinkEvent>,
    pub(crate) outgoing: mpsc::UnboundedSender<String>,
}

/// Socket-side end of the link.
pub struct WireEnd {
    events: mpsc::UnboundedSender<LinkEvent>,
    outgoing: mpsc::UnboundedReceiver<String>,
}

/// Create a connected pair of link ends.
///
/// Both directions are unbounded: outbound frames are never held back
/// waiting for earlier sends.
pub fn pair() -> (TransportLink, WireEnd) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
    (
        TransportLink {
            events: events_rx,
            outgoing: outgoing_tx,
        },
        WireEnd {
            events: events_tx,
            outgoing: outgoing_rx,
        },
    )
}

impl WireEnd {
    /// Report that the channel opened.
    pub fn open(&self) {
        let _ = self.events.send(LinkEvent::Opened);
    }

    /// Deliver one inbound text frame.
    pub fn deliver(&self, text: impl Into<String>) {
        let _ = self.events.send(LinkEvent::Text(text.into()));
    }

    /// Report that the channel closed.
    pub fn close(&self, reason: Option<String>) {
        let _ = self.events.send(LinkEvent::Closed { reason });
    }

    /// Wait for the next frame the transport sent.
    pub async fn next_outgoing(&mut self) -> Option<String> {
        self.outgoing.recv().await
    }

    /// Take the next sent frame without waiting.
    pub fn try_next_outgoing(&mut self) -> Option<String> {
        self.outgoing.try_recv().ok()
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        mpsc::UnboundedSender<LinkEvent>,
        mpsc::UnboundedReceiver<String>,
    ) {
        (self.events, self.outgoing)
    }
}
