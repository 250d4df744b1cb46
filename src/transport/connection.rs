use serde::Serialize;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::transport::link::{self, LinkEvent, TransportLink};
use crate::transport::protocol::{ClientMessage, FramePayload, ResultPayload, ServerMessage};
use crate::transport::socket;

/// Lifecycle of the duplex channel. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

impl ConnectionState {
    fn can_become(self, next: ConnectionState) -> bool {
        matches!(
            (self, next),
            (Self::Connecting, Self::Open)
                | (Self::Connecting, Self::Closed)
                | (Self::Open, Self::Closed)
        )
    }
}

/// Something the controller has to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    StateChanged(ConnectionState),
    Result(ResultPayload),
}

/// What happened to a frame handed to [`SessionTransport::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Queued for the socket; `bytes` is the size of the JSON text.
    Sent { bytes: usize },
    /// The channel is not open. Expected right after a stop or before the
    /// connection completes.
    NotOpen,
    /// Serialisation failed or the socket driver is gone.
    Failed,
}

/// One duplex channel to the processing endpoint.
///
/// Events are pulled with [`next_event`](Self::next_event), which delivers
/// each state transition exactly once and in order. After `Closed` has been
/// delivered it never resolves again.
pub struct SessionTransport {
    state: ConnectionState,
    link: TransportLink,
    malformed: u64,
}

impl SessionTransport {
    /// Open a WebSocket to `endpoint`. Must be called inside a tokio runtime.
    pub fn connect(endpoint: Url) -> Self {
        info!("connecting to {endpoint}");
        let (link, wire) = link::pair();
        tokio::spawn(socket::drive(endpoint, wire));
        Self::over(link)
    }

    /// Build a transport on an existing link, starting in `Connecting`.
    pub fn over(link: TransportLink) -> Self {
        Self {
            state: ConnectionState::Connecting,
            link,
            malformed: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Inbound messages dropped because they could not be decoded.
    pub fn malformed_count(&self) -> u64 {
        self.malformed
    }

    /// Serialise and transmit a frame. A no-op unless the channel is open.
    pub fn send(&self, payload: FramePayload) -> SendOutcome {
        if !self.is_open() {
            trace!("frame suppressed, connection is {:?}", self.state);
            return SendOutcome::NotOpen;
        }

        let text = match ClientMessage::Frame(payload).to_json() {
            Ok(text) => text,
            Err(e) => {
                warn!("failed to serialise frame: {e}");
                return SendOutcome::Failed;
            }
        };
        let bytes = text.len();
        match self.link.outgoing.send(text) {
            Ok(()) => SendOutcome::Sent { bytes },
            Err(_) => {
                debug!("socket driver has exited, frame dropped");
                SendOutcome::Failed
            }
        }
    }

    /// Wait for the next state transition or decoded result.
    ///
    /// Cancel-safe: the only await point is the link receive.
    pub async fn next_event(&mut self) -> TransportEvent {
        loop {
            let Some(event) = self.link.events.recv().await else {
                // Driver went away without reporting; treat as a close.
                if let Some(event) = self.transition(ConnectionState::Closed) {
                    return event;
                }
                return std::future::pending().await;
            };

            match event {
                LinkEvent::Opened => {
                    if let Some(event) = self.transition(ConnectionState::Open) {
                        info!("connection open");
                        return event;
                    }
                }
                LinkEvent::Text(text) => {
                    if let Some(result) = self.decode(&text) {
                        return TransportEvent::Result(result);
                    }
                }
                LinkEvent::Closed { reason } => {
                    if let Some(event) = self.transition(ConnectionState::Closed) {
                        match reason {
                            Some(reason) => warn!("connection closed: {reason}"),
                            None => info!("connection closed"),
                        }
                        return event;
                    }
                }
            }
        }
    }

    fn transition(&mut self, next: ConnectionState) -> Option<TransportEvent> {
        if !self.state.can_become(next) {
            debug!("ignoring {:?} -> {next:?}", self.state);
            return None;
        }
        self.state = next;
        Some(TransportEvent::StateChanged(next))
    }

    fn decode(&mut self, text: &str) -> Option<ResultPayload> {
        if !self.is_open() {
            debug!("message received while {:?}, dropped", self.state);
            return None;
        }
        match ServerMessage::from_json(text) {
            Ok(ServerMessage::ProcessedData(result)) => Some(result),
            Ok(ServerMessage::Unknown) => {
                debug!("ignoring message of unknown type");
                None
            }
            Err(e) => {
                self.malformed += 1;
                warn!("dropping malformed message: {e}");
                None
            }
        }
    }
}
