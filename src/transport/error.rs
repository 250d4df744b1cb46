use thiserror::Error;

/// Errors raised while setting up the duplex channel.
///
/// Runtime failures of an open channel are not errors: they surface as a
/// transition to `Closed`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("invalid origin {origin:?}: {reason}")]
    InvalidOrigin { origin: String, reason: String },

    #[error("origin scheme {0:?} cannot be upgraded to a WebSocket scheme")]
    UnsupportedScheme(String),
}
