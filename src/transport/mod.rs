// Session transport: one duplex channel to the processing endpoint.

pub mod connection;
pub mod endpoint;
pub mod error;
pub mod link;
pub mod protocol;
pub(crate) mod socket;

pub use connection::{ConnectionState, SendOutcome, SessionTransport, TransportEvent};
pub use protocol::{FramePayload, ResultPayload};
