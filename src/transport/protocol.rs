//! Wire format: one JSON object per text frame, discriminated by `type`.

use serde::{Deserialize, Serialize};

/// Outbound sampled frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramePayload {
    /// Encoded still image as a data URL.
    pub image: String,
    #[serde(rename = "exercise_type")]
    pub exercise_kind: String,
}

/// Inbound result for one processed frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultPayload {
    /// Annotated image as a data URL.
    pub image: String,
    pub rep_count: u32,
    pub feedback: String,
}

/// Messages the client sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Frame(FramePayload),
}

/// Messages the endpoint sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    ProcessedData(ResultPayload),
    /// Any other `type`; the client has no use for it.
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl ServerMessage {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
