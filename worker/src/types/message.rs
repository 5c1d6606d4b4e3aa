use serde::{Deserialize, Serialize};

/// A message flowing through the pipeline, either payload data or a
/// checkpoint.
///
/// Only state messages read from the destination's *own* output stream update
/// the destination tracker's checkpoint; record messages update counters only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    Record(RecordMessage),
    State(StateMessage),
}

impl Message {
    /// Returns the record payload if this is a record message.
    pub fn as_record(&self) -> Option<&RecordMessage> {
        match self {
            Message::Record(record) => Some(record),
            Message::State(_) => None,
        }
    }

    /// Returns the state payload if this is a state message.
    pub fn as_state(&self) -> Option<&StateMessage> {
        match self {
            Message::Record(_) => None,
            Message::State(state) => Some(state),
        }
    }
}

/// A single replicated record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RecordMessage {
    /// Name of the stream the record belongs to.
    pub stream: String,
    /// Namespace of the stream, when the source is namespaced.
    pub namespace: Option<String>,
    /// Opaque record payload.
    pub data: serde_json::Value,
    /// Milliseconds since the epoch at which the source emitted the record.
    pub emitted_at: i64,
}

/// A checkpoint message carrying arbitrary sync-specific progress data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StateMessage {
    /// Opaque checkpoint payload.
    pub data: serde_json::Value,
}

/// An opaque, sync-specific checkpoint blob that allows a future run to
/// resume rather than restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SyncState {
    /// Opaque checkpoint payload.
    pub data: serde_json::Value,
}

impl From<&StateMessage> for SyncState {
    fn from(message: &StateMessage) -> Self {
        Self {
            data: message.data.clone(),
        }
    }
}
