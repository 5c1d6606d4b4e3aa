use serde::{Deserialize, Serialize};

/// How a configured stream is replicated.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Re-read the whole stream on every sync.
    FullRefresh,
    /// Read only changes since the last checkpoint.
    Incremental,
}

/// A stream selected for replication, together with its sync mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ConfiguredStream {
    /// Name of the stream.
    pub name: String,
    /// Namespace (e.g. database schema) of the stream.
    pub namespace: String,
    /// How the stream is replicated.
    pub sync_mode: SyncMode,
}

/// The ordered set of streams a sync is configured to replicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ConfiguredCatalog {
    pub streams: Vec<ConfiguredStream>,
}
