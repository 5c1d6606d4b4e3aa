use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ConfiguredCatalog, SyncState};

/// Everything a sync attempt needs as input.
///
/// The endpoint configurations are opaque JSON blobs owned by the
/// orchestration layer; the worker only splits them into per-endpoint views.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SyncInput {
    /// Connector-specific configuration for the source.
    pub source_configuration: serde_json::Value,
    /// Connector-specific configuration for the destination.
    pub destination_configuration: serde_json::Value,
    /// Streams selected for this sync.
    pub catalog: ConfiguredCatalog,
    /// Checkpoint from a previous run, if the sync ever had one.
    pub state: Option<SyncState>,
}

impl SyncInput {
    /// Derives the source-facing view of this input.
    pub fn source_config(&self) -> SourceConfig {
        SourceConfig {
            configuration: self.source_configuration.clone(),
            catalog: self.catalog.clone(),
            state: self.state.clone(),
        }
    }

    /// Derives the destination-facing view of this input.
    ///
    /// The destination receives the mapped catalog, not the raw one.
    pub fn destination_config(&self, mapped_catalog: ConfiguredCatalog) -> DestinationConfig {
        DestinationConfig {
            configuration: self.destination_configuration.clone(),
            catalog: mapped_catalog,
        }
    }
}

/// Source-facing slice of a [`SyncInput`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SourceConfig {
    pub configuration: serde_json::Value,
    pub catalog: ConfiguredCatalog,
    pub state: Option<SyncState>,
}

/// Destination-facing slice of a [`SyncInput`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DestinationConfig {
    pub configuration: serde_json::Value,
    pub catalog: ConfiguredCatalog,
}

/// Terminal status of a sync attempt.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicationStatus {
    Completed,
    Failed,
}

/// Immutable result of one sync attempt.
///
/// Created exactly once per run, after both transfer loops have stopped and
/// both endpoints have been closed (or close failed non-fatally). A cancelled
/// or failed run still produces an output carrying the best-effort state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReplicationOutput {
    /// Identifier of the job this attempt belongs to.
    pub job_id: String,
    /// Zero-based attempt number within the job.
    pub attempt: u32,
    /// Terminal status of the attempt.
    pub status: ReplicationStatus,
    /// Number of records forwarded to the destination.
    pub records_synced: u64,
    /// Approximate number of payload bytes forwarded to the destination.
    pub bytes_synced: u64,
    /// Instant at which `run` was entered.
    pub start_time: DateTime<Utc>,
    /// Instant at which output assembly finished.
    pub end_time: DateTime<Utc>,
    /// The catalog after mapping, as handed to the destination.
    pub output_catalog: ConfiguredCatalog,
    /// Best-effort checkpoint: the newest state observed from the
    /// destination's output during this run, else the input state, else
    /// absent.
    pub state: Option<SyncState>,
}
