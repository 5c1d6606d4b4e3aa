use config::shared::{CdcStreamConfig, PublisherConfig, SourceConnectionConfig};
use std::path::Path;

use crate::error::WorkerResult;
use crate::types::{ConfiguredCatalog, SyncMode};

/// Default options handed to the capture engine, mirroring what the engine
/// recommends for logical-decoding sources.
const CONNECTOR_CLASS: &str = "io.debezium.connector.postgresql.PostgresConnector";
const SNAPSHOT_MODE: &str = "exported";
const OFFSET_FLUSH_INTERVAL_MS: u64 = 1000;
// `precise` would emit decimals as binary and `double` loses precision.
const DECIMAL_HANDLING_MODE: &str = "string";
// Recommended when the publication is managed out of band.
const PUBLICATION_AUTOCREATE_MODE: &str = "disabled";

/// A single event emitted by the change-capture engine.
///
/// A missing value marks a deletion-tombstone artifact of the engine's
/// log-to-event transport; tombstones are filtered by the publisher and never
/// reach the queue.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// Serialized key of the changed row, when the engine provides one.
    pub key: Option<String>,
    /// Serialized payload of the change; [`None`] for tombstones.
    pub value: Option<String>,
}

impl ChangeEvent {
    /// Returns whether this event is a tombstone.
    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }
}

/// The external change-capture engine hosted by the publisher.
///
/// Implementations stream row-level database changes, typically backed by the
/// database's write-ahead log. The engine owns its replication-slot and
/// offset-file mechanics; this core only drives its lifecycle.
pub trait CaptureEngine: Send + Sync + 'static {
    /// Runs the engine to completion, blocking the calling thread.
    ///
    /// Every captured event is delivered to `on_event` on the engine's
    /// thread. The call returns once the engine stops, either on its own or
    /// after [`CaptureEngine::request_stop`]; a returned error is surfaced to
    /// the publisher's `close` caller.
    fn run(&self, on_event: &(dyn Fn(ChangeEvent) + Send + Sync)) -> WorkerResult<()>;

    /// Requests a graceful stop.
    ///
    /// The engine may keep emitting events after this returns; consumers must
    /// keep draining until `run` completes. Forcing a synchronous stop would
    /// risk losing in-flight events or corrupting the engine's checkpoint.
    fn request_stop(&self);
}

/// Builds the engine option set for one sync.
///
/// The table allow-list is derived from the configured catalog; everything
/// else is passed through from the connection and CDC configs with the
/// engine-recommended defaults filled in.
pub fn publisher_config(
    connection: &SourceConnectionConfig,
    cdc: &CdcStreamConfig,
    offset_storage_path: &Path,
    catalog: &ConfiguredCatalog,
) -> PublisherConfig {
    PublisherConfig {
        engine_name: connection.database.clone(),
        connector_class: CONNECTOR_CLASS.to_owned(),
        offset_storage_path: offset_storage_path.to_path_buf(),
        offset_flush_interval_ms: OFFSET_FLUSH_INTERVAL_MS,
        snapshot_mode: SNAPSHOT_MODE.to_owned(),
        host: connection.host.clone(),
        port: connection.port,
        username: connection.username.clone(),
        password: connection.password.clone(),
        database_name: connection.database.clone(),
        replication_slot_name: cdc.replication_slot_name.clone(),
        publication_name: cdc.publication_name.clone(),
        decimal_handling_mode: DECIMAL_HANDLING_MODE.to_owned(),
        table_include_list: table_include_list(catalog),
        database_include_list: connection.database.clone(),
        publication_autocreate_mode: PUBLICATION_AUTOCREATE_MODE.to_owned(),
    }
}

/// Derives the engine's table allow-list from the configured catalog.
///
/// Only streams replicated incrementally are captured. Entries are rendered
/// as `namespace.name` in stream order; literal commas inside either part are
/// escaped as `\,` because the engine's list format splits on unescaped
/// commas.
pub fn table_include_list(catalog: &ConfiguredCatalog) -> String {
    catalog
        .streams
        .iter()
        .filter(|stream| stream.sync_mode == SyncMode::Incremental)
        .map(|stream| escape_commas(&format!("{}.{}", stream.namespace, stream.name)))
        .collect::<Vec<_>>()
        .join(",")
}

fn escape_commas(entry: &str) -> String {
    entry.replace(',', "\\,")
}
