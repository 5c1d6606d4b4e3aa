use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::SerializableSecretString;
use crate::shared::ValidationError;

/// CDC-specific options for a sync, owned by the orchestration layer.
///
/// The replication slot and publication are database-side constructs managed
/// entirely by the external capture engine; this config only names them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CdcStreamConfig {
    /// Name of the replication slot the engine resumes from.
    pub replication_slot_name: String,
    /// Name of the publication exposing the replicated tables.
    pub publication_name: String,
}

impl CdcStreamConfig {
    /// Validates the [`CdcStreamConfig`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.replication_slot_name.is_empty() {
            return Err(ValidationError::MissingReplicationSlotName);
        }
        if self.publication_name.is_empty() {
            return Err(ValidationError::MissingPublicationName);
        }

        Ok(())
    }
}

/// The full option set recognized by the external change-capture engine.
///
/// [`PublisherConfig`] is the contract between the publisher and the engine it
/// hosts. The engine consumes these options as a flat property bag (see
/// [`PublisherConfig::to_properties`]); the field names here mirror the
/// engine's property keys so the mapping stays mechanical.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PublisherConfig {
    /// Logical name of the engine instance.
    pub engine_name: String,
    /// Fully qualified class of the source connector the engine should load.
    pub connector_class: String,
    /// Path of the file the engine persists its replication position into.
    ///
    /// The file format is owned by the engine; the path is passed through
    /// unmodified.
    pub offset_storage_path: PathBuf,
    /// How often the engine flushes its offsets to storage, in milliseconds.
    pub offset_flush_interval_ms: u64,
    /// Snapshot mode used when the engine first attaches to the database.
    pub snapshot_mode: String,
    /// Hostname or IP address of the database server.
    pub host: String,
    /// Port number on which the database server is listening.
    pub port: u16,
    /// Username for authenticating with the database server.
    pub username: String,
    /// Password for the specified user. Sensitive and redacted in debug output.
    pub password: Option<SerializableSecretString>,
    /// Name of the database to capture changes from.
    pub database_name: String,
    /// Name of the replication slot the engine resumes from.
    pub replication_slot_name: String,
    /// Name of the publication exposing the replicated tables.
    pub publication_name: String,
    /// How the engine renders decimal columns. `string` avoids the precision
    /// loss of `double` and the binary encoding of `precise`.
    pub decimal_handling_mode: String,
    /// Comma-separated allow-list of `namespace.name` table entries, with
    /// literal commas escaped as `\,` because the engine splits on commas.
    pub table_include_list: String,
    /// Comma-separated allow-list of databases.
    pub database_include_list: String,
    /// Whether the engine may create the publication itself.
    pub publication_autocreate_mode: String,
}

impl PublisherConfig {
    /// Validates the [`PublisherConfig`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.offset_storage_path.as_os_str().is_empty() {
            return Err(ValidationError::MissingOffsetStoragePath);
        }
        if self.replication_slot_name.is_empty() {
            return Err(ValidationError::MissingReplicationSlotName);
        }
        if self.publication_name.is_empty() {
            return Err(ValidationError::MissingPublicationName);
        }

        Ok(())
    }

    /// Renders the options as the flat property bag the engine consumes.
    ///
    /// The password is materialized into the bag only when present, so engines
    /// relying on trust authentication never see an empty password property.
    pub fn to_properties(&self) -> BTreeMap<String, String> {
        let mut props = BTreeMap::new();

        props.insert("name".to_owned(), self.engine_name.clone());
        props.insert("connector.class".to_owned(), self.connector_class.clone());
        props.insert(
            "offset.storage.file.filename".to_owned(),
            self.offset_storage_path.to_string_lossy().into_owned(),
        );
        props.insert(
            "offset.flush.interval.ms".to_owned(),
            self.offset_flush_interval_ms.to_string(),
        );
        props.insert("snapshot.mode".to_owned(), self.snapshot_mode.clone());

        props.insert("database.hostname".to_owned(), self.host.clone());
        props.insert("database.port".to_owned(), self.port.to_string());
        props.insert("database.user".to_owned(), self.username.clone());
        props.insert("database.dbname".to_owned(), self.database_name.clone());
        props.insert(
            "database.server.name".to_owned(),
            self.database_name.clone(),
        );
        if let Some(password) = &self.password {
            props.insert(
                "database.password".to_owned(),
                password.expose_secret().clone(),
            );
        }

        props.insert("slot.name".to_owned(), self.replication_slot_name.clone());
        props.insert(
            "publication.name".to_owned(),
            self.publication_name.clone(),
        );
        props.insert(
            "decimal.handling.mode".to_owned(),
            self.decimal_handling_mode.clone(),
        );
        props.insert(
            "table.include.list".to_owned(),
            self.table_include_list.clone(),
        );
        props.insert(
            "database.include.list".to_owned(),
            self.database_include_list.clone(),
        );
        props.insert(
            "publication.autocreate.mode".to_owned(),
            self.publication_autocreate_mode.clone(),
        );

        props
    }
}
