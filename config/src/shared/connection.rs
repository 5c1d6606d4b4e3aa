use serde::{Deserialize, Serialize};

use crate::SerializableSecretString;

/// Connection parameters for the database a capture engine replicates from.
///
/// The core never opens this connection itself; the parameters are passed
/// through to the external change-capture engine unmodified.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SourceConnectionConfig {
    /// Hostname or IP address of the database server.
    pub host: String,
    /// Port number on which the database server is listening.
    pub port: u16,
    /// Name of the database to replicate from.
    pub database: String,
    /// Username for authenticating with the database server.
    pub username: String,
    /// Password for the specified user. Sensitive and redacted in debug output.
    pub password: Option<SerializableSecretString>,
}
