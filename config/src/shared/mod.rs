mod connection;
mod publisher;

pub use connection::*;
pub use publisher::*;

use thiserror::Error;

/// Errors raised when validating shared configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("the replication slot name must not be empty")]
    MissingReplicationSlotName,
    #[error("the publication name must not be empty")]
    MissingPublicationName,
    #[error("the offset storage path must not be empty")]
    MissingOffsetStoragePath,
}
