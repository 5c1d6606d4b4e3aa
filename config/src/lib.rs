//! Shared configuration types for the replication workspace.
//!
//! Configuration is deserialized from the orchestration layer and handed to the
//! worker crate as plain structs. Sensitive values are wrapped so they never
//! leak through `Debug` output or logs.

mod secret;
pub mod shared;

pub use secret::*;
