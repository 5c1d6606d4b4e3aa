//! Data-movement core of an extract-and-load replication pipeline.
//!
//! The crate moves a stream of structured records from a [`Source`] to a
//! [`Destination`], optionally via change-data-capture, while tracking
//! progress, surviving partial failures, and supporting mid-flight
//! cancellation with a resumable checkpoint.
//!
//! Two subsystems make up the core:
//!
//! - [`cdc::ChangeStreamPublisher`] bridges an externally-driven
//!   change-capture engine into a bounded queue of events, with idempotent,
//!   bounded-timeout shutdown and error propagation from the engine thread
//!   back to the caller.
//! - [`workers::ReplicationWorker`] orchestrates the two concurrent transfer
//!   loops of a sync attempt, tracks record/byte counts and the latest
//!   acknowledged checkpoint, and assembles a best-effort
//!   [`types::ReplicationOutput`] even when the attempt fails or is cancelled.
//!
//! [`Source`]: endpoint::Source
//! [`Destination`]: endpoint::Destination

pub mod cdc;
pub mod concurrency;
pub mod endpoint;
pub mod error;
mod macros;
pub mod types;
pub mod workers;
