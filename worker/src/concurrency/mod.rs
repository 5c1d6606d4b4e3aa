//! Concurrency primitives coordinating the replication loops.

pub mod cancel;
