//! Workers driving sync attempts.

mod replication;

pub use replication::*;
