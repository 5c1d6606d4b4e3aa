//! Protocol and orchestration types flowing through the replication core.

mod catalog;
mod message;
mod sync;

pub use catalog::*;
pub use message::*;
pub use sync::*;
