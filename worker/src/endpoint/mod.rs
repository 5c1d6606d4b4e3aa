//! Collaborator contracts the replication core consumes.
//!
//! The contracts are deliberately narrow: the worker only polls, forwards,
//! and closes. Implementations are shared across the two transfer loops, so
//! every trait takes `&self` and requires `Clone + Send + Sync`; interior
//! mutability is the implementation's concern.

mod destination;
mod mapper;
mod source;
mod tracker;

pub use destination::*;
pub use mapper::*;
pub use source::*;
pub use tracker::*;
