//! Change-data-capture bridge.
//!
//! This module owns the boundary between an externally-driven change-capture
//! engine (which emits events on its own thread via callback) and the
//! consumer-facing bounded queue a CDC-backed [`Source`] drains from.
//!
//! [`Source`]: crate::endpoint::Source

mod engine;
mod publisher;
mod queue;

pub use engine::*;
pub use publisher::*;
pub use queue::*;
