use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Single-shot cooperative stop flag.
///
/// Shared between the caller and the replication loops for cancellation,
/// and between the loops themselves so a failing loop can stop the survivor.
/// The setter calls [`CancellationFlag::cancel`] and readers check the flag
/// at each iteration boundary. Blocking calls inside an iteration are never
/// interrupted, so stop latency is bounded by how quickly the loops reach
/// their next check.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    /// Creates a new, unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Non-blocking and safe from any thread.
    ///
    /// Returns `true` when this call was the one that set the flag, `false`
    /// when cancellation had already been requested.
    pub fn cancel(&self) -> bool {
        !self.cancelled.swap(true, Ordering::SeqCst)
    }

    /// Returns whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
