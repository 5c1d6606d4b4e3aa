use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::WorkerResult;
use crate::types::{Message, SyncState};

/// Passive observer accumulating counts and the latest checkpoint from a
/// message stream.
///
/// One tracker instance observes exactly one data direction and is written by
/// exactly one loop; the orchestrator reads it only after both loops have
/// joined. Implementations must be safe for that single-writer-plus-final-read
/// pattern.
pub trait MessageTracker: Send + Sync {
    /// Observes one message passing through.
    fn record_message(&self, message: &Message);

    /// Returns the number of records observed.
    ///
    /// This is the one retrieval the orchestrator cannot recover from: a
    /// failure here makes the whole sync irrecoverable.
    fn record_count(&self) -> WorkerResult<u64>;

    /// Returns the approximate number of payload bytes observed.
    fn bytes_count(&self) -> WorkerResult<u64>;

    /// Returns the most recent checkpoint-bearing message observed, if any.
    ///
    /// Only meaningful for the tracker draining the destination's output.
    fn output_state(&self) -> Option<SyncState>;
}

/// Default in-memory [`MessageTracker`].
///
/// Record messages bump the counters (bytes approximate the serialized record
/// payload); state messages replace the latest-checkpoint cell.
#[derive(Debug, Default)]
pub struct StatsTracker {
    records: AtomicU64,
    bytes: AtomicU64,
    state: Mutex<Option<SyncState>>,
}

impl StatsTracker {
    /// Creates a tracker with zeroed counters and no checkpoint.
    pub fn new() -> Self {
        Self::default()
    }
}

impl MessageTracker for StatsTracker {
    fn record_message(&self, message: &Message) {
        match message {
            Message::Record(record) => {
                self.records.fetch_add(1, Ordering::SeqCst);
                self.bytes
                    .fetch_add(record.data.to_string().len() as u64, Ordering::SeqCst);
            }
            Message::State(state) => {
                let mut latest = self.state.lock().unwrap_or_else(|err| err.into_inner());
                *latest = Some(SyncState::from(state));
            }
        }
    }

    fn record_count(&self) -> WorkerResult<u64> {
        Ok(self.records.load(Ordering::SeqCst))
    }

    fn bytes_count(&self) -> WorkerResult<u64> {
        Ok(self.bytes.load(Ordering::SeqCst))
    }

    fn output_state(&self) -> Option<SyncState> {
        self.state
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .clone()
    }
}
