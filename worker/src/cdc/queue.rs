use tokio::sync::mpsc;

use crate::cdc::ChangeEvent;
use crate::error::{ErrorKind, WorkerResult};
use crate::worker_error;

/// Default capacity of the change-event queue.
///
/// The queue is bounded so a fast engine cannot outrun a slow consumer
/// without backpressure; pushes block once the queue is full.
pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 10_000;

/// Producer side of the change-event queue, held by the publisher.
#[derive(Debug, Clone)]
pub struct EventQueueTx {
    tx: mpsc::Sender<ChangeEvent>,
}

impl EventQueueTx {
    /// Appends an event, blocking the calling thread while the queue is full.
    ///
    /// Intended for the engine thread, which runs outside the async runtime.
    /// Fails only when the consumer side has been dropped.
    pub fn blocking_push(&self, event: ChangeEvent) -> WorkerResult<()> {
        self.tx.blocking_send(event).map_err(|_| {
            worker_error!(
                ErrorKind::EventQueueClosed,
                "Change-event queue consumer was dropped"
            )
        })
    }

    /// Appends an event, waiting while the queue is full.
    pub async fn push(&self, event: ChangeEvent) -> WorkerResult<()> {
        self.tx.send(event).await.map_err(|_| {
            worker_error!(
                ErrorKind::EventQueueClosed,
                "Change-event queue consumer was dropped"
            )
        })
    }
}

/// Consumer side of the change-event queue.
#[derive(Debug)]
pub struct EventQueueRx {
    rx: mpsc::Receiver<ChangeEvent>,
}

impl EventQueueRx {
    /// Removes the next event without waiting.
    ///
    /// Returns [`None`] when the queue is currently empty, which callers must
    /// not confuse with the stream being finished: events can keep arriving
    /// until the publisher reports closed.
    pub fn try_pop(&mut self) -> Option<ChangeEvent> {
        self.rx.try_recv().ok()
    }

    /// Removes the next event, waiting until one is available.
    ///
    /// Returns [`None`] once all producers are gone and the queue is drained.
    pub async fn pop(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }
}

/// Creates a bounded change-event queue.
pub fn create_event_queue(capacity: usize) -> (EventQueueTx, EventQueueRx) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventQueueTx { tx }, EventQueueRx { rx })
}
