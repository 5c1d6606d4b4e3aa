use config::shared::PublisherConfig;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::bail;
use crate::cdc::engine::CaptureEngine;
use crate::cdc::queue::EventQueueTx;
use crate::error::{ErrorKind, WorkerError, WorkerResult};
use crate::worker_error;

/// Bound on each of the two shutdown waits (completion latch, engine task).
///
/// The bound converts "engine wedged" into an observable outcome instead of
/// an infinite hang.
pub const ENGINE_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Builds a capture engine from the publisher's configuration.
type EngineFactory<E> = Box<dyn FnOnce(&PublisherConfig) -> WorkerResult<E> + Send>;

/// Owns the lifecycle of an async change-capture engine and surfaces its
/// output as a plain queue of events.
///
/// The engine executes on a dedicated blocking thread; its own threading
/// model is hidden from the consumer, which only sees events appearing on the
/// queue handed to [`ChangeStreamPublisher::start`]. Shutdown is idempotent
/// and bounded; an error raised on the engine thread becomes visible to the
/// caller only through [`ChangeStreamPublisher::close`], since the engine's
/// completion runs outside any caller's call stack.
pub struct ChangeStreamPublisher<E> {
    config: PublisherConfig,
    build: Mutex<Option<EngineFactory<E>>>,
    engine: Mutex<Option<Arc<E>>>,
    engine_task: Mutex<Option<JoinHandle<()>>>,
    engine_error: Arc<Mutex<Option<WorkerError>>>,
    is_closing: AtomicBool,
    has_closed: AtomicBool,
    done_tx: watch::Sender<bool>,
    done_rx: watch::Receiver<bool>,
    closed_tx: watch::Sender<bool>,
    closed_rx: watch::Receiver<bool>,
    shutdown_timeout: Duration,
}

impl<E> ChangeStreamPublisher<E>
where
    E: CaptureEngine,
{
    /// Creates a publisher that will construct its engine from `config` via
    /// `build` when started.
    pub fn new<F>(config: PublisherConfig, build: F) -> Self
    where
        F: FnOnce(&PublisherConfig) -> WorkerResult<E> + Send + 'static,
    {
        let (done_tx, done_rx) = watch::channel(false);
        let (closed_tx, closed_rx) = watch::channel(false);

        Self {
            config,
            build: Mutex::new(Some(Box::new(build))),
            engine: Mutex::new(None),
            engine_task: Mutex::new(None),
            engine_error: Arc::new(Mutex::new(None)),
            is_closing: AtomicBool::new(false),
            has_closed: AtomicBool::new(false),
            done_tx,
            done_rx,
            closed_tx,
            closed_rx,
            shutdown_timeout: ENGINE_SHUTDOWN_TIMEOUT,
        }
    }

    /// Overrides the bound applied to each shutdown wait.
    pub fn with_shutdown_timeout(mut self, shutdown_timeout: Duration) -> Self {
        self.shutdown_timeout = shutdown_timeout;
        self
    }

    /// Constructs the engine and starts feeding accepted events into `queue`.
    ///
    /// Tombstone events (missing value) are filtered and never enqueued. The
    /// engine runs in the background; this call returns as soon as it has
    /// been submitted. Any error the engine completes with is recorded and
    /// raised later by [`ChangeStreamPublisher::close`].
    pub async fn start(&self, queue: EventQueueTx) -> WorkerResult<()> {
        let Some(build) = self.build.lock().await.take() else {
            bail!(
                ErrorKind::InvalidState,
                "Change-stream publisher was already started"
            );
        };

        let engine = Arc::new(build(&self.config)?);
        *self.engine.lock().await = Some(engine.clone());

        info!(
            engine_name = %self.config.engine_name,
            "starting capture engine"
        );

        let engine_error = self.engine_error.clone();
        let done_tx = self.done_tx.clone();
        let task = tokio::task::spawn_blocking(move || {
            let result = engine.run(&move |event| {
                if event.is_tombstone() {
                    return;
                }
                if queue.blocking_push(event).is_err() {
                    // The consumer is gone; the engine is about to be closed
                    // anyway, so the event is dropped.
                    debug!("dropping change event, queue consumer was dropped");
                }
            });

            // This block is the engine's completion callback: it records the
            // terminal error (if any) and fires the completion latch the
            // close sequence waits on.
            info!("capture engine shut down");
            if let Err(err) = result {
                *engine_error.blocking_lock() = Some(err);
            }
            let _ = done_tx.send(true);
        });
        *self.engine_task.lock().await = Some(task);

        Ok(())
    }

    /// Returns true only after a full shutdown sequence has completed.
    ///
    /// Consumers must keep draining the queue until this reports true:
    /// requesting a stop does not mean the engine stops producing events
    /// immediately.
    pub fn has_closed(&self) -> bool {
        self.has_closed.load(Ordering::SeqCst)
    }

    /// Shuts the engine down and surfaces any error it completed with.
    ///
    /// Idempotent: only the first caller executes the shutdown sequence;
    /// concurrent or late callers wait for it to finish and observe the same
    /// outcome. The sequence requests a graceful engine stop, waits (bounded)
    /// for the engine's completion latch, then waits (bounded) for the engine
    /// task to terminate, and finally marks the publisher closed.
    ///
    /// A timeout during either bounded wait is deliberately not raised as an
    /// error: the publisher proceeds to mark itself closed, so a wedged
    /// engine silently appears closed. Raising on timeout instead would be a
    /// semantic change for callers that treat close errors as sync failures.
    pub async fn close(&self) -> WorkerResult<()> {
        if self
            .is_closing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let engine = self.engine.lock().await.clone();
            if let Some(engine) = engine.as_ref() {
                engine.request_stop();

                // Rendezvous with the completion callback before tearing the
                // task down, so in-flight events are not lost.
                let mut done_rx = self.done_rx.clone();
                let _ = timeout(self.shutdown_timeout, done_rx.wait_for(|done| *done)).await;
            }

            if let Some(task) = self.engine_task.lock().await.take() {
                if timeout(self.shutdown_timeout, task).await.is_err() {
                    info!("capture engine task did not terminate within the shutdown timeout");
                }
            }

            self.has_closed.store(true, Ordering::SeqCst);
            let _ = self.closed_tx.send(true);
        } else {
            // Another caller is executing (or has executed) the shutdown
            // sequence; wait for it so every caller observes the final state.
            // The executing caller may spend up to two bounded waits (latch,
            // then task join), so late callers wait for twice the bound.
            let mut closed_rx = self.closed_rx.clone();
            let _ = timeout(self.shutdown_timeout * 2, closed_rx.wait_for(|closed| *closed)).await;
        }

        if let Some(err) = self.engine_error.lock().await.clone() {
            return Err(worker_error!(
                ErrorKind::CaptureEngineFailed,
                "Capture engine completed with an error",
                source: err
            ));
        }

        Ok(())
    }
}
