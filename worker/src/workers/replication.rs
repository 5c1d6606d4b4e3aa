use chrono::Utc;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::concurrency::cancel::CancellationFlag;
use crate::endpoint::{Destination, Mapper, MessageTracker, Source};
use crate::error::{ErrorKind, WorkerResult};
use crate::types::{ConfiguredCatalog, ReplicationOutput, ReplicationStatus, SyncInput};
use crate::worker_error;

/// How long a loop sleeps after an empty poll before asking again.
const IDLE_POLL_BACKOFF: Duration = Duration::from_millis(10);

/// Drives one full sync attempt between a [`Source`] and a [`Destination`].
///
/// `run` produces a [`ReplicationOutput`] whether the attempt succeeded, was
/// cancelled, or failed partway through; the only exception is when the
/// output cannot be safely assembled (metrics retrieval fails), in which case
/// it propagates a hard error and no output exists.
///
/// Two trackers observe the two data directions: the source-side tracker is
/// written only by the transfer loop, the destination-side tracker only by
/// the output-drain loop, and the orchestrator reads both only after the
/// loops have joined.
pub struct ReplicationWorker<S, D, M> {
    job_id: String,
    attempt: u32,
    source: S,
    mapper: M,
    destination: D,
    source_tracker: Arc<dyn MessageTracker>,
    destination_tracker: Arc<dyn MessageTracker>,
    cancel: CancellationFlag,
}

impl<S, D, M> ReplicationWorker<S, D, M>
where
    S: Source,
    D: Destination,
    M: Mapper,
{
    /// Creates a worker for one job attempt.
    pub fn new(
        job_id: impl Into<String>,
        attempt: u32,
        source: S,
        mapper: M,
        destination: D,
        source_tracker: Arc<dyn MessageTracker>,
        destination_tracker: Arc<dyn MessageTracker>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            attempt,
            source,
            mapper,
            destination,
            source_tracker,
            destination_tracker,
            cancel: CancellationFlag::new(),
        }
    }

    /// Requests cooperative cancellation of a running attempt.
    ///
    /// Non-blocking and safe from any thread; the loops observe the flag at
    /// their next iteration boundary, so `run` still has to be awaited to
    /// know cancellation took effect. A flag set while the loops were already
    /// finishing naturally still marks the attempt failed.
    pub fn cancel(&self) {
        if self.cancel.cancel() {
            info!(job_id = %self.job_id, "cancellation requested");
        } else {
            debug!(job_id = %self.job_id, "cancellation already requested");
        }
    }

    /// Runs the sync attempt end-to-end.
    ///
    /// Endpoint start failures, loop-body errors, and close failures all
    /// degrade the attempt to [`ReplicationStatus::Failed`] but still yield
    /// an output with best-effort state. Only a metrics-retrieval failure
    /// propagates as an error with no output.
    pub async fn run(&self, input: SyncInput, workdir: &Path) -> WorkerResult<ReplicationOutput> {
        let start_time = Utc::now();
        info!(
            job_id = %self.job_id,
            attempt = self.attempt,
            "starting replication worker"
        );

        let output_catalog = self.mapper.map_catalog(input.catalog.clone());

        let mut failed = false;
        if let Err(err) = self
            .run_transfer(&input, output_catalog.clone(), workdir)
            .await
        {
            failed = true;
            error!(job_id = %self.job_id, "sync attempt failed: {err}");
        }

        // Endpoints are closed regardless of how the loops ended; a close
        // failure degrades the status but does not abort output assembly.
        if let Err(err) = self.source.close().await {
            failed = true;
            error!(job_id = %self.job_id, "source close failed: {err}");
        }
        if let Err(err) = self.destination.close().await {
            failed = true;
            error!(job_id = %self.job_id, "destination close failed: {err}");
        }

        // If the counters cannot be retrieved there is no safe partial result
        // to report: propagate with no output.
        let records_synced = self.source_tracker.record_count().map_err(|err| {
            worker_error!(
                ErrorKind::MetricsUnavailable,
                "Sync record count could not be retrieved",
                source: err
            )
        })?;
        let bytes_synced = self.source_tracker.bytes_count().map_err(|err| {
            worker_error!(
                ErrorKind::MetricsUnavailable,
                "Sync bytes count could not be retrieved",
                source: err
            )
        })?;

        // Three-tier state fallback: newest checkpoint from this run, else
        // the state the sync was given, else absent.
        let state = match self.destination_tracker.output_state() {
            Some(state) => Some(state),
            None => {
                if input.state.is_some() {
                    warn!(
                        job_id = %self.job_id,
                        "no new state was observed, falling back to the input state"
                    );
                }
                input.state.clone()
            }
        };

        let status = if failed || self.cancel.is_cancelled() {
            ReplicationStatus::Failed
        } else {
            ReplicationStatus::Completed
        };
        info!(
            job_id = %self.job_id,
            attempt = self.attempt,
            ?status,
            records_synced,
            bytes_synced,
            "replication worker finished"
        );

        Ok(ReplicationOutput {
            job_id: self.job_id.clone(),
            attempt: self.attempt,
            status,
            records_synced,
            bytes_synced,
            start_time,
            end_time: Utc::now(),
            output_catalog,
            state,
        })
    }

    /// Starts both endpoints and runs the two transfer loops to a stopping
    /// point.
    async fn run_transfer(
        &self,
        input: &SyncInput,
        output_catalog: ConfiguredCatalog,
        workdir: &Path,
    ) -> WorkerResult<()> {
        self.destination
            .start(input.destination_config(output_catalog), workdir)
            .await?;
        self.source.start(input.source_config(), workdir).await?;

        // A failing loop must also stop the surviving one: its endpoint may
        // never report finished (e.g. a still-running subprocess), and the
        // run has to reach output assembly rather than wait on it forever.
        let loop_failed = CancellationFlag::new();

        let transfer = tokio::spawn(
            signal_on_error(
                transfer_loop(
                    self.source.clone(),
                    self.mapper.clone(),
                    self.destination.clone(),
                    self.source_tracker.clone(),
                    self.cancel.clone(),
                    loop_failed.clone(),
                ),
                loop_failed.clone(),
            )
            .instrument(info_span!("replication_loop", job_id = %self.job_id)),
        );
        let drain = tokio::spawn(
            signal_on_error(
                output_drain_loop(
                    self.destination.clone(),
                    self.destination_tracker.clone(),
                    self.cancel.clone(),
                    loop_failed.clone(),
                ),
                loop_failed,
            )
            .instrument(info_span!("destination_output_loop", job_id = %self.job_id)),
        );

        // Neither loop is aborted mid-iteration; a failure is signalled and
        // the survivor stops at its next iteration boundary.
        let (transfer_result, drain_result) = tokio::join!(transfer, drain);
        let transfer_result = flatten_loop_result(transfer_result);
        let drain_result = flatten_loop_result(drain_result);

        if let Err(err) = &drain_result {
            error!("destination output loop failed: {err}");
        }
        transfer_result?;
        drain_result
    }
}

/// Runs a loop future and raises the shared failure flag when it errs, so
/// the other loop stops instead of waiting on an endpoint that will never
/// finish.
async fn signal_on_error<F>(loop_future: F, loop_failed: CancellationFlag) -> WorkerResult<()>
where
    F: Future<Output = WorkerResult<()>>,
{
    let result = loop_future.await;
    if result.is_err() {
        loop_failed.cancel();
    }
    result
}

/// Maps a task join failure to a loop panic error.
fn flatten_loop_result(
    result: Result<WorkerResult<()>, tokio::task::JoinError>,
) -> WorkerResult<()> {
    result.map_err(|err| {
        worker_error!(
            ErrorKind::ReplicationLoopPanic,
            "A transfer loop panicked",
            source: err
        )
    })?
}

/// Moves messages from the source to the destination until the source is
/// finished or cancellation is observed.
async fn transfer_loop<S, D, M>(
    source: S,
    mapper: M,
    destination: D,
    tracker: Arc<dyn MessageTracker>,
    cancel: CancellationFlag,
    loop_failed: CancellationFlag,
) -> WorkerResult<()>
where
    S: Source,
    D: Destination,
    M: Mapper,
{
    info!("replication loop started");

    while !cancel.is_cancelled() && !loop_failed.is_cancelled() && !source.is_finished().await {
        match source.attempt_read().await? {
            Some(message) => {
                let message = mapper.map_message(message);
                destination.accept(message.clone()).await?;
                tracker.record_message(&message);
            }
            None => sleep(IDLE_POLL_BACKOFF).await,
        }
    }
    destination.notify_end_of_input().await?;

    info!("replication loop finished");

    Ok(())
}

/// Drains the destination's own output stream into the destination tracker
/// until the destination is finished or cancellation is observed.
///
/// Running this concurrently with the transfer loop keeps checkpoint
/// acknowledgements from backing up behind record delivery in the
/// destination's internal buffers.
async fn output_drain_loop<D>(
    destination: D,
    tracker: Arc<dyn MessageTracker>,
    cancel: CancellationFlag,
    loop_failed: CancellationFlag,
) -> WorkerResult<()>
where
    D: Destination,
{
    info!("destination output loop started");

    while !cancel.is_cancelled()
        && !loop_failed.is_cancelled()
        && !destination.is_finished().await
    {
        match destination.attempt_read().await? {
            Some(message) => tracker.record_message(&message),
            None => sleep(IDLE_POLL_BACKOFF).await,
        }
    }

    info!("destination output loop finished");

    Ok(())
}
