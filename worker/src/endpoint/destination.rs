use std::future::Future;
use std::path::Path;

use crate::error::WorkerResult;
use crate::types::{DestinationConfig, Message};

/// A system records are replicated into.
///
/// Besides accepting records, a destination emits its own output stream of
/// messages (checkpoint acknowledgements, at minimum) which the worker drains
/// concurrently with the transfer loop so that acknowledgements never back up
/// behind record delivery.
pub trait Destination: Clone + Send + Sync + 'static {
    /// Starts the destination against the given working directory.
    fn start(
        &self,
        config: DestinationConfig,
        workdir: &Path,
    ) -> impl Future<Output = WorkerResult<()>> + Send;

    /// Hands a message to the destination. May fail, e.g. on malformed input.
    fn accept(&self, message: Message) -> impl Future<Output = WorkerResult<()>> + Send;

    /// Signals that no further messages will be accepted.
    fn notify_end_of_input(&self) -> impl Future<Output = WorkerResult<()>> + Send;

    /// Returns whether the destination's output stream is exhausted.
    fn is_finished(&self) -> impl Future<Output = bool> + Send;

    /// Attempts to read the next message of the destination's own output
    /// stream without waiting for one.
    fn attempt_read(&self) -> impl Future<Output = WorkerResult<Option<Message>>> + Send;

    /// Releases the destination's resources. May fail.
    fn close(&self) -> impl Future<Output = WorkerResult<()>> + Send;
}
