use std::future::Future;
use std::path::Path;

use crate::error::WorkerResult;
use crate::types::{Message, SourceConfig};

/// A system records are replicated from.
///
/// Reads are polling-style and non-blocking: [`Source::attempt_read`] returns
/// [`None`] when no message is currently available, which says nothing about
/// whether the source is finished. Once [`Source::is_finished`] returns true,
/// subsequent reads must not produce new messages.
pub trait Source: Clone + Send + Sync + 'static {
    /// Starts the source against the given working directory.
    fn start(
        &self,
        config: SourceConfig,
        workdir: &Path,
    ) -> impl Future<Output = WorkerResult<()>> + Send;

    /// Returns whether the source has produced everything it will produce.
    fn is_finished(&self) -> impl Future<Output = bool> + Send;

    /// Attempts to read the next message without waiting for one.
    fn attempt_read(&self) -> impl Future<Output = WorkerResult<Option<Message>>> + Send;

    /// Releases the source's resources. May fail.
    fn close(&self) -> impl Future<Output = WorkerResult<()>> + Send;
}
