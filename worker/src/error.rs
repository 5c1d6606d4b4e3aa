//! Error types and result definitions for replication operations.
//!
//! [`WorkerError`] carries an [`ErrorKind`] classification, a static
//! description, optional dynamic detail, an optional source error, and the
//! callsite that produced it. Errors are cheaply cloneable so that concurrent
//! observers of the same failure (e.g. racing `close()` callers) can all
//! report it.

use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Convenient result type for replication operations using [`WorkerError`].
pub type WorkerResult<T> = Result<T, WorkerError>;

/// Specific categories of errors that can occur during a sync attempt.
///
/// The classification drives the orchestrator's propagation policy: most
/// kinds are downgraded to a failed-but-reported run, while
/// [`ErrorKind::MetricsUnavailable`] and [`ErrorKind::CaptureEngineFailed`]
/// propagate as hard failures.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Endpoint errors.
    SourceError,
    DestinationError,
    SourceCloseFailed,
    DestinationCloseFailed,

    // Change-capture errors.
    CaptureEngineFailed,
    CaptureEngineStartFailed,
    EventQueueClosed,

    // Orchestration errors.
    MetricsUnavailable,
    ReplicationLoopPanic,
    InvalidState,

    // Ambient errors.
    ConfigError,
    IoError,
    SerializationError,
    DeserializationError,

    Unknown,
}

/// Main error type for replication operations.
#[derive(Debug, Clone)]
pub struct WorkerError {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
}

impl WorkerError {
    /// Creates a [`WorkerError`] from its components.
    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            kind,
            description,
            detail,
            source,
            location: Location::caller(),
        }
    }

    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the detailed error information if available.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Returns the captured callsite location for this error.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Attaches an originating [`error::Error`] and returns the modified
    /// instance.
    ///
    /// The stored source is preserved across clones and exposed via
    /// [`error::Error::source`].
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }
}

/// Equality considers only the [`ErrorKind`], so tests and retry policies can
/// match on classification without comparing captured locations or detail.
impl PartialEq for WorkerError {
    fn eq(&self, other: &WorkerError) -> bool {
        self.kind == other.kind
    }
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(
            f,
            "[{:?}] {} @ {}:{}:{}",
            self.kind,
            self.description,
            self.location.file(),
            self.location.line(),
            self.location.column()
        )?;

        if let Some(detail) = &self.detail {
            write!(f, "\n  Detail: {detail}")?;
        }

        Ok(())
    }
}

impl error::Error for WorkerError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|source| source as &(dyn error::Error + 'static))
    }
}

/// Creates a [`WorkerError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for WorkerError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> WorkerError {
        WorkerError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

/// Creates a [`WorkerError`] from an error kind, static description, and
/// dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for WorkerError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> WorkerError {
        WorkerError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

/// Converts [`std::io::Error`] to [`WorkerError`] with [`ErrorKind::IoError`].
impl From<std::io::Error> for WorkerError {
    #[track_caller]
    fn from(err: std::io::Error) -> WorkerError {
        let detail = err.to_string();
        let source = Arc::new(err);
        WorkerError::from_components(
            ErrorKind::IoError,
            Cow::Borrowed("I/O operation failed"),
            Some(Cow::Owned(detail)),
            Some(source),
        )
    }
}

/// Converts [`serde_json::Error`] to [`WorkerError`] with the appropriate
/// error kind.
impl From<serde_json::Error> for WorkerError {
    #[track_caller]
    fn from(err: serde_json::Error) -> WorkerError {
        let (kind, description) = match err.classify() {
            serde_json::error::Category::Io => (ErrorKind::IoError, "JSON I/O operation failed"),
            _ => (
                ErrorKind::DeserializationError,
                "JSON deserialization failed",
            ),
        };

        let detail = err.to_string();
        let source = Arc::new(err);
        WorkerError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(source),
        )
    }
}
