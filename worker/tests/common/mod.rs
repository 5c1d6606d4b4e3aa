//! Scripted in-memory endpoints and engines shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use config::shared::PublisherConfig;
use serde_json::json;
use worker::cdc::{CaptureEngine, ChangeEvent};
use worker::endpoint::{Destination, Mapper, MessageTracker, Source};
use worker::error::{ErrorKind, WorkerError, WorkerResult};
use worker::types::{
    ConfiguredCatalog, ConfiguredStream, DestinationConfig, Message, RecordMessage, SourceConfig,
    StateMessage, SyncInput, SyncMode, SyncState,
};

static INIT_TEST_TRACING: Once = Once::new();

/// Initializes terminal tracing for a test when `ENABLE_TRACING` is set.
pub fn init_test_tracing() {
    INIT_TEST_TRACING.call_once(|| {
        if std::env::var("ENABLE_TRACING").is_ok() {
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
                )
                .with_test_writer()
                .init();
        }
    });
}

pub fn record(stream: &str, field: &str) -> Message {
    Message::Record(RecordMessage {
        stream: stream.to_owned(),
        namespace: Some("public".to_owned()),
        data: json!({ "field": field }),
        emitted_at: 1_724_000_000_000,
    })
}

pub fn state(checkpoint: &str) -> Message {
    Message::State(StateMessage {
        data: json!({ "checkpoint": checkpoint }),
    })
}

pub fn sync_state(checkpoint: &str) -> SyncState {
    SyncState {
        data: json!({ "checkpoint": checkpoint }),
    }
}

pub fn catalog(streams: &[(&str, SyncMode)]) -> ConfiguredCatalog {
    ConfiguredCatalog {
        streams: streams
            .iter()
            .map(|(name, sync_mode)| ConfiguredStream {
                name: (*name).to_owned(),
                namespace: "public".to_owned(),
                sync_mode: *sync_mode,
            })
            .collect(),
    }
}

pub fn sync_input(catalog: ConfiguredCatalog, state: Option<SyncState>) -> SyncInput {
    SyncInput {
        source_configuration: json!({ "host": "source" }),
        destination_configuration: json!({ "host": "destination" }),
        catalog,
        state,
    }
}

#[derive(Debug, Default)]
struct SourceInner {
    polls: VecDeque<WorkerResult<Option<Message>>>,
    endless: Option<Message>,
    started: bool,
    close_calls: usize,
    fail_close: bool,
}

/// A source that replays a scripted sequence of poll outcomes.
///
/// The source reports finished once the script is exhausted, unless it was
/// built with [`ScriptedSource::endless`], in which case it repeats the same
/// message forever.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    inner: Arc<Mutex<SourceInner>>,
}

impl ScriptedSource {
    pub fn new(polls: Vec<WorkerResult<Option<Message>>>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SourceInner {
                polls: polls.into(),
                ..Default::default()
            })),
        }
    }

    pub fn endless(message: Message) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SourceInner {
                endless: Some(message),
                ..Default::default()
            })),
        }
    }

    pub fn fail_on_close(self) -> Self {
        self.inner.lock().unwrap().fail_close = true;
        self
    }

    pub fn was_started(&self) -> bool {
        self.inner.lock().unwrap().started
    }

    pub fn close_calls(&self) -> usize {
        self.inner.lock().unwrap().close_calls
    }
}

impl Source for ScriptedSource {
    async fn start(&self, _config: SourceConfig, _workdir: &Path) -> WorkerResult<()> {
        self.inner.lock().unwrap().started = true;
        Ok(())
    }

    async fn is_finished(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.endless.is_none() && inner.polls.is_empty()
    }

    async fn attempt_read(&self) -> WorkerResult<Option<Message>> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(message) = &inner.endless {
            return Ok(Some(message.clone()));
        }
        inner.polls.pop_front().unwrap_or(Ok(None))
    }

    async fn close(&self) -> WorkerResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.close_calls += 1;
        if inner.fail_close {
            return Err(WorkerError::from((
                ErrorKind::SourceCloseFailed,
                "Scripted source close failure",
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct DestinationInner {
    config: Option<DestinationConfig>,
    accepted: Vec<Message>,
    output: VecDeque<WorkerResult<Option<Message>>>,
    end_of_input: bool,
    close_calls: usize,
    fail_accept_at: Option<usize>,
    fail_close: bool,
    never_finishes: bool,
}

/// A destination that collects accepted messages and replays a scripted
/// output stream.
///
/// The output stream reports finished once its script is exhausted, unless
/// built with [`CollectingDestination::never_finishes`], which models a
/// destination whose output stream stays open indefinitely.
#[derive(Debug, Clone, Default)]
pub struct CollectingDestination {
    inner: Arc<Mutex<DestinationInner>>,
}

impl CollectingDestination {
    pub fn new(output: Vec<WorkerResult<Option<Message>>>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(DestinationInner {
                output: output.into(),
                ..Default::default()
            })),
        }
    }

    /// Makes the nth `accept` call fail (zero-based).
    pub fn fail_accept_at(self, index: usize) -> Self {
        self.inner.lock().unwrap().fail_accept_at = Some(index);
        self
    }

    pub fn fail_on_close(self) -> Self {
        self.inner.lock().unwrap().fail_close = true;
        self
    }

    /// Keeps the output stream open even after the script is exhausted.
    pub fn never_finishes(self) -> Self {
        self.inner.lock().unwrap().never_finishes = true;
        self
    }

    pub fn accepted(&self) -> Vec<Message> {
        self.inner.lock().unwrap().accepted.clone()
    }

    pub fn received_config(&self) -> Option<DestinationConfig> {
        self.inner.lock().unwrap().config.clone()
    }

    pub fn saw_end_of_input(&self) -> bool {
        self.inner.lock().unwrap().end_of_input
    }

    pub fn close_calls(&self) -> usize {
        self.inner.lock().unwrap().close_calls
    }
}

impl Destination for CollectingDestination {
    async fn start(&self, config: DestinationConfig, _workdir: &Path) -> WorkerResult<()> {
        self.inner.lock().unwrap().config = Some(config);
        Ok(())
    }

    async fn accept(&self, message: Message) -> WorkerResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_accept_at == Some(inner.accepted.len()) {
            return Err(WorkerError::from((
                ErrorKind::DestinationError,
                "Scripted destination accept failure",
            )));
        }
        inner.accepted.push(message);
        Ok(())
    }

    async fn notify_end_of_input(&self) -> WorkerResult<()> {
        self.inner.lock().unwrap().end_of_input = true;
        Ok(())
    }

    async fn is_finished(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        !inner.never_finishes && inner.output.is_empty()
    }

    async fn attempt_read(&self) -> WorkerResult<Option<Message>> {
        let mut inner = self.inner.lock().unwrap();
        inner.output.pop_front().unwrap_or(Ok(None))
    }

    async fn close(&self) -> WorkerResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.close_calls += 1;
        if inner.fail_close {
            return Err(WorkerError::from((
                ErrorKind::DestinationCloseFailed,
                "Scripted destination close failure",
            )));
        }
        Ok(())
    }
}

/// A mapper that leaves everything untouched.
#[derive(Debug, Clone, Default)]
pub struct IdentityMapper;

impl Mapper for IdentityMapper {
    fn map_catalog(&self, catalog: ConfiguredCatalog) -> ConfiguredCatalog {
        catalog
    }

    fn map_message(&self, message: Message) -> Message {
        message
    }
}

/// A mapper that prefixes stream names, used to verify the mapped forms are
/// the ones handed to the destination.
#[derive(Debug, Clone)]
pub struct PrefixMapper {
    pub prefix: String,
}

impl Mapper for PrefixMapper {
    fn map_catalog(&self, mut catalog: ConfiguredCatalog) -> ConfiguredCatalog {
        for stream in &mut catalog.streams {
            stream.name = format!("{}{}", self.prefix, stream.name);
        }
        catalog
    }

    fn map_message(&self, mut message: Message) -> Message {
        if let Message::Record(record) = &mut message {
            record.stream = format!("{}{}", self.prefix, record.stream);
        }
        message
    }
}

/// A tracker whose counter retrievals always fail.
#[derive(Debug, Default)]
pub struct FailingTracker;

impl MessageTracker for FailingTracker {
    fn record_message(&self, _message: &Message) {}

    fn record_count(&self) -> WorkerResult<u64> {
        Err(WorkerError::from((
            ErrorKind::Unknown,
            "Scripted tracker failure",
        )))
    }

    fn bytes_count(&self) -> WorkerResult<u64> {
        Err(WorkerError::from((
            ErrorKind::Unknown,
            "Scripted tracker failure",
        )))
    }

    fn output_state(&self) -> Option<SyncState> {
        None
    }
}

pub fn change_event(key: &str, value: &str) -> ChangeEvent {
    ChangeEvent {
        key: Some(key.to_owned()),
        value: Some(value.to_owned()),
    }
}

pub fn tombstone(key: &str) -> ChangeEvent {
    ChangeEvent {
        key: Some(key.to_owned()),
        value: None,
    }
}

/// A capture engine that emits scripted events and then behaves according to
/// its [`EngineEnding`].
#[derive(Debug)]
pub struct FakeCaptureEngine {
    events: Mutex<Vec<ChangeEvent>>,
    ending: EngineEnding,
    error: Mutex<Option<WorkerError>>,
    stop_requested: AtomicBool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineEnding {
    /// Keep running until a stop is requested, then return.
    WaitForStop,
    /// Return as soon as the scripted events have been emitted.
    ReturnImmediately,
    /// Ignore stop requests entirely and never return.
    Wedge,
}

impl FakeCaptureEngine {
    pub fn emitting(events: Vec<ChangeEvent>) -> Self {
        Self {
            events: Mutex::new(events),
            ending: EngineEnding::WaitForStop,
            error: Mutex::new(None),
            stop_requested: AtomicBool::new(false),
        }
    }

    pub fn failing_with(error: WorkerError) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            ending: EngineEnding::ReturnImmediately,
            error: Mutex::new(Some(error)),
            stop_requested: AtomicBool::new(false),
        }
    }

    pub fn wedged() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            ending: EngineEnding::Wedge,
            error: Mutex::new(None),
            stop_requested: AtomicBool::new(false),
        }
    }
}

impl CaptureEngine for FakeCaptureEngine {
    fn run(&self, on_event: &(dyn Fn(ChangeEvent) + Send + Sync)) -> WorkerResult<()> {
        let events = std::mem::take(&mut *self.events.lock().unwrap());
        for event in events {
            on_event(event);
        }

        loop {
            match self.ending {
                EngineEnding::ReturnImmediately => break,
                EngineEnding::WaitForStop => {
                    if self.stop_requested.load(Ordering::SeqCst) {
                        break;
                    }
                }
                EngineEnding::Wedge => {}
            }
            std::thread::sleep(Duration::from_millis(5));
        }

        match self.error.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }
}

/// A minimal engine option set for publisher tests.
pub fn test_publisher_config() -> PublisherConfig {
    PublisherConfig {
        engine_name: "testdb".to_owned(),
        connector_class: "io.debezium.connector.postgresql.PostgresConnector".to_owned(),
        offset_storage_path: "/tmp/offsets.dat".into(),
        offset_flush_interval_ms: 1000,
        snapshot_mode: "exported".to_owned(),
        host: "localhost".to_owned(),
        port: 5432,
        username: "tester".to_owned(),
        password: None,
        database_name: "testdb".to_owned(),
        replication_slot_name: "test_slot".to_owned(),
        publication_name: "test_publication".to_owned(),
        decimal_handling_mode: "string".to_owned(),
        table_include_list: "public.users".to_owned(),
        database_include_list: "testdb".to_owned(),
        publication_autocreate_mode: "disabled".to_owned(),
    }
}
