//! Shared test doubles for the integration suite.
//!
//! `FakeEventStore` and `FakeTaskQueue` implement the same port traits
//! (`EventStorePort`, `TaskQueuePort`) the real Postgres/Redis adapters do,
//! so the HTTP surface and the command/task pipeline can be exercised
//! end-to-end without a live database or broker — mirroring the teacher's
//! `tests/common/mod.rs::setup_test_db`, minus the database.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::broadcast;

use wallet_ledger::domain::{StoredEvent, TaskId, WalletId};
use wallet_ledger::ports::event_store::{
    AppendError, EventAppeared, EventStorePort, LoadError, NewEvent, SubscribeError,
};
use wallet_ledger::ports::task_queue::{
    EnqueueError, HandlerOutcome, InspectError, Priority, TaskHandler, TaskQueuePort, TaskStatus,
};

#[derive(Default)]
pub struct FakeEventStore {
    events: Mutex<Vec<StoredEvent>>,
    appeared: Option<broadcast::Sender<EventAppeared>>,
}

impl FakeEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Like `new`, but `subscribe_all` delivers every future append live,
    /// for exercising the projection subscriber without Postgres LISTEN/NOTIFY.
    pub fn with_subscription() -> Self {
        let (tx, _rx) = broadcast::channel(1024);
        Self {
            events: Mutex::new(Vec::new()),
            appeared: Some(tx),
        }
    }
}

#[async_trait]
impl EventStorePort for FakeEventStore {
    async fn append(&self, events: Vec<NewEvent>) -> Result<(), AppendError> {
        let mut guard = self.events.lock().unwrap();
        for event in &events {
            let current = guard
                .iter()
                .filter(|e| e.aggregate_id == event.aggregate_id)
                .map(|e| e.version)
                .max()
                .unwrap_or(0);
            if current != event.expected_version {
                return Err(AppendError::VersionConflict {
                    aggregate_id: event.aggregate_id,
                    expected: event.expected_version,
                    found: current,
                });
            }
        }

        for event in events {
            let version = event.expected_version + 1;
            let stored = StoredEvent {
                aggregate_type: "Wallet".into(),
                aggregate_id: event.aggregate_id,
                version,
                global_sequence: guard.len() as i64 + 1,
                event_type: event.payload.event_type().to_string(),
                payload: event.payload,
                metadata: event.metadata,
                created_at: chrono::Utc::now(),
            };
            guard.push(stored.clone());
            if let Some(tx) = &self.appeared {
                let stream_id = format!("{}_{}", stored.aggregate_type, stored.aggregate_id);
                let _ = tx.send(EventAppeared { stream_id, event: stored });
            }
        }
        Ok(())
    }

    async fn load(&self, aggregate_id: WalletId, from_version: i64) -> Result<Vec<StoredEvent>, LoadError> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id && e.version > from_version)
            .cloned()
            .collect())
    }

    fn subscribe_all(&self) -> BoxStream<'static, Result<EventAppeared, SubscribeError>> {
        match &self.appeared {
            Some(tx) => {
                let rx = tx.subscribe();
                Box::pin(tokio_stream::wrappers::BroadcastStream::new(rx).filter_map(|item| async move {
                    match item {
                        Ok(event) => Some(Ok(event)),
                        Err(_lagged) => None,
                    }
                }))
            }
            None => Box::pin(futures::stream::empty()),
        }
    }
}

impl FakeEventStore {
    /// Every distinct wallet id with at least one recorded event, in the
    /// order each wallet's `WalletInitialized` was appended. Lets tests
    /// recover the id the HTTP layer never echoes back (spec §6 only
    /// returns the task id from `POST /wallets`).
    pub fn all_aggregate_ids(&self) -> Vec<WalletId> {
        let guard = self.events.lock().unwrap();
        let mut seen = Vec::new();
        for event in guard.iter() {
            if !seen.contains(&event.aggregate_id) {
                seen.push(event.aggregate_id);
            }
        }
        seen
    }
}

/// Connects to the Postgres instance the store-adapter tests run against
/// and truncates the tables those tests own, mirroring the teacher's
/// `tests/common/mod.rs::setup_test_db`. Requires a live `DATABASE_URL`
/// pointing at a database with the `events`/`wallets` schema applied.
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for store-adapter tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("failed to connect to test database");

    sqlx::query("TRUNCATE TABLE events, wallets CASCADE")
        .execute(&pool)
        .await
        .expect("failed to truncate tables before test");

    pool
}

struct FakeTask {
    kind: String,
    payload: Value,
    status: TaskStatus,
    attempts: u32,
}

#[derive(Default)]
pub struct FakeTaskQueue {
    tasks: Mutex<HashMap<TaskId, FakeTask>>,
    pending: Mutex<VecDeque<TaskId>>,
}

impl FakeTaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronously drains every pending task through `handlers`, the same
    /// kind->handler map `TaskQueuePort::run` would dispatch against.
    /// Retries a retriable outcome in place, up to 5 attempts, rather than
    /// requeuing onto a background loop — adequate for test determinism.
    pub async fn drain(&self, handlers: &HashMap<&'static str, Box<dyn TaskHandler>>) {
        loop {
            let next = self.pending.lock().unwrap().pop_front();
            let Some(task_id) = next else { break };

            let (kind, payload) = {
                let mut tasks = self.tasks.lock().unwrap();
                let task = tasks.get_mut(&task_id).unwrap();
                task.status = TaskStatus::Active;
                (task.kind.clone(), task.payload.clone())
            };

            let Some(handler) = handlers.get(kind.as_str()) else {
                self.tasks.lock().unwrap().get_mut(&task_id).unwrap().status = TaskStatus::Failed;
                continue;
            };

            loop {
                match handler.handle(payload.clone()).await {
                    HandlerOutcome::Completed => {
                        self.tasks.lock().unwrap().get_mut(&task_id).unwrap().status = TaskStatus::Completed;
                        break;
                    }
                    HandlerOutcome::SkipRetry(_) => {
                        self.tasks.lock().unwrap().get_mut(&task_id).unwrap().status = TaskStatus::Failed;
                        break;
                    }
                    HandlerOutcome::Retriable(_) => {
                        let mut tasks = self.tasks.lock().unwrap();
                        let task = tasks.get_mut(&task_id).unwrap();
                        task.attempts += 1;
                        if task.attempts >= 5 {
                            task.status = TaskStatus::Failed;
                            break;
                        }
                        task.status = TaskStatus::Retry;
                        drop(tasks);
                        continue;
                    }
                }
            }
        }
    }
}

#[async_trait]
impl TaskQueuePort for FakeTaskQueue {
    async fn enqueue(&self, kind: &str, payload: Value, _priority: Priority) -> Result<TaskId, EnqueueError> {
        let task_id = TaskId::new();
        self.tasks.lock().unwrap().insert(
            task_id,
            FakeTask {
                kind: kind.to_string(),
                payload,
                status: TaskStatus::Pending,
                attempts: 0,
            },
        );
        self.pending.lock().unwrap().push_back(task_id);
        Ok(task_id)
    }

    async fn inspect(&self, task_id: TaskId) -> Result<TaskStatus, InspectError> {
        self.tasks
            .lock()
            .unwrap()
            .get(&task_id)
            .map(|t| t.status)
            .ok_or(InspectError::NotFound(task_id))
    }

    async fn run(
        &self,
        _handlers: HashMap<&'static str, Box<dyn TaskHandler>>,
        _concurrency: usize,
        _shutdown: tokio_util::sync::CancellationToken,
    ) -> anyhow::Result<()> {
        unimplemented!("tests drive the fake queue via `drain`, not `run`")
    }
}
