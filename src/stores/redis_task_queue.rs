//! Redis-backed `TaskQueuePort`.
//!
//! Grounded in `original_source/database/asynq/asynq.go`: task kinds are
//! literal strings (`TaskCreateWallet`/`TaskCreateTransaction`), tasks carry
//! `MaxRetry(5)`/`Timeout(20m)`/`Retention(5m)`, and `GetTask` maps a
//! not-found lookup to `ledger.ErrEntryNotFound`. There is no real `asynq`
//! crate for Rust, so the queue itself is hand-rolled on top of `redis`'s
//! list/hash primitives: one Redis list per priority tier (weighted by
//! `Priority::weight`), and a hash of task metadata keyed by task id for
//! `inspect`. Weighting is implemented as "poll `critical` up to 6 times,
//! `default` up to 3, `low` up to 1 per cycle before sleeping," which
//! approximates asynq's weighted round-robin without requiring a second
//! dependency.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::Value;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::domain::TaskId;
use crate::ports::task_queue::{
    EnqueueError, HandlerOutcome, InspectError, Priority, TaskHandler, TaskQueuePort, TaskStatus,
    MAX_ATTEMPTS, TASK_RETENTION,
};

#[derive(Clone)]
pub struct RedisTaskQueue {
    conn: ConnectionManager,
}

impl RedisTaskQueue {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    fn queue_key(priority: Priority) -> String {
        format!("tasks:queue:{}", priority.queue_name())
    }

    fn meta_key(task_id: TaskId) -> String {
        format!("tasks:meta:{}", task_id)
    }

    fn status_str(status: TaskStatus) -> &'static str {
        match status {
            TaskStatus::Pending => "pending",
            TaskStatus::Active => "active",
            TaskStatus::Retry => "retry",
            TaskStatus::Archived => "archived",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    fn status_from_str(s: &str) -> TaskStatus {
        match s {
            "active" => TaskStatus::Active,
            "retry" => TaskStatus::Retry,
            "archived" => TaskStatus::Archived,
            "completed" => TaskStatus::Completed,
            "failed" => TaskStatus::Failed,
            _ => TaskStatus::Pending,
        }
    }

    async fn set_status(&self, task_id: TaskId, status: TaskStatus) -> anyhow::Result<()> {
        let mut conn = self.conn.clone();
        conn.hset::<_, _, _, ()>(Self::meta_key(task_id), "status", Self::status_str(status))
            .await?;
        if matches!(status, TaskStatus::Archived | TaskStatus::Completed | TaskStatus::Failed) {
            conn.expire::<_, ()>(Self::meta_key(task_id), TASK_RETENTION.as_secs() as i64)
                .await?;
        }
        Ok(())
    }

    /// Pops the next envelope honoring the priority weighting: poll
    /// `critical` up to its weight times, then `default`, then `low`,
    /// before sleeping if every tier was empty.
    async fn dequeue_one(conn: &mut ConnectionManager) -> anyhow::Result<Option<Envelope>> {
        for priority in [Priority::Critical, Priority::Default, Priority::Low] {
            for _ in 0..priority.weight() {
                let popped: Option<String> = conn.lpop(Self::queue_key(priority), None).await?;
                if let Some(serialized) = popped {
                    let envelope: Envelope = serde_json::from_str(&serialized)?;
                    return Ok(Some(envelope));
                }
            }
        }
        Ok(None)
    }
}

#[derive(serde::Serialize, serde::Deserialize, Clone)]
struct Envelope {
    id: TaskId,
    kind: String,
    payload: Value,
    attempts: u32,
}

#[async_trait]
impl TaskQueuePort for RedisTaskQueue {
    async fn enqueue(
        &self,
        kind: &str,
        payload: Value,
        priority: Priority,
    ) -> Result<TaskId, EnqueueError> {
        let mut conn = self.conn.clone();
        let task_id = TaskId::new();
        let envelope = Envelope {
            id: task_id,
            kind: kind.to_string(),
            payload,
            attempts: 0,
        };
        let serialized =
            serde_json::to_string(&envelope).map_err(|e| EnqueueError::Transport(e.into()))?;

        conn.rpush::<_, _, ()>(Self::queue_key(priority), &serialized)
            .await
            .map_err(|e| EnqueueError::Transport(e.into()))?;

        conn.hset::<_, _, _, ()>(
            Self::meta_key(task_id),
            "status",
            Self::status_str(TaskStatus::Pending),
        )
        .await
        .map_err(|e| EnqueueError::Transport(e.into()))?;

        tracing::info!(task_id = %task_id, kind, "enqueued task");
        Ok(task_id)
    }

    async fn inspect(&self, task_id: TaskId) -> Result<TaskStatus, InspectError> {
        let mut conn = self.conn.clone();
        let status: Option<String> = conn
            .hget(Self::meta_key(task_id), "status")
            .await
            .map_err(|e| InspectError::Transport(e.into()))?;

        status
            .map(|s| Self::status_from_str(&s))
            .ok_or(InspectError::NotFound(task_id))
    }

    async fn run(
        &self,
        handlers: HashMap<&'static str, Box<dyn TaskHandler>>,
        concurrency: usize,
        shutdown: CancellationToken,
    ) -> anyhow::Result<()> {
        let handlers = std::sync::Arc::new(handlers);
        let mut join_set = tokio::task::JoinSet::new();

        for _ in 0..concurrency.max(1) {
            let queue = self.clone();
            let handlers = handlers.clone();
            let shutdown = shutdown.clone();
            join_set.spawn(async move { queue.worker_loop(handlers, shutdown).await });
        }

        while let Some(res) = join_set.join_next().await {
            res??;
        }

        Ok(())
    }
}

impl RedisTaskQueue {
    async fn worker_loop(
        &self,
        handlers: std::sync::Arc<HashMap<&'static str, Box<dyn TaskHandler>>>,
        shutdown: CancellationToken,
    ) -> anyhow::Result<()> {
        let mut conn = self.conn.clone();

        loop {
            if shutdown.is_cancelled() {
                return Ok(());
            }

            let envelope = match Self::dequeue_one(&mut conn).await {
                Ok(Some(e)) => e,
                Ok(None) => {
                    tokio::select! {
                        _ = tokio::time::sleep(Duration::from_millis(100)) => continue,
                        _ = shutdown.cancelled() => return Ok(()),
                    }
                }
                Err(err) => {
                    tracing::error!(error = %err, "task queue transport error, backing off");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };

            self.set_status(envelope.id, TaskStatus::Active).await?;

            let Some(handler) = handlers.get(envelope.kind.as_str()) else {
                tracing::error!(kind = %envelope.kind, "no handler registered for task kind");
                self.set_status(envelope.id, TaskStatus::Failed).await?;
                continue;
            };

            let outcome = tokio::time::timeout(
                crate::ports::task_queue::TASK_TIMEOUT,
                handler.handle(envelope.payload.clone()),
            )
            .await;

            match outcome {
                Ok(HandlerOutcome::Completed) => {
                    self.set_status(envelope.id, TaskStatus::Completed).await?;
                }
                Ok(HandlerOutcome::SkipRetry(err)) => {
                    tracing::warn!(task_id = %envelope.id, error = %err, "task failed, not retriable");
                    self.set_status(envelope.id, TaskStatus::Failed).await?;
                }
                Ok(HandlerOutcome::Retriable(err)) => {
                    self.requeue_or_fail(envelope, err).await?;
                }
                Err(_elapsed) => {
                    self.requeue_or_fail(
                        envelope,
                        anyhow::anyhow!("task exceeded {:?} timeout", crate::ports::task_queue::TASK_TIMEOUT),
                    )
                    .await?;
                }
            }
        }
    }

    async fn requeue_or_fail(&self, mut envelope: Envelope, err: anyhow::Error) -> anyhow::Result<()> {
        envelope.attempts += 1;
        if max_attempts_reached(envelope.attempts) {
            tracing::error!(task_id = %envelope.id, attempts = envelope.attempts, error = %err, "max attempts exceeded, failing task");
            self.set_status(envelope.id, TaskStatus::Failed).await?;
            return Ok(());
        }

        tracing::warn!(task_id = %envelope.id, attempts = envelope.attempts, error = %err, "retriable error, requeuing");
        self.set_status(envelope.id, TaskStatus::Retry).await?;

        let serialized = serde_json::to_string(&envelope)?;
        let mut conn = self.conn.clone();
        conn.rpush::<_, _, ()>(Self::queue_key(Priority::Default), &serialized)
            .await?;
        Ok(())
    }
}

pub fn max_attempts_reached(attempts: u32) -> bool {
    attempts >= MAX_ATTEMPTS
}
