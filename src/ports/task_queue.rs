//! Task Queue Port (C2).
//!
//! Grounded in `original_source/database/asynq/asynq.go`: `TaskType`
//! constants, `MaxRetry(5)`/`Timeout(20m)`/`Retention(5m)`, and the
//! weighted-priority queue configuration (`critical:6, default:3, low:1`).

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::TaskId;

pub const MAX_ATTEMPTS: u32 = 5;
pub const TASK_TIMEOUT: Duration = Duration::from_secs(20 * 60);
pub const TASK_RETENTION: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Priority {
    Critical,
    Default,
    Low,
}

impl Priority {
    pub fn weight(&self) -> u32 {
        match self {
            Priority::Critical => 6,
            Priority::Default => 3,
            Priority::Low => 1,
        }
    }

    pub fn queue_name(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::Default => "default",
            Priority::Low => "low",
        }
    }
}

/// Task kind literal strings, matching `original_source/database/asynq/asynq.go`'s
/// `TaskType` constants exactly.
pub const TASK_CREATE_WALLET: &str = "create:wallet";
pub const TASK_CREATE_TRANSACTION: &str = "create:transaction";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Active,
    Retry,
    Archived,
    Completed,
    Failed,
}

#[derive(Debug, Error)]
pub enum EnqueueError {
    #[error("task queue transport error: {0}")]
    Transport(#[source] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("task not found: {0}")]
    NotFound(TaskId),
    #[error("task queue transport error: {0}")]
    Transport(#[source] anyhow::Error),
}

/// Outcome a task handler reports back to the runner, used to decide
/// retry vs terminal skip per spec §4.6's error-kind table.
#[derive(Debug)]
pub enum HandlerOutcome {
    Completed,
    Retriable(anyhow::Error),
    SkipRetry(anyhow::Error),
}

#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, payload: Value) -> HandlerOutcome;
}

#[async_trait]
pub trait TaskQueuePort: Send + Sync {
    async fn enqueue(
        &self,
        kind: &str,
        payload: Value,
        priority: Priority,
    ) -> Result<TaskId, EnqueueError>;

    async fn inspect(&self, task_id: TaskId) -> Result<TaskStatus, InspectError>;

    /// Blocks serving tasks, dispatching each to the handler keyed by its
    /// `kind`, until `shutdown` resolves.
    async fn run(
        &self,
        handlers: HashMap<&'static str, Box<dyn TaskHandler>>,
        concurrency: usize,
        shutdown: tokio_util::sync::CancellationToken,
    ) -> anyhow::Result<()>;
}
