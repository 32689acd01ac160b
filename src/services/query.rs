//! Query services (C9): `GetWalletService`, `GetTaskService`.
//!
//! Grounded in `original_source/wallet.go`'s `GetWallet` and the teacher's
//! read-side handler shape. `GetWalletService` reads through the cache
//! (C8) rather than the read store directly, matching spec §4.9's "via C8."

use std::sync::Arc;

use thiserror::Error;

use crate::cache::{CacheError, WalletCache};
use crate::domain::{TaskId, Wallet, WalletId};
use crate::ports::event_store::EventStorePort;
use crate::ports::task_queue::{InspectError, TaskQueuePort, TaskStatus};

#[derive(Debug, Error)]
pub enum GetWalletError {
    #[error("wallet not found: {0}")]
    NotFound(WalletId),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

pub struct GetWalletService<S: EventStorePort> {
    cache: Arc<WalletCache<S>>,
}

impl<S: EventStorePort> GetWalletService<S> {
    pub fn new(cache: Arc<WalletCache<S>>) -> Self {
        Self { cache }
    }

    pub async fn execute(&self, id: WalletId) -> Result<Wallet, GetWalletError> {
        let aggregate = self.cache.get(id).await?;
        aggregate
            .wallet()
            .cloned()
            .ok_or(GetWalletError::NotFound(id))
    }
}

pub struct GetTaskService<Q: TaskQueuePort> {
    task_queue: Arc<Q>,
}

impl<Q: TaskQueuePort> GetTaskService<Q> {
    pub fn new(task_queue: Arc<Q>) -> Self {
        Self { task_queue }
    }

    pub async fn execute(&self, id: TaskId) -> Result<TaskStatus, InspectError> {
        self.task_queue.inspect(id).await
    }
}
