//! Task Pipeline (C6).
//!
//! Grounded in `original_source/database/asynq/transaction.go` and
//! `.../wallet.go`: `ProcessTask(ctx, t) error` handlers that unmarshal the
//! payload, invoke the command service, and wrap terminal errors in
//! `asynq.SkipRetry`. The error-kind → retry-vs-skip table follows spec
//! §4.6 exactly.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::DomainError;
use crate::ports::event_store::EventStorePort;
use crate::ports::task_queue::{HandlerOutcome, TaskHandler, TASK_CREATE_TRANSACTION, TASK_CREATE_WALLET};
use crate::services::{CreateWalletRequest, CreateWalletService, PostTransactionRequest, PostTransactionService};

/// Maps a command-service error to a handler outcome per spec §4.6: only
/// `VersionConflict` (an optimistic-concurrency collision the next attempt
/// may resolve) is retriable; everything else is a property of the input or
/// the domain that will never succeed on retry (`DomainError::is_terminal`).
fn map_domain_error(err: DomainError) -> HandlerOutcome {
    if err.is_terminal() {
        HandlerOutcome::SkipRetry(anyhow::anyhow!(err))
    } else {
        HandlerOutcome::Retriable(anyhow::anyhow!(err))
    }
}

pub struct CreateWalletHandler<S: EventStorePort> {
    service: Arc<CreateWalletService<S>>,
}

impl<S: EventStorePort> CreateWalletHandler<S> {
    pub fn new(service: Arc<CreateWalletService<S>>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S: EventStorePort + 'static> TaskHandler for CreateWalletHandler<S> {
    async fn handle(&self, payload: Value) -> HandlerOutcome {
        let req: CreateWalletRequest = match serde_json::from_value(payload) {
            Ok(req) => req,
            Err(err) => return HandlerOutcome::SkipRetry(err.into()),
        };

        match self.service.execute(req).await {
            Ok(_) => HandlerOutcome::Completed,
            Err(err) => map_domain_error(err),
        }
    }
}

pub struct PostTransactionHandler<S: EventStorePort> {
    service: Arc<PostTransactionService<S>>,
}

impl<S: EventStorePort> PostTransactionHandler<S> {
    pub fn new(service: Arc<PostTransactionService<S>>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S: EventStorePort + 'static> TaskHandler for PostTransactionHandler<S> {
    async fn handle(&self, payload: Value) -> HandlerOutcome {
        let req: PostTransactionRequest = match serde_json::from_value(payload) {
            Ok(req) => req,
            Err(err) => return HandlerOutcome::SkipRetry(err.into()),
        };

        match self.service.execute(req).await {
            Ok(_) => HandlerOutcome::Completed,
            Err(err) => map_domain_error(err),
        }
    }
}

/// Builds the kind → handler map `TaskQueuePort::run` dispatches against.
pub fn handler_map<S: EventStorePort + 'static>(
    create_wallet: Arc<CreateWalletService<S>>,
    post_transaction: Arc<PostTransactionService<S>>,
) -> HashMap<&'static str, Box<dyn TaskHandler>> {
    let mut handlers: HashMap<&'static str, Box<dyn TaskHandler>> = HashMap::new();
    handlers.insert(TASK_CREATE_WALLET, Box::new(CreateWalletHandler::new(create_wallet)));
    handlers.insert(
        TASK_CREATE_TRANSACTION,
        Box::new(PostTransactionHandler::new(post_transaction)),
    );
    handlers
}
