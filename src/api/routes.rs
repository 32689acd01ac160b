//! HTTP surface (spec §6): `POST /wallets`, `GET /wallets/{id}`,
//! `POST /transactions`, `GET /tasks/{id}`, plus the ambient `GET /health`
//! liveness probe grounded in the teacher's `main.rs::health_check`.
//!
//! Handlers only validate shape and enqueue/inspect tasks; they never call
//! the command services directly — per spec §4.6/§7, write requests return
//! 202 immediately and the client polls `/tasks/{id}` for completion.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{TaskId, WalletId};
use crate::error::{AppError, AppResult};
use crate::ports::event_store::EventStorePort;
use crate::ports::task_queue::{Priority, TaskQueuePort, TASK_CREATE_TRANSACTION, TASK_CREATE_WALLET};
use crate::services::{GetTaskService, GetWalletService};

pub struct AppState<E: EventStorePort, Q: TaskQueuePort> {
    pub task_queue: Arc<Q>,
    pub get_wallet: Arc<GetWalletService<E>>,
    pub get_task: Arc<GetTaskService<Q>>,
}

impl<E: EventStorePort, Q: TaskQueuePort> Clone for AppState<E, Q> {
    fn clone(&self) -> Self {
        Self {
            task_queue: self.task_queue.clone(),
            get_wallet: self.get_wallet.clone(),
            get_task: self.get_task.clone(),
        }
    }
}

impl<E: EventStorePort, Q: TaskQueuePort> AppState<E, Q> {
    pub fn new(
        task_queue: Arc<Q>,
        get_wallet: Arc<GetWalletService<E>>,
        get_task: Arc<GetTaskService<Q>>,
    ) -> Self {
        Self {
            task_queue,
            get_wallet,
            get_task,
        }
    }
}

pub fn create_router<E, Q>(state: AppState<E, Q>) -> Router
where
    E: EventStorePort + 'static,
    Q: TaskQueuePort + 'static,
{
    Router::new()
        .route("/wallets", post(create_wallet::<E, Q>))
        .route("/wallets/:id", get(get_wallet::<E, Q>))
        .route("/transactions", post(post_transaction::<E, Q>))
        .route("/tasks/:id", get(get_task::<E, Q>))
        .route("/health", get(health_check))
        .with_state(Arc::new(state))
}

async fn health_check() -> &'static str {
    "OK"
}

#[derive(Debug, Deserialize)]
struct CreateWalletBody {
    name: String,
}

#[derive(Debug, Serialize)]
struct TaskAccepted {
    id: TaskId,
}

async fn create_wallet<E, Q>(
    State(state): State<Arc<AppState<E, Q>>>,
    Json(body): Json<CreateWalletBody>,
) -> AppResult<(StatusCode, Json<TaskAccepted>)>
where
    E: EventStorePort + 'static,
    Q: TaskQueuePort + 'static,
{
    if body.name.trim().is_empty() {
        return Err(AppError::InvalidRequest("name must not be empty".into()));
    }

    let payload = json!({ "name": body.name });
    let task_id = state
        .task_queue
        .enqueue(TASK_CREATE_WALLET, payload, Priority::Default)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(TaskAccepted { id: task_id })))
}

#[derive(Debug, Serialize)]
struct WalletBody {
    id: WalletId,
    name: String,
    balance: i64,
}

async fn get_wallet<E, Q>(
    State(state): State<Arc<AppState<E, Q>>>,
    Path(id): Path<String>,
) -> AppResult<Json<WalletBody>>
where
    E: EventStorePort + 'static,
    Q: TaskQueuePort + 'static,
{
    let wallet_id =
        WalletId::parse(&id).map_err(|_| AppError::InvalidRequest("invalid wallet id".into()))?;

    let wallet = state.get_wallet.execute(wallet_id).await?;

    Ok(Json(WalletBody {
        id: wallet.id,
        name: wallet.name,
        balance: wallet.balance.get(),
    }))
}

#[derive(Debug, Deserialize)]
struct PostTransactionBody {
    transaction: String,
    wallet_id: String,
    amount: i64,
}

async fn post_transaction<E, Q>(
    State(state): State<Arc<AppState<E, Q>>>,
    Json(body): Json<PostTransactionBody>,
) -> AppResult<(StatusCode, Json<TaskAccepted>)>
where
    E: EventStorePort + 'static,
    Q: TaskQueuePort + 'static,
{
    if body.wallet_id.len() < 3 {
        return Err(AppError::InvalidRequest("wallet_id too short".into()));
    }
    WalletId::parse(&body.wallet_id)
        .map_err(|_| AppError::InvalidRequest("invalid wallet_id".into()))?;
    if body.transaction.len() < 3 {
        return Err(AppError::InvalidRequest("invalid transaction type".into()));
    }
    if body.amount == 0 {
        return Err(AppError::InvalidRequest("amount must not be zero".into()));
    }

    let payload = json!({
        "wallet_id": body.wallet_id,
        "transaction": body.transaction,
        "amount": body.amount,
    });
    let task_id = state
        .task_queue
        .enqueue(TASK_CREATE_TRANSACTION, payload, Priority::Default)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(TaskAccepted { id: task_id })))
}

#[derive(Debug, Serialize)]
struct TaskBody {
    id: TaskId,
    status: String,
}

async fn get_task<E, Q>(
    State(state): State<Arc<AppState<E, Q>>>,
    Path(id): Path<String>,
) -> AppResult<Json<TaskBody>>
where
    E: EventStorePort + 'static,
    Q: TaskQueuePort + 'static,
{
    let task_id =
        TaskId::parse(&id).map_err(|_| AppError::InvalidRequest("invalid task id".into()))?;

    let status = state.get_task.execute(task_id).await?;

    Ok(Json(TaskBody {
        id: task_id,
        status: format!("{:?}", status).to_lowercase(),
    }))
}
