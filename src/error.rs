//! Error handling module
//!
//! Centralized HTTP-facing error type and response conversion. Trimmed from
//! the teacher's `error.rs`: every auth/rate-limit/idempotency variant is
//! gone (Non-goals), and the domain/port errors map down to the small
//! status-code surface spec §6 actually exposes (202/400/404/500 — no 409;
//! conflicts are retried internally by the task pipeline and never reach
//! HTTP, per spec §7).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::DomainError;
use crate::ports::event_store::LoadError;
use crate::ports::read_store::ReadStoreError;
use crate::ports::task_queue::{EnqueueError, InspectError};
use crate::services::GetWalletError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl From<GetWalletError> for AppError {
    fn from(err: GetWalletError) -> Self {
        match err {
            GetWalletError::NotFound(id) => AppError::NotFound(id.to_string()),
            GetWalletError::Cache(e) => AppError::Internal(e.into()),
        }
    }
}

impl From<InspectError> for AppError {
    fn from(err: InspectError) -> Self {
        match err {
            InspectError::NotFound(id) => AppError::NotFound(id.to_string()),
            InspectError::Transport(e) => AppError::Internal(e),
        }
    }
}

impl From<EnqueueError> for AppError {
    fn from(err: EnqueueError) -> Self {
        match err {
            EnqueueError::Transport(e) => AppError::Internal(e),
        }
    }
}

impl From<ReadStoreError> for AppError {
    fn from(err: ReadStoreError) -> Self {
        match err {
            ReadStoreError::NotFound(id) => AppError::NotFound(id.to_string()),
            ReadStoreError::Transport(e) => AppError::Internal(e),
        }
    }
}

impl From<LoadError> for AppError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::Transport(e) => AppError::Internal(e),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Domain(domain_err) => match domain_err {
                DomainError::InvalidName
                | DomainError::InvalidAmount(_)
                | DomainError::InvalidTransactionType(_)
                | DomainError::InvalidWalletId(_) => {
                    (StatusCode::BAD_REQUEST, "invalid_request")
                }
                DomainError::WalletNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
                DomainError::InsufficientBalance { .. }
                | DomainError::UnsupportedEvent(_)
                | DomainError::VersionConflict { .. }
                | DomainError::Transport(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
                }
            },
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
            AppError::Config(err) => {
                tracing::error!(error = %err, "configuration error");
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error")
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
