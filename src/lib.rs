//! wallet_ledger — event-sourced wallet ledger with CQRS command/query
//! separation.
//!
//! Re-exports modules for integration testing and external use.

pub mod aggregate;
pub mod api;
pub mod cache;
pub mod domain;
pub mod jobs;
pub mod pipeline;
pub mod ports;
pub mod projection;
pub mod services;
pub mod stores;

pub mod cli;
pub mod config;
pub mod db;
pub mod error;

pub use config::Config;
pub use error::{AppError, AppResult};
