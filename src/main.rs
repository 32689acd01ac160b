//! wallet_ledger - Event-Sourced Wallet Ledger with CQRS
//!
//! Wires the command/query services, the Postgres/Redis adapters, the task
//! worker pool (C6), the projection subscriber (C7), and the cache purge
//! scheduler (C8) into one process, fronted by an axum HTTP surface.

use std::sync::Arc;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wallet_ledger::api::{build_router, AppState};
use wallet_ledger::cache::WalletCache;
use wallet_ledger::cli::Cli;
use wallet_ledger::jobs::JobScheduler;
use wallet_ledger::pipeline;
use wallet_ledger::ports::task_queue::TaskQueuePort;
use wallet_ledger::projection::ProjectionSubscriber;
use wallet_ledger::services::{CreateWalletService, GetTaskService, GetWalletService, PostTransactionService};
use wallet_ledger::stores::{PostgresEventStore, PostgresReadStore, RedisTaskQueue};
use wallet_ledger::{db, Config};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wallet_ledger=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing();

    let profiler_guard = cli
        .cpuprofile
        .is_some()
        .then(|| pprof::ProfilerGuardBuilder::default().frequency(100).build())
        .transpose()?;

    let config = Config::load(cli.config.as_deref())?;

    tracing::info!("starting wallet_ledger server");

    let postgres_pool = PgPoolOptions::new()
        .max_connections(config.postgres_max_connections)
        .connect(&config.postgres_url)
        .await?;

    if !db::check_schema(&postgres_pool).await? {
        tracing::error!("database schema is not complete; run migrations first");
        return Err(anyhow::anyhow!("database schema incomplete"));
    }
    db::verify_connection(&postgres_pool).await?;

    let eventstore_shares_pool = config.eventstore_url == config.postgres_url;
    let eventstore_pool = if eventstore_shares_pool {
        postgres_pool.clone()
    } else {
        PgPoolOptions::new().connect(&config.eventstore_url).await?
    };

    let redis_client = redis::Client::open(config.redis_url.clone())?;
    let redis_conn = redis_client.get_connection_manager().await?;

    let event_store = Arc::new(PostgresEventStore::new(eventstore_pool.clone()));
    let read_store = Arc::new(PostgresReadStore::new(postgres_pool.clone()));
    let task_queue = Arc::new(RedisTaskQueue::new(redis_conn));

    let cache = Arc::new(WalletCache::new(event_store.clone()));

    let create_wallet_service = Arc::new(CreateWalletService::new(event_store.clone()));
    let post_transaction_service = Arc::new(PostTransactionService::new(event_store.clone()));
    let get_wallet_service = Arc::new(GetWalletService::new(cache.clone()));
    let get_task_service = Arc::new(GetTaskService::new(task_queue.clone()));

    let shutdown = CancellationToken::new();

    let job_scheduler = JobScheduler::new(cache.clone());
    let jobs_handle = job_scheduler.start(shutdown.clone());

    let projection_subscriber = Arc::new(ProjectionSubscriber::<PostgresEventStore, PostgresReadStore>::new(
        event_store.clone(),
        read_store.clone(),
        postgres_pool.clone(),
    ));
    let projection_handle = {
        let subscriber = projection_subscriber.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            subscriber.run(shutdown).await;
        })
    };

    let handlers = pipeline::handler_map(create_wallet_service.clone(), post_transaction_service.clone());
    let worker_handle = {
        let task_queue = task_queue.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move { task_queue.run(handlers, 10, shutdown).await })
    };

    let state: AppState<PostgresEventStore, RedisTaskQueue> =
        AppState::new(task_queue.clone(), get_wallet_service, get_task_service);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.http_address).await?;
    tracing::info!(address = %config.http_address, "listening");

    const HTTP_SHUTDOWN_GRACE: std::time::Duration = std::time::Duration::from_secs(5);
    let http_shutdown = shutdown.clone();
    let serve_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(http_shutdown.cancelled_owned())
            .await
    });

    shutdown_signal(shutdown.clone()).await;
    tracing::info!("server shutting down");

    match tokio::time::timeout(HTTP_SHUTDOWN_GRACE, serve_handle).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(err))) => tracing::error!(error = %err, "http server exited with an error"),
        Ok(Err(err)) => tracing::error!(error = %err, "http server task panicked"),
        Err(_elapsed) => tracing::warn!(
            grace_period = ?HTTP_SHUTDOWN_GRACE,
            "http server did not finish draining within its grace period, proceeding with shutdown"
        ),
    }
    shutdown.cancel();

    let _ = jobs_handle.await;
    let _ = projection_handle.await;
    match worker_handle.await {
        Ok(Err(err)) => tracing::error!(error = %err, "worker pool exited with an error"),
        Err(err) => tracing::error!(error = %err, "worker pool task panicked"),
        Ok(Ok(())) => {}
    }

    postgres_pool.close().await;
    if !eventstore_shares_pool {
        eventstore_pool.close().await;
    }

    if let (Some(guard), Some(path)) = (profiler_guard, cli.cpuprofile) {
        if let Ok(report) = guard.report().build() {
            let file = std::fs::File::create(&path)?;
            report.flamegraph(file)?;
            tracing::info!(path = %path.display(), "wrote cpu profile flamegraph");
        }
    }

    tracing::info!("goodbye");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received ctrl-c, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("received sigterm, initiating graceful shutdown");
        },
    }

    shutdown.cancel();
}
