//! API module: router assembly and the ambient HTTP middleware stack.

pub mod middleware;
pub mod routes;

use axum::middleware::from_fn;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub use routes::AppState;

use crate::ports::event_store::EventStorePort;
use crate::ports::task_queue::TaskQueuePort;

/// Builds the full axum `Router`, wrapping the route table in the
/// request-logging middleware and `tower_http`'s trace layer, matching the
/// teacher's `main.rs::build_router` layering order.
pub fn build_router<E, Q>(state: AppState<E, Q>) -> axum::Router
where
    E: EventStorePort + 'static,
    Q: TaskQueuePort + 'static,
{
    routes::create_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(from_fn(middleware::logging_middleware)),
    )
}
