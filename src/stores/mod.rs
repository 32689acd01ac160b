//! Concrete port adapters. Everything in this module is infrastructure: the
//! core (`aggregate`, `services`, `pipeline`, `projection`, `cache`) never
//! imports from here directly, only through the `ports` trait objects
//! constructed in `main.rs`.

pub mod postgres_event_store;
pub mod postgres_read_store;
pub mod redis_task_queue;

pub use postgres_event_store::PostgresEventStore;
pub use postgres_read_store::PostgresReadStore;
pub use redis_task_queue::RedisTaskQueue;
