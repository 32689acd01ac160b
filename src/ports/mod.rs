//! Port traits (capability interfaces) the core is written against.
//!
//! Grounded in `examples/other_examples/7ab14214_..._repository.rs.rs` and
//! `...event-store.rs.rs` (get-eventually-rs's `async_trait`
//! `Getter`/`Saver`/`Streamer`/`Appender` pattern): the core modules
//! (`aggregate`, `services`, `pipeline`, `projection`, `cache`) depend only
//! on these traits, never on `sqlx`/`redis` directly. Concrete adapters
//! live under `crate::stores`.

pub mod event_store;
pub mod read_store;
pub mod task_queue;

pub use event_store::{AppendError, EventAppeared, EventStorePort, LoadError, SubscribeError};
pub use read_store::{ReadStoreError, ReadStorePort};
pub use task_queue::{InspectError, TaskQueuePort, TaskStatus};
