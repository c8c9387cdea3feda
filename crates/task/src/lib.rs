//! Task Store, Scheduler, and Worker: the async surface's durable record
//! of a generation request from submission through a terminal state.

pub mod model;
pub mod scheduler;
pub mod store;
pub mod worker;

pub use model::{Task, TaskStatus, TaskType};
pub use scheduler::{SchedulerConfig, TaskScheduler, DEFAULT_MAX_CONCURRENCY};
pub use store::TaskStore;
pub use worker::{ProgressSink, TaskRunner};

#[cfg(test)]
pub use worker::MockTaskRunner;
