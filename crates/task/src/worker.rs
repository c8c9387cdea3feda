//! Per-task execution: invokes the registered [`TaskRunner`] for the
//! task's type, forwards progress into the store, and always lands the
//! task in a terminal state on exit — mirroring the `mpsc`-driven worker
//! loop in `other_examples/862e7509_proerror77-Nova__...job_queue.rs.rs`,
//! adapted to one spawned future per task rather than a shared channel.

use crate::model::Task;
use crate::store::TaskStore;
use async_trait::async_trait;
use gateway_gax::GatewayError;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Reports progress for a single in-flight task back into the store.
#[derive(Clone)]
pub struct ProgressSink {
    store: Arc<TaskStore>,
    task_id: String,
}

impl ProgressSink {
    /// Builds a sink for `task_id` directly, for callers (such as a
    /// `TaskRunner` impl's own tests) that want to invoke `run` without
    /// going through [`run_task`].
    pub fn for_task(store: Arc<TaskStore>, task_id: String) -> Self {
        Self { store, task_id }
    }

    pub fn report(&self, percent: u8) {
        let store = Arc::clone(&self.store);
        let task_id = self.task_id.clone();
        tokio::spawn(async move {
            store.update_progress(&task_id, percent).await;
        });
    }
}

/// The Generation Controller's entry point, as seen by the task engine.
/// Implemented once per generation kind and registered with the
/// scheduler under its [`crate::model::TaskType`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRunner: Send + Sync {
    async fn run(
        &self,
        task: Task,
        progress: ProgressSink,
        cancel: CancellationToken,
    ) -> Result<serde_json::Value, GatewayError>;
}

/// Runs `runner` against `task`, then always transitions the task to a
/// terminal state and frees its concurrency slot (the caller holds that
/// slot's permit and drops it when this future completes).
pub async fn run_task(store: Arc<TaskStore>, runner: Arc<dyn TaskRunner>, task: Task, cancel: CancellationToken) {
    let task_id = task.id.clone();
    let progress = ProgressSink {
        store: Arc::clone(&store),
        task_id: task_id.clone(),
    };

    info!(task_id = %task_id, ?task.task_type, "task started");
    let outcome = runner.run(task, progress, cancel.clone()).await;

    let result = match outcome {
        Ok(value) => store.complete(&task_id, value).await,
        Err(GatewayError::Cancelled) => store.cancel(&task_id).await,
        Err(err) => {
            error!(task_id = %task_id, error = %err, "task failed");
            store.fail(&task_id, err.to_string()).await
        }
    };

    if let Err(err) = result {
        // The task raced a client-initiated cancel or timeout and already
        // reached a terminal state; that's expected, not a bug.
        info!(task_id = %task_id, error = %err, "terminal transition skipped, already terminal");
    }
}
