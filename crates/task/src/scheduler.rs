//! The 1s tick loop that admits pending tasks onto workers, capped at a
//! global concurrency limit. Grounded on the budget-guard/slot-release
//! pattern from the teacher's retrieval pack (`BudgetGuard` in
//! `other_examples/20ee67b3_zakkums-Debian-Download-Manager__...execute.rs.rs`)
//! but simplified to a counting semaphore since tasks don't share a
//! reservation size.

use crate::model::TaskType;
use crate::store::TaskStore;
use crate::worker::{run_task, TaskRunner};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const TICK_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;
const DEFAULT_REAP_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

pub struct SchedulerConfig {
    pub max_concurrency: usize,
    pub reap_retention: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            reap_retention: DEFAULT_REAP_RETENTION,
        }
    }
}

/// Drives admission: every tick, pulls as many pending tasks (priority
/// order) as there are free slots and spawns a worker for each. Runs
/// until `cancel` fires.
pub struct TaskScheduler {
    store: Arc<TaskStore>,
    runners: HashMap<TaskType, Arc<dyn TaskRunner>>,
    config: SchedulerConfig,
    permits: Arc<Semaphore>,
}

impl TaskScheduler {
    pub fn new(
        store: Arc<TaskStore>,
        runners: HashMap<TaskType, Arc<dyn TaskRunner>>,
        config: SchedulerConfig,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrency));
        Self {
            store,
            runners,
            config,
            permits,
        }
    }

    pub async fn run(&self, cancel: CancellationToken) {
        let mut reap_countdown = 60u32;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("task scheduler stopping");
                    return;
                }
                _ = tokio::time::sleep(TICK_INTERVAL) => {}
            }
            self.admit().await;

            reap_countdown = reap_countdown.saturating_sub(1);
            if reap_countdown == 0 {
                let removed = self.store.reap(self.config.reap_retention).await;
                if removed > 0 {
                    debug!(removed, "reaped expired terminal tasks");
                }
                reap_countdown = 60;
            }
        }
    }

    async fn admit(&self) {
        let pending = self.store.pending().await;
        for task in pending {
            let Ok(permit) = Arc::clone(&self.permits).try_acquire_owned() else {
                break;
            };
            let Some(runner) = self.runners.get(&task.task_type).cloned() else {
                warn!(task_id = %task.id, ?task.task_type, "no runner registered for task type");
                let _ = self.store.fail(&task.id, "no runner registered for this task type".into()).await;
                drop(permit);
                continue;
            };
            if self.store.start(&task.id).await.is_err() {
                // Lost a race (e.g. a client cancelled between `pending()`
                // and here); release the slot and move on.
                drop(permit);
                continue;
            }
            self.store
                .arm_timeout(&task.id, task.task_type.default_timeout())
                .await;
            // The task's own token, not the scheduler's shutdown token: a
            // client cancel or the timeout watchdog armed just above must
            // reach this worker's Smart Poller directly (spec §4.4/§5).
            let cancel = self
                .store
                .cancel_token(&task.id)
                .await
                .unwrap_or_else(CancellationToken::new);
            let store = Arc::clone(&self.store);
            tokio::spawn(async move {
                let _permit = permit;
                run_task(store, runner, task, cancel).await;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::MockTaskRunner;
    use gateway_gax::GatewayError;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn admits_up_to_the_concurrency_cap() {
        let store = TaskStore::new();
        for _ in 0..3 {
            store
                .create(TaskType::ImageGeneration, json!({}), 0, None)
                .await;
        }
        let mut mock = MockTaskRunner::new();
        mock.expect_run()
            .returning(|_task, _progress, _cancel| Box::pin(async { Ok(json!({"ok": true})) }));
        let mut runners: HashMap<TaskType, Arc<dyn TaskRunner>> = HashMap::new();
        runners.insert(TaskType::ImageGeneration, Arc::new(mock));

        let scheduler = TaskScheduler::new(
            Arc::clone(&store),
            runners,
            SchedulerConfig {
                max_concurrency: 2,
                reap_retention: DEFAULT_REAP_RETENTION,
            },
        );
        scheduler.admit().await;
        tokio::task::yield_now().await;

        let stats = store.stats().await;
        let running_or_done = stats.get(&crate::model::TaskStatus::Running).copied().unwrap_or(0)
            + stats.get(&crate::model::TaskStatus::Completed).copied().unwrap_or(0);
        assert_eq!(running_or_done, 2);
        assert_eq!(store.pending().await.len(), 1);
    }

    #[tokio::test]
    async fn a_task_type_with_no_runner_fails_immediately() {
        let store = TaskStore::new();
        let task = store
            .create(TaskType::VideoGeneration, json!({}), 0, None)
            .await;
        let runners: HashMap<TaskType, Arc<dyn TaskRunner>> = HashMap::new();
        let scheduler = TaskScheduler::new(Arc::clone(&store), runners, SchedulerConfig::default());
        scheduler.admit().await;
        let task = store.get(&task.id).await.unwrap();
        assert_eq!(task.status, crate::model::TaskStatus::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_a_running_task_stops_its_worker_and_frees_the_slot() {
        let store = TaskStore::new();
        store
            .create(TaskType::ImageGeneration, json!({}), 0, None)
            .await;

        let mut mock = MockTaskRunner::new();
        mock.expect_run().returning(|_task, _progress, cancel| {
            Box::pin(async move {
                cancel.cancelled().await;
                Err(GatewayError::Cancelled)
            })
        });
        let mut runners: HashMap<TaskType, Arc<dyn TaskRunner>> = HashMap::new();
        runners.insert(TaskType::ImageGeneration, Arc::new(mock));

        let scheduler = Arc::new(TaskScheduler::new(
            Arc::clone(&store),
            runners,
            SchedulerConfig {
                max_concurrency: 1,
                reap_retention: DEFAULT_REAP_RETENTION,
            },
        ));
        scheduler.admit().await;
        tokio::task::yield_now().await;
        assert_eq!(scheduler.permits.available_permits(), 0);

        let running_task = store
            .list(None, Some(crate::model::TaskStatus::Running), 1)
            .await
            .pop()
            .unwrap();
        store.cancel(&running_task.id).await.unwrap();
        tokio::task::yield_now().await;

        let done = store.get(&running_task.id).await.unwrap();
        assert_eq!(done.status, crate::model::TaskStatus::Cancelled);
        assert_eq!(scheduler.permits.available_permits(), 1);
    }
}
