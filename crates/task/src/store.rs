//! The task registry: an in-memory map guarded by a single `Mutex`,
//! the same whole-table locking tradeoff `gateway_quota::QuotaLedger`
//! makes (spec §5) — task counts never grow large enough for sharding
//! to pay for its own complexity.

use crate::model::{Task, TaskStatus, TaskType};
use gateway_gax::GatewayError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct Entry {
    task: Task,
    timeout_handle: Option<JoinHandle<()>>,
    /// Fired by [`TaskStore::finish`] on every terminal transition —
    /// client-initiated cancel, an expired [`TaskStore::arm_timeout`]
    /// watchdog, or normal completion/failure — so whichever worker is
    /// driving this task's Smart Poller observes it at the next poll
    /// boundary (spec §4.6/§5) instead of only ever seeing the process's
    /// global shutdown signal.
    cancel: CancellationToken,
}

impl Entry {
    fn clear_timeout(&mut self) {
        if let Some(handle) = self.timeout_handle.take() {
            handle.abort();
        }
    }
}

/// Registry of every task the gateway has accepted, from submission
/// through a 24h reap of its terminal record (spec §4.6).
pub struct TaskStore {
    state: Mutex<HashMap<String, Entry>>,
}

impl TaskStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(HashMap::new()),
        })
    }

    pub async fn create(
        &self,
        task_type: TaskType,
        params: serde_json::Value,
        priority: i32,
        owner: Option<String>,
    ) -> Task {
        let id = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now();
        let task = Task::new(id.clone(), task_type, params, priority, owner, now);
        let mut state = self.state.lock().await;
        state.insert(
            id,
            Entry {
                task: task.clone(),
                timeout_handle: None,
                cancel: CancellationToken::new(),
            },
        );
        task
    }

    /// The token a worker should poll/select against for this task, so a
    /// client cancel or timeout reaches it mid-run. `None` once the task
    /// has been deleted.
    pub async fn cancel_token(&self, id: &str) -> Option<CancellationToken> {
        self.state.lock().await.get(id).map(|e| e.cancel.clone())
    }

    pub async fn get(&self, id: &str) -> Option<Task> {
        self.state.lock().await.get(id).map(|e| e.task.clone())
    }

    pub async fn list(&self, owner: Option<&str>, status: Option<TaskStatus>, limit: usize) -> Vec<Task> {
        let state = self.state.lock().await;
        let mut tasks: Vec<Task> = state
            .values()
            .map(|e| e.task.clone())
            .filter(|t| owner.map_or(true, |o| t.owner.as_deref() == Some(o)))
            .filter(|t| status.map_or(true, |s| t.status == s))
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks.truncate(limit);
        tasks
    }

    /// Tasks still awaiting a worker slot, priority-first then FIFO
    /// within a priority band — the order the scheduler admits from.
    pub async fn pending(&self) -> Vec<Task> {
        let state = self.state.lock().await;
        let mut tasks: Vec<Task> = state
            .values()
            .map(|e| e.task.clone())
            .filter(|t| t.status == TaskStatus::Pending)
            .collect();
        tasks.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.created_at.cmp(&b.created_at)));
        tasks
    }

    pub async fn stats(&self) -> HashMap<TaskStatus, usize> {
        let state = self.state.lock().await;
        let mut counts = HashMap::new();
        for entry in state.values() {
            *counts.entry(entry.task.status).or_insert(0) += 1;
        }
        counts
    }

    /// Moves a pending task into `running`, stamping `started_at`. Fails
    /// if the task is missing or no longer pending (a racing cancel).
    pub async fn start(&self, id: &str) -> Result<Task, GatewayError> {
        let mut state = self.state.lock().await;
        let entry = state.get_mut(id).ok_or_else(|| GatewayError::TaskNotFound(id.to_string()))?;
        if !entry.task.status.can_transition_to(TaskStatus::Running) {
            return Err(GatewayError::TaskCancelFailed {
                task_id: id.to_string(),
                reason: format!("cannot start task in state {:?}", entry.task.status),
            });
        }
        let now = chrono::Utc::now();
        entry.task.status = TaskStatus::Running;
        entry.task.started_at = Some(now);
        entry.task.updated_at = now;
        Ok(entry.task.clone())
    }

    /// Updates progress for a running task. Silently ignored (not an
    /// error) for a task that has already left `running`, since a
    /// straggling progress callback racing a cancel/timeout is expected.
    pub async fn update_progress(&self, id: &str, progress: u8) {
        let mut state = self.state.lock().await;
        if let Some(entry) = state.get_mut(id) {
            if entry.task.status == TaskStatus::Running && progress > entry.task.progress {
                entry.task.progress = progress;
                entry.task.updated_at = chrono::Utc::now();
            }
        }
    }

    pub async fn complete(&self, id: &str, result: serde_json::Value) -> Result<Task, GatewayError> {
        self.finish(id, TaskStatus::Completed, Some(result), None).await
    }

    pub async fn fail(&self, id: &str, error: String) -> Result<Task, GatewayError> {
        self.finish(id, TaskStatus::Failed, None, Some(error)).await
    }

    /// Client-facing cancel: valid from `pending` or `running`, a no-op
    /// error if the task is already terminal.
    pub async fn cancel(&self, id: &str) -> Result<Task, GatewayError> {
        self.finish(id, TaskStatus::Cancelled, None, None).await
    }

    async fn finish(
        &self,
        id: &str,
        next: TaskStatus,
        result: Option<serde_json::Value>,
        error: Option<String>,
    ) -> Result<Task, GatewayError> {
        let mut state = self.state.lock().await;
        let entry = state.get_mut(id).ok_or_else(|| GatewayError::TaskNotFound(id.to_string()))?;
        if !entry.task.status.can_transition_to(next) {
            return Err(GatewayError::TaskCancelFailed {
                task_id: id.to_string(),
                reason: format!("cannot move from {:?} to {next:?}", entry.task.status),
            });
        }
        entry.clear_timeout();
        // Fire the per-task token on every terminal transition, not just
        // `cancel()`: a timeout watchdog racing a still-polling worker must
        // stop that worker just as promptly, or it keeps its concurrency
        // permit until the upstream call eventually returns on its own.
        entry.cancel.cancel();
        let now = chrono::Utc::now();
        entry.task.status = next;
        entry.task.completed_at = Some(now);
        entry.task.updated_at = now;
        entry.task.result = result;
        entry.task.error = error;
        if next == TaskStatus::Completed {
            entry.task.progress = 100;
        }
        Ok(entry.task.clone())
    }

    pub async fn delete(&self, id: &str) -> Result<(), GatewayError> {
        let mut state = self.state.lock().await;
        let entry = state.get(id).ok_or_else(|| GatewayError::TaskNotFound(id.to_string()))?;
        if !entry.task.status.is_terminal() {
            return Err(GatewayError::TaskDeleteFailed {
                task_id: id.to_string(),
                reason: format!("task is still {:?}", entry.task.status),
            });
        }
        if let Some(mut entry) = state.remove(id) {
            entry.clear_timeout();
        }
        Ok(())
    }

    /// Arms a watchdog that fails the task if it is still non-terminal
    /// once `duration` elapses. Cleared automatically by any terminal
    /// transition that beats it (spec §4.7's per-type timeout).
    pub async fn arm_timeout(self: &Arc<Self>, id: &str, duration: Duration) {
        let store = Arc::clone(self);
        let id_owned = id.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = store.fail(&id_owned, "task timed out".to_string()).await;
        });
        let mut state = self.state.lock().await;
        match state.get_mut(id) {
            Some(entry) => {
                entry.clear_timeout();
                entry.timeout_handle = Some(handle);
            }
            None => handle.abort(),
        }
    }

    /// Drops terminal tasks whose `completed_at` is older than
    /// `retention` (spec §4.6's 24h default reap window).
    pub async fn reap(&self, retention: Duration) -> usize {
        let cutoff = chrono::Utc::now()
            - chrono::Duration::from_std(retention).unwrap_or(chrono::Duration::hours(24));
        let mut state = self.state.lock().await;
        let expired: Vec<String> = state
            .iter()
            .filter(|(_, e)| e.task.status.is_terminal() && e.task.completed_at.is_some_and(|t| t < cutoff))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &expired {
            if let Some(mut entry) = state.remove(id) {
                entry.clear_timeout();
            }
        }
        expired.len()
    }
}
