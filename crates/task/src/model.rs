//! Task model: the unit of work the async surface (`/v1/tasks`) tracks
//! from submission through terminal state.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    ImageGeneration,
    ImageComposition,
    VideoGeneration,
}

impl TaskType {
    /// The per-type timeout the scheduler arms when a task starts running
    /// (spec §4.7): images budget less wall-clock than video.
    pub fn default_timeout(self) -> std::time::Duration {
        match self {
            TaskType::ImageGeneration | TaskType::ImageComposition => {
                std::time::Duration::from_secs(15 * 60)
            }
            TaskType::VideoGeneration => std::time::Duration::from_secs(30 * 60),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[allow(clippy::enum_variant_names)]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    /// The transition table from spec §4.6: `pending` may move to
    /// `running` or be cancelled (or time out into `failed` before ever
    /// running); `running` may complete, fail, or be cancelled; terminal
    /// states never move again.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Pending, Running) | (Pending, Cancelled) | (Pending, Failed)
        ) || matches!((self, next), (Running, Completed) | (Running, Failed) | (Running, Cancelled))
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Task {
    pub id: String,
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub priority: i32,
    pub params: serde_json::Value,
    /// Monotonic 0-100 progress estimate; only moves forward.
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub owner: Option<String>,
}

impl Task {
    pub fn new(
        id: String,
        task_type: TaskType,
        params: serde_json::Value,
        priority: i32,
        owner: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            task_type,
            status: TaskStatus::Pending,
            priority,
            params,
            progress: 0,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
            result: None,
            error: None,
            owner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_can_reach_running_cancelled_or_failed() {
        assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Running));
        assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Cancelled));
        assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Failed));
        assert!(!TaskStatus::Pending.can_transition_to(TaskStatus::Completed));
    }

    #[test]
    fn running_can_reach_any_terminal_state() {
        assert!(TaskStatus::Running.can_transition_to(TaskStatus::Completed));
        assert!(TaskStatus::Running.can_transition_to(TaskStatus::Failed));
        assert!(TaskStatus::Running.can_transition_to(TaskStatus::Cancelled));
        assert!(!TaskStatus::Running.can_transition_to(TaskStatus::Pending));
    }

    #[test]
    fn terminal_states_are_immutable() {
        for terminal in [TaskStatus::Completed, TaskStatus::Failed, TaskStatus::Cancelled] {
            assert!(terminal.is_terminal());
            for next in [
                TaskStatus::Pending,
                TaskStatus::Running,
                TaskStatus::Completed,
                TaskStatus::Failed,
                TaskStatus::Cancelled,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn video_gets_a_longer_timeout_than_image() {
        assert!(TaskType::VideoGeneration.default_timeout() > TaskType::ImageGeneration.default_timeout());
    }
}
