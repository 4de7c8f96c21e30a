use std::fmt;

/// A single containerized unit of execution within a job.
///
/// Read-only from the orchestrator's side once submitted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub command_line: String,
    pub container_settings: Option<TaskContainerSettings>,
    pub state: TaskState,
    /// Set once the task has been scheduled on a node.
    pub node_info: Option<ComputeNodeInfo>,
    pub exit_code: Option<i32>,
}

impl Task {
    pub fn node_id(&self) -> Option<&str> {
        self.node_info.as_ref().map(|info| info.node_id.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// Submitted, waiting for a node.
    #[default]
    Active,
    Preparing,
    Running,
    /// Finished with a success result.
    Completed,
    /// Finished with a failure result.
    Failed,
    Unknown,
}

impl TaskState {
    /// No transition happens after a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Active => "active",
            TaskState::Preparing => "preparing",
            TaskState::Running => "running",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
            TaskState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComputeNodeInfo {
    pub node_id: String,
    pub pool_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskContainerSettings {
    pub image_name: String,
    pub container_run_options: String,
}

/// A task as submitted in a batch add.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskSpec {
    pub id: String,
    pub command_line: String,
    pub container_settings: TaskContainerSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_completed_and_failed_are_terminal() {
        let terminal: Vec<TaskState> = [
            TaskState::Active,
            TaskState::Preparing,
            TaskState::Running,
            TaskState::Completed,
            TaskState::Failed,
            TaskState::Unknown,
        ]
        .into_iter()
        .filter(TaskState::is_terminal)
        .collect();
        assert_eq!(terminal, vec![TaskState::Completed, TaskState::Failed]);
    }

    #[test]
    fn node_id_is_absent_before_scheduling() {
        let mut task = Task {
            id: "Task-0".to_string(),
            ..Default::default()
        };
        assert_eq!(task.node_id(), None);
        task.node_info = Some(ComputeNodeInfo {
            node_id: "tvm-1".to_string(),
            pool_id: "pool".to_string(),
        });
        assert_eq!(task.node_id(), Some("tvm-1"));
    }
}
