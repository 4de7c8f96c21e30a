use std::time::Duration;

use crate::model::entity::TaskState;

/// Which tasks to wait for, for which state, and for how long.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WaitRequest {
    pub job_id: String,
    pub task_ids: Vec<String>,
    pub target: TaskState,
    pub timeout: Duration,
}

/// Emitted once per task when it reaches the target state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionEvent {
    pub task_id: String,
    pub state: TaskState,
    pub node_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WaitOutcome {
    /// Task ids in the order they were observed reaching the target.
    pub completed: Vec<String>,
    pub elapsed: Duration,
}
