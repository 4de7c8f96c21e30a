use crate::model::entity::{TaskContainerSettings, TaskSpec};

/// Command line and container settings shared by every task of a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskTemplate {
    pub command_line: String,
    pub container_settings: TaskContainerSettings,
}

impl TaskTemplate {
    pub fn task_id(nth: usize) -> String {
        format!("Task-{nth}")
    }

    /// Expands the template into `count` tasks named `Task-0` to `Task-{count - 1}`.
    pub fn instantiate(&self, count: usize) -> Vec<TaskSpec> {
        (0..count)
            .map(|nth| TaskSpec {
                id: Self::task_id(nth),
                command_line: self.command_line.clone(),
                container_settings: self.container_settings.clone(),
            })
            .collect()
    }
}
