mod compute;

use std::time::Duration;

use thiserror::Error;

use crate::model::entity::TaskState;

pub use compute::{ComputeError, ResourceKind};

pub type BatchResult<T> = Result<T, BatchException>;

#[derive(Error, Debug)]
pub enum BatchException {
    #[error("Configuration error: {reason}.")]
    Configuration { reason: String },

    #[error("Remote compute service error: {source}")]
    RemoteService {
        #[from]
        source: ComputeError,
    },

    #[error("Not all tasks in job: {job_id} reached state {target} within {timeout:?}, still pending: {pending:?}.")]
    MonitorTimeout {
        job_id: String,
        target: TaskState,
        timeout: Duration,
        pending: Vec<String>,
    },

    #[error("Task: {task_id} in job: {job_id} ended in state {state} instead of {target}.")]
    TaskFailed {
        job_id: String,
        task_id: String,
        state: TaskState,
        target: TaskState,
    },

    #[error("Waiting for tasks in job: {job_id} was cancelled.")]
    Cancelled { job_id: String },

    #[error("Task: {task_id} is still {state}, its node and output are not readable yet.")]
    TaskNotTerminal { task_id: String, state: TaskState },

    #[error("Unable to retrieve output of task: {task_id}: {source}")]
    OutputRetrieval {
        task_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Batch internal error: {source}")]
    InternalError {
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for BatchException {
    fn from(e: anyhow::Error) -> Self {
        BatchException::InternalError { source: e }
    }
}

impl BatchException {
    /// Whether the error leaves tasks behind that an operator may want to inspect.
    pub fn halts_before_teardown(&self) -> bool {
        matches!(
            self,
            BatchException::MonitorTimeout { .. }
                | BatchException::TaskFailed { .. }
                | BatchException::Cancelled { .. }
        )
    }
}
