use async_trait::async_trait;

use crate::{exception::BatchResult, model::vo::TaskReport};

#[async_trait]
pub trait ResultReportService: Send + Sync {
    /// Reports every task, failing on the first task whose output can't be read.
    async fn report(&self, job_id: &str, task_ids: &[String]) -> BatchResult<Vec<TaskReport>>;

    /// Reports every task independently.
    async fn report_each(&self, job_id: &str, task_ids: &[String])
        -> Vec<BatchResult<TaskReport>>;
}
