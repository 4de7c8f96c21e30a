use async_trait::async_trait;

use crate::{
    exception::ComputeError,
    model::entity::{Job, JobSpec, Pool, PoolSpec, Task, TaskSpec},
};

/// Capability interface of the remote batch-compute service.
///
/// The service is eventually consistent and may already hold pools and jobs
/// from an earlier run; creates report that as [`ComputeError::AlreadyExists`].
#[async_trait]
pub trait ComputeService: Send + Sync {
    async fn create_pool(&self, spec: &PoolSpec) -> Result<(), ComputeError>;
    async fn get_pool(&self, pool_id: &str) -> Result<Pool, ComputeError>;
    async fn delete_pool(&self, pool_id: &str) -> Result<(), ComputeError>;

    async fn create_job(&self, spec: &JobSpec) -> Result<(), ComputeError>;
    async fn get_job(&self, job_id: &str) -> Result<Job, ComputeError>;
    async fn delete_job(&self, job_id: &str) -> Result<(), ComputeError>;

    /// Adds all tasks in one batch operation.
    ///
    /// Ids the job already holds are left as they are while the rest are still added; the
    /// first of them is then reported as [`ComputeError::AlreadyExists`].
    async fn add_tasks(&self, job_id: &str, tasks: &[TaskSpec]) -> Result<(), ComputeError>;
    async fn list_tasks(&self, job_id: &str) -> Result<Vec<Task>, ComputeError>;
    async fn get_task(&self, job_id: &str, task_id: &str) -> Result<Task, ComputeError>;
    /// Reads a file, such as `stdout.txt`, from the node the task ran on.
    async fn get_task_output(
        &self,
        job_id: &str,
        task_id: &str,
        file_name: &str,
    ) -> Result<Vec<u8>, ComputeError>;
}
