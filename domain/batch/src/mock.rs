use async_trait::async_trait;
use mockall::mock;

use crate::{
    exception::ComputeError,
    model::{
        entity::{Job, JobSpec, Pool, PoolSpec, Task, TaskSpec},
        vo::{TaskReport, TeardownDecision},
    },
    service::{ComputeService, OperatorService, SecretService},
};

mock! {
    pub ComputeService {}
    #[async_trait]
    impl ComputeService for ComputeService {
        async fn create_pool(&self, spec: &PoolSpec) -> Result<(), ComputeError>;
        async fn get_pool(&self, pool_id: &str) -> Result<Pool, ComputeError>;
        async fn delete_pool(&self, pool_id: &str) -> Result<(), ComputeError>;
        async fn create_job(&self, spec: &JobSpec) -> Result<(), ComputeError>;
        async fn get_job(&self, job_id: &str) -> Result<Job, ComputeError>;
        async fn delete_job(&self, job_id: &str) -> Result<(), ComputeError>;
        async fn add_tasks(&self, job_id: &str, tasks: &[TaskSpec]) -> Result<(), ComputeError>;
        async fn list_tasks(&self, job_id: &str) -> Result<Vec<Task>, ComputeError>;
        async fn get_task(&self, job_id: &str, task_id: &str) -> Result<Task, ComputeError>;
        async fn get_task_output(
            &self,
            job_id: &str,
            task_id: &str,
            file_name: &str,
        ) -> Result<Vec<u8>, ComputeError>;
    }
}

mock! {
    pub OperatorService {}
    #[async_trait]
    impl OperatorService for OperatorService {
        async fn present_reports(&self, reports: &[TaskReport]) -> anyhow::Result<()>;
        async fn decide_teardown(&self, job_id: &str, pool_id: &str)
            -> anyhow::Result<TeardownDecision>;
    }
}

mock! {
    pub SecretService {}
    #[async_trait]
    impl SecretService for SecretService {
        async fn get_secret(&self, name: &str) -> anyhow::Result<String>;
    }
}
