use async_trait::async_trait;

use crate::{
    exception::BatchResult,
    model::{
        entity::{Job, JobSpec, Pool, PoolSpec},
        vo::Provisioned,
    },
};

/// Makes sure the pool and the job exist, creating them when absent.
#[async_trait]
pub trait ResourceProvisionService: Send + Sync {
    async fn ensure_pool(&self, spec: &PoolSpec) -> BatchResult<Provisioned<Pool>>;
    async fn ensure_job(&self, spec: &JobSpec) -> BatchResult<Provisioned<Job>>;
}
