use std::sync::Arc;

use async_trait::async_trait;
use domain_batch::{
    exception::BatchResult,
    model::vo::{TeardownDecision, TeardownOutcome},
    service::{ComputeService, TeardownService},
};
use tracing::{error, info};

#[derive(typed_builder::TypedBuilder)]
pub struct TeardownServiceImpl {
    compute: Arc<dyn ComputeService>,
}

#[async_trait]
impl TeardownService for TeardownServiceImpl {
    async fn maybe_delete(
        &self,
        job_id: &str,
        pool_id: &str,
        decision: TeardownDecision,
    ) -> BatchResult<TeardownOutcome> {
        let mut outcome = TeardownOutcome::default();

        if decision.delete_job {
            info!("Deleting job [{job_id}]...");
            self.compute.delete_job(job_id).await?;
            outcome.job_deleted = true;
        } else {
            info!("Keeping job [{job_id}]");
        }

        if decision.delete_pool {
            info!("Deleting pool [{pool_id}]...");
            // No rollback of the job deletion; the pool is left as it is.
            if let Err(e) = self.compute.delete_pool(pool_id).await {
                error!(job_deleted = outcome.job_deleted, "Pool {pool_id} was not deleted: {e}");
                return Err(e.into());
            }
            outcome.pool_deleted = true;
        } else {
            info!("Keeping pool [{pool_id}]");
        }

        Ok(outcome)
    }
}
