use async_trait::async_trait;

use crate::{
    exception::BatchResult,
    model::vo::{TeardownDecision, TeardownOutcome},
};

#[async_trait]
pub trait TeardownService: Send + Sync {
    async fn maybe_delete(
        &self,
        job_id: &str,
        pool_id: &str,
        decision: TeardownDecision,
    ) -> BatchResult<TeardownOutcome>;
}
