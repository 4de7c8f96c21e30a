use async_trait::async_trait;

use crate::model::vo::{TaskReport, TeardownDecision};

/// The person running the tool. All console input and output goes through here.
#[async_trait]
pub trait OperatorService: Send + Sync {
    async fn present_reports(&self, reports: &[TaskReport]) -> anyhow::Result<()>;
    async fn decide_teardown(&self, job_id: &str, pool_id: &str)
        -> anyhow::Result<TeardownDecision>;
}
