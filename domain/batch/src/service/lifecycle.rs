use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{exception::BatchResult, model::vo::LifecycleSummary};

/// Provision, submit, wait, report, then tear down.
#[async_trait]
pub trait JobLifecycleService: Send + Sync {
    async fn run(&self, cancel: CancellationToken) -> BatchResult<LifecycleSummary>;
}
