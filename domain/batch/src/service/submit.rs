use async_trait::async_trait;

use crate::{exception::BatchResult, model::vo::TaskTemplate};

#[async_trait]
pub trait TaskSubmitService: Send + Sync {
    /// Submits `count` tasks built from `template` and returns their ids.
    async fn submit_tasks(
        &self,
        job_id: &str,
        count: usize,
        template: &TaskTemplate,
    ) -> BatchResult<Vec<String>>;
}
