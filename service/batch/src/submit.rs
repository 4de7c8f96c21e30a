use std::sync::Arc;

use async_trait::async_trait;
use domain_batch::{
    exception::{BatchResult, ComputeError, ResourceKind},
    model::vo::TaskTemplate,
    service::{ComputeService, TaskSubmitService},
};
use tracing::{info, warn};

#[derive(typed_builder::TypedBuilder)]
pub struct TaskSubmitServiceImpl {
    compute: Arc<dyn ComputeService>,
}

#[async_trait]
impl TaskSubmitService for TaskSubmitServiceImpl {
    async fn submit_tasks(
        &self,
        job_id: &str,
        count: usize,
        template: &TaskTemplate,
    ) -> BatchResult<Vec<String>> {
        let tasks = template.instantiate(count);
        if tasks.is_empty() {
            info!("No tasks to add to job [{job_id}]");
            return Ok(vec![]);
        }
        info!("Adding {count} tasks to job [{job_id}]...");
        match self.compute.add_tasks(job_id, &tasks).await {
            Ok(()) => {}
            // Ids are fixed per position, so a kept job from an earlier run already holds them.
            Err(ComputeError::AlreadyExists {
                kind: ResourceKind::Task,
                id,
            }) => {
                warn!("Job [{job_id}] already holds task [{id}], watching the existing tasks.");
            }
            Err(e) => return Err(e.into()),
        }
        Ok(tasks.into_iter().map(|task| task.id).collect())
    }
}
