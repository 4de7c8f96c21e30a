use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use domain_batch::{
    exception::{BatchException, BatchResult},
    model::vo::TaskReport,
    service::{ComputeService, ResultReportService},
};
use tracing::info;

#[derive(typed_builder::TypedBuilder)]
pub struct ResultReportServiceImpl {
    compute: Arc<dyn ComputeService>,
    /// Node file holding the task's standard output.
    #[builder(default = "stdout.txt".to_string(), setter(into))]
    stream_name: String,
}

#[async_trait]
impl ResultReportService for ResultReportServiceImpl {
    async fn report(&self, job_id: &str, task_ids: &[String]) -> BatchResult<Vec<TaskReport>> {
        info!("Collecting task output of job [{job_id}]...");
        let mut reports = Vec::with_capacity(task_ids.len());
        for task_id in task_ids {
            reports.push(self.report_one(job_id, task_id).await?);
        }
        Ok(reports)
    }

    async fn report_each(
        &self,
        job_id: &str,
        task_ids: &[String],
    ) -> Vec<BatchResult<TaskReport>> {
        info!("Collecting task output of job [{job_id}]...");
        let mut reports = Vec::with_capacity(task_ids.len());
        for task_id in task_ids {
            reports.push(self.report_one(job_id, task_id).await);
        }
        reports
    }
}

impl ResultReportServiceImpl {
    async fn report_one(&self, job_id: &str, task_id: &str) -> BatchResult<TaskReport> {
        // Re-fetch: the node is only known once the task has finished.
        let task = self.compute.get_task(job_id, task_id).await?;
        if !task.state.is_terminal() {
            return Err(BatchException::TaskNotTerminal {
                task_id: task.id,
                state: task.state,
            });
        }
        let node_id = task
            .node_id()
            .map(str::to_owned)
            .ok_or_else(|| BatchException::OutputRetrieval {
                task_id: task_id.to_owned(),
                source: anyhow!("no compute node recorded for the task"),
            })?;
        let output = self
            .compute
            .get_task_output(job_id, task_id, &self.stream_name)
            .await
            .map_err(|e| BatchException::OutputRetrieval {
                task_id: task_id.to_owned(),
                source: e.into(),
            })?;
        Ok(TaskReport {
            task_id: task.id,
            node_id,
            output: String::from_utf8_lossy(&output).into_owned(),
        })
    }
}
