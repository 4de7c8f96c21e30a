use std::sync::Arc;

use async_trait::async_trait;
use domain_batch::{
    exception::BatchResult,
    model::vo::{LifecyclePlan, LifecycleSummary, TaskReport, WaitRequest},
    service::{
        CompletionMonitorService, JobLifecycleService, OperatorService, ResourceProvisionService,
        ResultReportService, TaskSubmitService, TeardownService,
    },
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info_span, Instrument};

/// Runs one job from provisioning to teardown.
///
/// Each step starts only after the previous one has been acknowledged by the
/// service. A failed wait stops the run before reporting, leaving the job and
/// the pool in place for inspection.
#[derive(typed_builder::TypedBuilder)]
pub struct JobLifecycleServiceImpl {
    provisioner: Arc<dyn ResourceProvisionService>,
    submitter: Arc<dyn TaskSubmitService>,
    monitor: Arc<dyn CompletionMonitorService>,
    reporter: Arc<dyn ResultReportService>,
    teardown: Arc<dyn TeardownService>,
    operator: Arc<dyn OperatorService>,
    plan: LifecyclePlan,
}

#[async_trait]
impl JobLifecycleService for JobLifecycleServiceImpl {
    async fn run(&self, cancel: CancellationToken) -> BatchResult<LifecycleSummary> {
        let span = info_span!("job_lifecycle", pool_id = %self.plan.pool.id, job_id = %self.plan.job.id);
        self.run_steps(cancel).instrument(span).await
    }
}

impl JobLifecycleServiceImpl {
    async fn run_steps(&self, cancel: CancellationToken) -> BatchResult<LifecycleSummary> {
        let plan = &self.plan;
        let job_id = plan.job.id.as_str();
        let pool_id = plan.pool.id.as_str();

        let pool = self.provisioner.ensure_pool(&plan.pool).await?;
        let job = self.provisioner.ensure_job(&plan.job).await?;

        let task_ids = self
            .submitter
            .submit_tasks(job_id, plan.task_count, &plan.template)
            .await?;

        let wait = self
            .monitor
            .wait_all(
                WaitRequest {
                    job_id: job_id.to_owned(),
                    task_ids: task_ids.clone(),
                    target: plan.target,
                    timeout: plan.timeout,
                },
                cancel,
            )
            .await?;

        let (reports, unreported) = self.collect_reports(job_id, &task_ids).await?;
        self.operator.present_reports(&reports).await?;

        let decision = self.operator.decide_teardown(job_id, pool_id).await?;
        let teardown = self.teardown.maybe_delete(job_id, pool_id, decision).await?;

        Ok(LifecycleSummary {
            pool,
            job,
            task_ids,
            wait,
            reports,
            unreported,
            teardown,
        })
    }

    async fn collect_reports(
        &self,
        job_id: &str,
        task_ids: &[String],
    ) -> BatchResult<(Vec<TaskReport>, Vec<String>)> {
        if !self.plan.isolate_report_failures {
            return Ok((self.reporter.report(job_id, task_ids).await?, vec![]));
        }
        let mut reports = vec![];
        let mut unreported = vec![];
        let results = self.reporter.report_each(job_id, task_ids).await;
        for (task_id, result) in task_ids.iter().zip(results) {
            match result {
                Ok(report) => reports.push(report),
                Err(e) => {
                    error!(task_id = %task_id, "Unable to report task: {e}");
                    unreported.push(task_id.clone());
                }
            }
        }
        Ok((reports, unreported))
    }
}
