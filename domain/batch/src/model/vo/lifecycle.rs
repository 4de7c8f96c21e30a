use std::time::Duration;

use crate::model::entity::{Job, JobSpec, Pool, PoolSpec, TaskState};

use super::{Provisioned, TaskReport, TaskTemplate, TeardownOutcome, WaitOutcome};

/// Everything one provision-submit-wait-report-teardown run needs.
#[derive(Clone, Debug, PartialEq)]
pub struct LifecyclePlan {
    pub pool: PoolSpec,
    pub job: JobSpec,
    pub template: TaskTemplate,
    pub task_count: usize,
    pub target: TaskState,
    pub timeout: Duration,
    /// Keep reporting the remaining tasks when one task's output can't be read.
    pub isolate_report_failures: bool,
}

#[derive(Clone, Debug)]
pub struct LifecycleSummary {
    pub pool: Provisioned<Pool>,
    pub job: Provisioned<Job>,
    pub task_ids: Vec<String>,
    pub wait: WaitOutcome,
    pub reports: Vec<TaskReport>,
    /// Tasks whose output couldn't be reported, only filled when failures are isolated.
    pub unreported: Vec<String>,
    pub teardown: TeardownOutcome,
}
