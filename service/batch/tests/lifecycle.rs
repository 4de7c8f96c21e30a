use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use domain_batch::{
    exception::{BatchException, ComputeError, ResourceKind},
    model::{
        entity::{
            ComputeNodeInfo, ImageReference, Job, JobSpec, Pool, PoolSpec, Task,
            TaskContainerSettings, TaskSpec, TaskState, VirtualMachineConfiguration,
        },
        vo::{LifecyclePlan, PollPolicy, TaskReport, TaskTemplate, TeardownDecision},
    },
    service::{ComputeService, JobLifecycleService, OperatorService},
};
use service_batch::{
    CompletionMonitorServiceImpl, JobLifecycleServiceImpl, ResourceProvisionServiceImpl,
    ResultReportServiceImpl, TaskSubmitServiceImpl, TeardownServiceImpl,
};
use tokio_util::sync::CancellationToken;

/// In-memory account. Tasks finish on the node `tvm-0` after `runs_for` list calls.
#[derive(Default)]
struct FakeAccount {
    pools: Mutex<BTreeMap<String, Pool>>,
    jobs: Mutex<BTreeMap<String, Job>>,
    tasks: Mutex<BTreeMap<String, Vec<(Task, usize)>>>,
    runs_for: usize,
    never_finishes: bool,
}

impl FakeAccount {
    fn has_pool(&self, id: &str) -> bool {
        self.pools.lock().unwrap().contains_key(id)
    }

    fn has_job(&self, id: &str) -> bool {
        self.jobs.lock().unwrap().contains_key(id)
    }

    fn task_count(&self, job_id: &str) -> usize {
        self.tasks.lock().unwrap().get(job_id).map_or(0, Vec::len)
    }
}

#[async_trait]
impl ComputeService for FakeAccount {
    async fn create_pool(&self, spec: &PoolSpec) -> Result<(), ComputeError> {
        let mut pools = self.pools.lock().unwrap();
        if pools.contains_key(&spec.id) {
            return Err(ComputeError::AlreadyExists {
                kind: ResourceKind::Pool,
                id: spec.id.clone(),
            });
        }
        pools.insert(spec.id.clone(), Pool::from(spec));
        Ok(())
    }

    async fn get_pool(&self, pool_id: &str) -> Result<Pool, ComputeError> {
        self.pools
            .lock()
            .unwrap()
            .get(pool_id)
            .cloned()
            .ok_or_else(|| ComputeError::NotFound {
                kind: ResourceKind::Pool,
                id: pool_id.to_string(),
            })
    }

    async fn delete_pool(&self, pool_id: &str) -> Result<(), ComputeError> {
        self.pools.lock().unwrap().remove(pool_id);
        Ok(())
    }

    async fn create_job(&self, spec: &JobSpec) -> Result<(), ComputeError> {
        let mut jobs = self.jobs.lock().unwrap();
        if jobs.contains_key(&spec.id) {
            return Err(ComputeError::AlreadyExists {
                kind: ResourceKind::Job,
                id: spec.id.clone(),
            });
        }
        jobs.insert(spec.id.clone(), Job::from(spec));
        Ok(())
    }

    async fn get_job(&self, job_id: &str) -> Result<Job, ComputeError> {
        self.jobs
            .lock()
            .unwrap()
            .get(job_id)
            .cloned()
            .ok_or_else(|| ComputeError::NotFound {
                kind: ResourceKind::Job,
                id: job_id.to_string(),
            })
    }

    async fn delete_job(&self, job_id: &str) -> Result<(), ComputeError> {
        self.jobs.lock().unwrap().remove(job_id);
        self.tasks.lock().unwrap().remove(job_id);
        Ok(())
    }

    async fn add_tasks(&self, job_id: &str, tasks: &[TaskSpec]) -> Result<(), ComputeError> {
        if !self.has_job(job_id) {
            return Err(ComputeError::NotFound {
                kind: ResourceKind::Job,
                id: job_id.to_string(),
            });
        }
        let mut all = self.tasks.lock().unwrap();
        let existing = all.entry(job_id.to_string()).or_default();
        let mut duplicate = None;
        for spec in tasks {
            if existing.iter().any(|(task, _)| task.id == spec.id) {
                duplicate.get_or_insert_with(|| spec.id.clone());
                continue;
            }
            let task = Task {
                id: spec.id.clone(),
                command_line: spec.command_line.clone(),
                container_settings: Some(spec.container_settings.clone()),
                ..Default::default()
            };
            existing.push((task, 0));
        }
        match duplicate {
            Some(id) => Err(ComputeError::AlreadyExists {
                kind: ResourceKind::Task,
                id,
            }),
            None => Ok(()),
        }
    }

    async fn list_tasks(&self, job_id: &str) -> Result<Vec<Task>, ComputeError> {
        let mut all = self.tasks.lock().unwrap();
        let tasks = all.entry(job_id.to_string()).or_default();
        for (task, polls) in tasks.iter_mut() {
            *polls += 1;
            if !self.never_finishes && *polls > self.runs_for {
                task.state = TaskState::Completed;
                task.exit_code = Some(0);
                task.node_info = Some(ComputeNodeInfo {
                    node_id: "tvm-0".to_string(),
                    pool_id: "POOL-A".to_string(),
                });
            } else {
                task.state = TaskState::Running;
            }
        }
        Ok(tasks.iter().map(|(task, _)| task.clone()).collect())
    }

    async fn get_task(&self, job_id: &str, task_id: &str) -> Result<Task, ComputeError> {
        self.tasks
            .lock()
            .unwrap()
            .get(job_id)
            .and_then(|tasks| tasks.iter().find(|(task, _)| task.id == task_id))
            .map(|(task, _)| task.clone())
            .ok_or_else(|| ComputeError::NotFound {
                kind: ResourceKind::Task,
                id: task_id.to_string(),
            })
    }

    async fn get_task_output(
        &self,
        _job_id: &str,
        task_id: &str,
        _file_name: &str,
    ) -> Result<Vec<u8>, ComputeError> {
        Ok(format!("{task_id}: Client Version: v1.28.2").into_bytes())
    }
}

/// Answers the teardown prompt with a fixed decision and keeps what it was shown.
struct ScriptedOperator {
    decision: TeardownDecision,
    shown: Mutex<Vec<TaskReport>>,
}

impl ScriptedOperator {
    fn new(delete_job: bool, delete_pool: bool) -> Arc<Self> {
        Arc::new(Self {
            decision: TeardownDecision {
                delete_job,
                delete_pool,
            },
            shown: Mutex::default(),
        })
    }
}

#[async_trait]
impl OperatorService for ScriptedOperator {
    async fn present_reports(&self, reports: &[TaskReport]) -> anyhow::Result<()> {
        self.shown.lock().unwrap().extend_from_slice(reports);
        Ok(())
    }

    async fn decide_teardown(&self, _job_id: &str, _pool_id: &str) -> anyhow::Result<TeardownDecision> {
        Ok(self.decision)
    }
}

fn plan(job_id: &str, task_count: usize) -> LifecyclePlan {
    LifecyclePlan {
        pool: PoolSpec {
            id: "POOL-A".to_string(),
            vm_size: "STANDARD_D2_V3".to_string(),
            target_dedicated_nodes: 1,
            target_low_priority_nodes: 1,
            vm_config: VirtualMachineConfiguration {
                image_reference: ImageReference {
                    virtual_machine_image_id: "/images/ubuntu-docker".to_string(),
                },
                node_agent_sku_id: "batch.node.ubuntu 18.04".to_string(),
                container_configuration: None,
            },
            metadata: vec![],
        },
        job: JobSpec {
            id: job_id.to_string(),
            pool_id: "POOL-A".to_string(),
            metadata: vec![],
        },
        template: TaskTemplate {
            command_line: "version --client=true".to_string(),
            container_settings: TaskContainerSettings {
                image_name: "registry.example.io/tes/kubectl".to_string(),
                container_run_options: "--rm --workdir /".to_string(),
            },
        },
        task_count,
        target: TaskState::Completed,
        timeout: Duration::from_secs(30 * 60),
        isolate_report_failures: false,
    }
}

fn lifecycle(
    account: Arc<FakeAccount>,
    operator: Arc<ScriptedOperator>,
    plan: LifecyclePlan,
) -> JobLifecycleServiceImpl {
    JobLifecycleServiceImpl::builder()
        .provisioner(Arc::new(
            ResourceProvisionServiceImpl::builder()
                .compute(account.clone())
                .build(),
        ))
        .submitter(Arc::new(
            TaskSubmitServiceImpl::builder()
                .compute(account.clone())
                .build(),
        ))
        .monitor(Arc::new(
            CompletionMonitorServiceImpl::builder()
                .compute(account.clone())
                .poll_policy(PollPolicy {
                    jitter: false,
                    ..Default::default()
                })
                .build(),
        ))
        .reporter(Arc::new(
            ResultReportServiceImpl::builder()
                .compute(account.clone())
                .build(),
        ))
        .teardown(Arc::new(TeardownServiceImpl::builder().compute(account).build()))
        .operator(operator)
        .plan(plan)
        .build()
}

#[tokio::test(start_paused = true)]
async fn five_tasks_are_reported_once_each() {
    let account = Arc::new(FakeAccount {
        runs_for: 3,
        ..Default::default()
    });
    let operator = ScriptedOperator::new(false, false);

    let summary = lifecycle(account.clone(), operator.clone(), plan("JOB-A", 5))
        .run(CancellationToken::new())
        .await
        .unwrap();

    let shown = operator.shown.lock().unwrap();
    let ids = shown.iter().map(|r| r.task_id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, ["Task-0", "Task-1", "Task-2", "Task-3", "Task-4"]);
    assert!(shown.iter().all(|r| r.node_id == "tvm-0"));
    assert!(shown[2].output.starts_with("Task-2:"));
    assert_eq!(summary.wait.completed.len(), 5);
    assert!(account.has_pool("POOL-A") && account.has_job("JOB-A"));
}

#[tokio::test(start_paused = true)]
async fn rerun_reuses_pool_and_job() {
    let account = Arc::new(FakeAccount::default());

    let first = lifecycle(account.clone(), ScriptedOperator::new(false, false), plan("JOB-A", 2))
        .run(CancellationToken::new())
        .await
        .unwrap();
    assert!(!first.pool.already_existed());
    assert!(!first.job.already_existed());

    let second = lifecycle(account.clone(), ScriptedOperator::new(false, false), plan("JOB-B", 2))
        .run(CancellationToken::new())
        .await
        .unwrap();
    assert!(second.pool.already_existed());
    assert!(!second.job.already_existed());
    assert_eq!(account.task_count("JOB-B"), 2);
}

#[tokio::test(start_paused = true)]
async fn rerun_into_a_kept_job_watches_its_tasks() {
    let account = Arc::new(FakeAccount::default());
    lifecycle(account.clone(), ScriptedOperator::new(false, false), plan("JOB-A", 1))
        .run(CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(account.task_count("JOB-A"), 1);

    let operator = ScriptedOperator::new(false, false);
    let second = lifecycle(account.clone(), operator.clone(), plan("JOB-A", 3))
        .run(CancellationToken::new())
        .await
        .unwrap();

    assert!(second.pool.already_existed());
    assert!(second.job.already_existed());
    assert_eq!(account.task_count("JOB-A"), 3);
    let shown = operator.shown.lock().unwrap();
    let ids = shown.iter().map(|r| r.task_id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, ["Task-0", "Task-1", "Task-2"]);
}

#[tokio::test(start_paused = true)]
async fn timeout_keeps_resources_and_reports_nothing() {
    let account = Arc::new(FakeAccount {
        never_finishes: true,
        ..Default::default()
    });
    let operator = ScriptedOperator::new(true, true);

    let err = lifecycle(account.clone(), operator.clone(), plan("JOB-A", 3))
        .run(CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        BatchException::MonitorTimeout { pending, .. } => {
            assert_eq!(pending, ["Task-0", "Task-1", "Task-2"])
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(operator.shown.lock().unwrap().is_empty());
    assert!(account.has_pool("POOL-A") && account.has_job("JOB-A"));
}

#[tokio::test(start_paused = true)]
async fn teardown_follows_each_decision() {
    for (delete_job, delete_pool) in [(true, true), (true, false), (false, true), (false, false)] {
        let account = Arc::new(FakeAccount::default());
        let summary = lifecycle(
            account.clone(),
            ScriptedOperator::new(delete_job, delete_pool),
            plan("JOB-A", 1),
        )
        .run(CancellationToken::new())
        .await
        .unwrap();

        assert_eq!(summary.teardown.job_deleted, delete_job);
        assert_eq!(summary.teardown.pool_deleted, delete_pool);
        assert_eq!(account.has_job("JOB-A"), !delete_job);
        assert_eq!(account.has_pool("POOL-A"), !delete_pool);
    }
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_waiting() {
    let account = Arc::new(FakeAccount {
        never_finishes: true,
        ..Default::default()
    });
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(60)).await;
        trigger.cancel();
    });

    let err = lifecycle(account, ScriptedOperator::new(true, true), plan("JOB-A", 1))
        .run(cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, BatchException::Cancelled { .. }));
}
