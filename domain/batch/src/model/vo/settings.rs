use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::entity::{JobSpec, MetadataItem, PoolSpec, VirtualMachineConfiguration};

/// Identities and sizes fixed for one deployment.
///
/// Re-running against the same ids reuses the existing pool and job.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrchestrationSettings {
    #[serde(default = "OrchestrationSettings::default_pool_id")]
    pub pool_id: String,
    #[serde(default = "OrchestrationSettings::default_job_id")]
    pub job_id: String,
    #[serde(default = "OrchestrationSettings::default_vm_size")]
    pub vm_size: String,
    #[serde(default = "OrchestrationSettings::default_node_count")]
    pub dedicated_count: u32,
    #[serde(default = "OrchestrationSettings::default_node_count")]
    pub low_priority_count: u32,
    #[serde(default = "OrchestrationSettings::default_task_count")]
    pub task_count: usize,
    /// Seconds to wait for every task to complete.
    #[serde(default = "OrchestrationSettings::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OrchestrationSettings {
    fn default() -> Self {
        Self {
            pool_id: Self::default_pool_id(),
            job_id: Self::default_job_id(),
            vm_size: Self::default_vm_size(),
            dedicated_count: Self::default_node_count(),
            low_priority_count: Self::default_node_count(),
            task_count: Self::default_task_count(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

impl OrchestrationSettings {
    pub fn default_pool_id() -> String {
        "TES-BATCH-POOL-SMALL".to_string()
    }
    pub fn default_job_id() -> String {
        "TES-NO-DRAGEN-JOB-16".to_string()
    }
    pub fn default_vm_size() -> String {
        "STANDARD_D2_V3".to_string()
    }
    pub fn default_node_count() -> u32 {
        1
    }
    pub fn default_task_count() -> usize {
        5
    }
    pub fn default_timeout_secs() -> u64 {
        30 * 60
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn pool_spec(
        &self,
        vm_config: VirtualMachineConfiguration,
        metadata: Vec<MetadataItem>,
    ) -> PoolSpec {
        PoolSpec {
            id: self.pool_id.clone(),
            vm_size: self.vm_size.clone(),
            target_dedicated_nodes: self.dedicated_count,
            target_low_priority_nodes: self.low_priority_count,
            vm_config,
            metadata,
        }
    }

    pub fn job_spec(&self, metadata: Vec<MetadataItem>) -> JobSpec {
        JobSpec {
            id: self.job_id.clone(),
            pool_id: self.pool_id.clone(),
            metadata,
        }
    }
}

/// What the monitor does when a task ends in a terminal state other than the target.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop waiting and report the task as failed.
    #[default]
    ShortCircuit,
    /// Keep the task pending until the deadline.
    WaitForTimeout,
}

/// Delay between two polls of the task list.
#[derive(Clone, Debug, PartialEq)]
pub struct PollPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    /// Scale each delay by a random factor in `0.5..1.5`.
    pub jitter: bool,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 1.5,
            jitter: true,
        }
    }
}

impl PollPolicy {
    pub fn next_delay(&self, current: Duration) -> Duration {
        let next = current.as_secs_f64() * self.backoff_multiplier.max(1.0);
        Duration::from_secs_f64(next.min(self.max_delay.as_secs_f64()))
    }
}
