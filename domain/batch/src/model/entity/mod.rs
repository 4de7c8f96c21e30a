pub mod job;
pub mod metadata;
pub mod pool;
pub mod task;

#[rustfmt::skip]
pub use {
    job::{Job, JobSpec, JobState},
    metadata::MetadataItem,
    pool::{
        AllocationState, ContainerConfiguration, ContainerRegistry, ImageReference, Pool,
        PoolSpec, PoolState, VirtualMachineConfiguration,
    },
    task::{ComputeNodeInfo, Task, TaskContainerSettings, TaskSpec, TaskState},
};
