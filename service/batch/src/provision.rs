use std::sync::Arc;

use async_trait::async_trait;
use domain_batch::{
    exception::{BatchResult, ComputeError},
    model::{
        entity::{Job, JobSpec, Pool, PoolSpec},
        vo::Provisioned,
    },
    service::{ComputeService, ResourceProvisionService},
};
use tracing::{info, warn};

#[derive(typed_builder::TypedBuilder)]
pub struct ResourceProvisionServiceImpl {
    compute: Arc<dyn ComputeService>,
}

#[async_trait]
impl ResourceProvisionService for ResourceProvisionServiceImpl {
    async fn ensure_pool(&self, spec: &PoolSpec) -> BatchResult<Provisioned<Pool>> {
        info!("Creating pool [{}]...", spec.id);
        match self.compute.create_pool(spec).await {
            Ok(()) => Ok(Provisioned::Created(Pool::from(spec))),
            Err(ComputeError::AlreadyExists { .. }) => {
                warn!("The pool {} already existed when we tried to create it", spec.id);
                let pool = self.compute.get_pool(&spec.id).await?;
                info!(
                    "The pool {} has {} current dedicated compute nodes",
                    pool.id,
                    node_count(pool.current_dedicated_nodes)
                );
                info!(
                    "The pool {} has {} current spot nodes",
                    pool.id,
                    node_count(pool.current_low_priority_nodes)
                );
                Ok(Provisioned::AlreadyExists(pool))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn ensure_job(&self, spec: &JobSpec) -> BatchResult<Provisioned<Job>> {
        info!("Creating job [{}]...", spec.id);
        match self.compute.create_job(spec).await {
            Ok(()) => Ok(Provisioned::Created(Job::from(spec))),
            Err(ComputeError::AlreadyExists { .. }) => {
                warn!("The job {} already existed when we tried to create it", spec.id);
                let job = self.compute.get_job(&spec.id).await?;
                if job.pool_id != spec.pool_id {
                    warn!(
                        "The job {} runs on pool {}, not on {}",
                        job.id, job.pool_id, spec.pool_id
                    );
                }
                info!("The job {} is {}", job.id, job.state);
                Ok(Provisioned::AlreadyExists(job))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn node_count(count: Option<u32>) -> String {
    count.map_or_else(|| "unknown".to_string(), |n| n.to_string())
}

#[cfg(test)]
mod tests {
    use domain_batch::{
        exception::{BatchException, ResourceKind},
        mock::MockComputeService,
        model::entity::{
            AllocationState, ImageReference, JobState, MetadataItem, PoolState,
            VirtualMachineConfiguration,
        },
    };

    use super::*;

    fn pool_spec(id: &str) -> PoolSpec {
        PoolSpec {
            id: id.to_string(),
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
            metadata: vec![MetadataItem::new("Customer", "Customer-01")],
        }
    }

    fn job_spec() -> JobSpec {
        JobSpec {
            id: "JOB-A".to_string(),
            pool_id: "POOL-A".to_string(),
            metadata: vec![],
        }
    }

    fn load(compute: MockComputeService) -> ResourceProvisionServiceImpl {
        ResourceProvisionServiceImpl::builder()
            .compute(Arc::new(compute))
            .build()
    }

    #[tokio::test]
    async fn creates_missing_pool() {
        let mut compute = MockComputeService::new();
        compute
            .expect_create_pool()
            .withf(|spec: &PoolSpec| spec.id == "POOL-A")
            .times(1)
            .returning(|_| Ok(()));
        compute.expect_get_pool().never();

        let pool = load(compute).ensure_pool(&pool_spec("POOL-A")).await.unwrap();
        assert!(!pool.already_existed());
        assert_eq!(pool.resource().target_dedicated_nodes, 1);
        assert_eq!(pool.resource().current_dedicated_nodes, None);
    }

    #[tokio::test]
    async fn existing_pool_is_reconciled_with_its_current_scale() {
        let mut compute = MockComputeService::new();
        compute.expect_create_pool().times(1).returning(|spec| {
            Err(ComputeError::AlreadyExists {
                kind: ResourceKind::Pool,
                id: spec.id.clone(),
            })
        });
        compute
            .expect_get_pool()
            .withf(|pool_id: &str| pool_id == "POOL-A")
            .times(1)
            .returning(|pool_id| {
                Ok(Pool {
                    id: pool_id.to_string(),
                    vm_size: "STANDARD_D2_V3".to_string(),
                    state: PoolState::Active,
                    allocation_state: AllocationState::Steady,
                    target_dedicated_nodes: 1,
                    target_low_priority_nodes: 1,
                    current_dedicated_nodes: Some(1),
                    current_low_priority_nodes: Some(0),
                    metadata: vec![],
                })
            });

        let pool = load(compute).ensure_pool(&pool_spec("POOL-A")).await.unwrap();
        assert!(pool.already_existed());
        assert_eq!(pool.resource().current_dedicated_nodes, Some(1));
        assert_eq!(pool.resource().current_low_priority_nodes, Some(0));
    }

    #[tokio::test]
    async fn other_pool_failures_are_fatal() {
        let mut compute = MockComputeService::new();
        compute.expect_create_pool().returning(|_| {
            Err(ComputeError::Rejected {
                status: 403,
                code: "AuthenticationFailed".to_string(),
                message: "Server failed to authenticate the request.".to_string(),
            })
        });
        compute.expect_get_pool().never();

        let err = load(compute).ensure_pool(&pool_spec("POOL-A")).await.unwrap_err();
        assert!(matches!(
            err,
            BatchException::RemoteService {
                source: ComputeError::Rejected { status: 403, .. }
            }
        ));
    }

    #[tokio::test]
    async fn existing_job_is_reused() {
        let mut compute = MockComputeService::new();
        compute.expect_create_job().times(1).returning(|spec| {
            Err(ComputeError::AlreadyExists {
                kind: ResourceKind::Job,
                id: spec.id.clone(),
            })
        });
        compute.expect_get_job().times(1).returning(|job_id| {
            Ok(Job {
                id: job_id.to_string(),
                pool_id: "POOL-A".to_string(),
                state: JobState::Active,
                metadata: vec![],
            })
        });

        let job = load(compute).ensure_job(&job_spec()).await.unwrap();
        assert!(job.already_existed());
        assert_eq!(job.into_resource().pool_id, "POOL-A");
    }

    #[tokio::test]
    async fn creates_missing_job_on_the_pool() {
        let mut compute = MockComputeService::new();
        compute
            .expect_create_job()
            .withf(|spec: &JobSpec| spec.pool_id == "POOL-A")
            .times(1)
            .returning(|_| Ok(()));

        let job = load(compute).ensure_job(&job_spec()).await.unwrap();
        assert_eq!(job, Provisioned::Created(Job::from(&job_spec())));
    }
}
