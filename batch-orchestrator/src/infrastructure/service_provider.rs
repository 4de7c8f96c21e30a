use std::sync::Arc;
use std::time::Duration;

use domain_batch::{
    exception::{BatchException, BatchResult},
    model::vo::LifecyclePlan,
    service::{ComputeService, OperatorService, SecretService},
};
use infrastructure_compute::{BatchCredential, BatchRestClient};
use service_batch::{
    CompletionMonitorServiceImpl, JobLifecycleServiceImpl, ResourceProvisionServiceImpl,
    ResultReportServiceImpl, TaskSubmitServiceImpl, TeardownServiceImpl,
};

use super::config::{AppConfig, Credentials};

/// Wires the lifecycle services for one run.
pub struct ServiceProvider;

impl ServiceProvider {
    pub async fn build(
        config: &AppConfig,
        credentials: &Credentials,
        secrets: Arc<dyn SecretService>,
        operator: Arc<dyn OperatorService>,
    ) -> BatchResult<JobLifecycleServiceImpl> {
        let registry_password = secrets
            .get_secret(&config.registry.password_secret)
            .await
            .map_err(|e| BatchException::Configuration {
                reason: format!("registry password could not be resolved: {e}"),
            })?;
        let credential = BatchCredential::new(
            &credentials.batch_account_name,
            &credentials.batch_account_url,
            &credentials.batch_account_key,
        )
        .map_err(|e| BatchException::Configuration {
            reason: format!("{e:#}"),
        })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http.timeout_secs))
            .build()
            .map_err(anyhow::Error::from)?;
        let compute: Arc<dyn ComputeService> = Arc::new(
            BatchRestClient::builder()
                .client(Arc::new(client))
                .credential(credential)
                .build(),
        );
        Ok(Self::lifecycle(
            config,
            compute,
            operator,
            config.lifecycle_plan(&credentials.vm_image_id, registry_password),
        ))
    }

    fn lifecycle(
        config: &AppConfig,
        compute: Arc<dyn ComputeService>,
        operator: Arc<dyn OperatorService>,
        plan: LifecyclePlan,
    ) -> JobLifecycleServiceImpl {
        JobLifecycleServiceImpl::builder()
            .provisioner(Arc::new(
                ResourceProvisionServiceImpl::builder()
                    .compute(compute.clone())
                    .build(),
            ))
            .submitter(Arc::new(
                TaskSubmitServiceImpl::builder()
                    .compute(compute.clone())
                    .build(),
            ))
            .monitor(Arc::new(
                CompletionMonitorServiceImpl::builder()
                    .compute(compute.clone())
                    .poll_policy(config.monitor.poll_policy())
                    .failure_policy(config.monitor.failure_policy)
                    .build(),
            ))
            .reporter(Arc::new(
                ResultReportServiceImpl::builder()
                    .compute(compute.clone())
                    .stream_name(config.report.stream_name.clone())
                    .build(),
            ))
            .teardown(Arc::new(TeardownServiceImpl::builder().compute(compute).build()))
            .operator(operator)
            .plan(plan)
            .build()
    }
}
