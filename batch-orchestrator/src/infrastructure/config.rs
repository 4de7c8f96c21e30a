use std::collections::BTreeMap;
use std::time::Duration;

use domain_batch::{
    exception::{BatchException, BatchResult},
    model::{
        entity::{
            ContainerConfiguration, ContainerRegistry, ImageReference, MetadataItem,
            TaskContainerSettings, TaskState, VirtualMachineConfiguration,
        },
        vo::{FailurePolicy, LifecyclePlan, OrchestrationSettings, PollPolicy, TaskTemplate},
    },
};
use serde::*;

use super::telemetry::TelemetryConfig;

/// Optional `config.yaml`, yaml files passed as arguments, then `BATCH_ORCHESTRATOR__*` variables.
pub fn build_config() -> anyhow::Result<config::Config> {
    let args: Vec<String> = std::env::args().collect();
    let mut config = config::Config::builder().add_source(
        config::File::with_name("config")
            .required(false)
            .format(config::FileFormat::Yaml),
    );
    for arg in args {
        if arg.ends_with("yaml") || arg.ends_with("yml") {
            config = config.add_source(
                config::File::from(std::path::Path::new(arg.as_str()))
                    .format(config::FileFormat::Yaml)
                    .required(false),
            );
        }
    }
    config = config.add_source(
        config::Environment::with_prefix("BATCH_ORCHESTRATOR")
            .separator("__")
            .try_parsing(true)
            .list_separator(";")
            .with_list_parse_key("registry.images"),
    );
    Ok(config.build()?)
}

#[derive(Default, Deserialize, Clone, Debug)]
pub struct CommonConfig {
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

#[derive(Default, Deserialize, Clone, Debug)]
pub struct AppConfig {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub orchestration: OrchestrationSettings,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub job: JobConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub task: TaskConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub console: ConsoleConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Deserialize, Clone, Debug)]
pub struct PoolConfig {
    #[serde(default = "PoolConfig::default_node_agent_sku_id")]
    pub node_agent_sku_id: String,
    #[serde(default = "PoolConfig::default_metadata")]
    pub metadata: BTreeMap<String, String>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            node_agent_sku_id: Self::default_node_agent_sku_id(),
            metadata: Self::default_metadata(),
        }
    }
}

impl PoolConfig {
    fn default_node_agent_sku_id() -> String {
        "batch.node.ubuntu 18.04".to_string()
    }
    fn default_metadata() -> BTreeMap<String, String> {
        BTreeMap::from([("Customer".to_string(), "Customer-01".to_string())])
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct JobConfig {
    #[serde(default = "JobConfig::default_metadata")]
    pub metadata: BTreeMap<String, String>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            metadata: Self::default_metadata(),
        }
    }
}

impl JobConfig {
    fn default_metadata() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("TaskRun".to_string(), "DESeq2Test".to_string()),
            (
                "Image".to_string(),
                "699120554104.dkr.ecr.us-east-1.amazonaws.com/public/wholegenomerna-diffexpr-develop"
                    .to_string(),
            ),
        ])
    }
}

/// Registry the nodes pull task images from.
#[derive(Deserialize, Clone, Debug)]
pub struct RegistryConfig {
    #[serde(default = "RegistryConfig::default_server")]
    pub server: String,
    #[serde(default = "RegistryConfig::default_user_name")]
    pub user_name: String,
    /// Name of the secret holding the registry password.
    #[serde(default = "RegistryConfig::default_password_secret")]
    pub password_secret: String,
    /// Images pulled on every node before the first task starts.
    #[serde(default = "RegistryConfig::default_images")]
    pub images: Vec<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            server: Self::default_server(),
            user_name: Self::default_user_name(),
            password_secret: Self::default_password_secret(),
            images: Self::default_images(),
        }
    }
}

impl RegistryConfig {
    fn default_server() -> String {
        "batchtes01.azurecr.io".to_string()
    }
    fn default_user_name() -> String {
        "batchtes01".to_string()
    }
    fn default_password_secret() -> String {
        "CONTAINER_REGISTRY_PASSWORD".to_string()
    }
    fn default_images() -> Vec<String> {
        vec!["batchtes01.azurecr.io/tes/kubectl".to_string()]
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct TaskConfig {
    #[serde(default = "TaskConfig::default_command_line")]
    pub command_line: String,
    #[serde(default = "TaskConfig::default_image_name")]
    pub image_name: String,
    #[serde(default = "TaskConfig::default_container_run_options")]
    pub container_run_options: String,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            command_line: Self::default_command_line(),
            image_name: Self::default_image_name(),
            container_run_options: Self::default_container_run_options(),
        }
    }
}

impl TaskConfig {
    fn default_command_line() -> String {
        "version --client=true".to_string()
    }
    fn default_image_name() -> String {
        "batchtes01.azurecr.io/tes/kubectl".to_string()
    }
    fn default_container_run_options() -> String {
        "--rm --workdir /".to_string()
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct MonitorConfig {
    #[serde(default = "MonitorConfig::default_initial_poll_secs")]
    pub initial_poll_secs: u64,
    #[serde(default = "MonitorConfig::default_max_poll_secs")]
    pub max_poll_secs: u64,
    #[serde(default = "MonitorConfig::default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            initial_poll_secs: Self::default_initial_poll_secs(),
            max_poll_secs: Self::default_max_poll_secs(),
            backoff_multiplier: Self::default_backoff_multiplier(),
            failure_policy: Default::default(),
        }
    }
}

impl MonitorConfig {
    fn default_initial_poll_secs() -> u64 {
        2
    }
    fn default_max_poll_secs() -> u64 {
        30
    }
    fn default_backoff_multiplier() -> f64 {
        1.5
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            initial_delay: Duration::from_secs(self.initial_poll_secs.max(1)),
            max_delay: Duration::from_secs(self.max_poll_secs.max(self.initial_poll_secs)),
            backoff_multiplier: self.backoff_multiplier.max(1.0),
            jitter: true,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct ReportConfig {
    /// Keep reporting the other tasks when one task's output can't be read.
    #[serde(default)]
    pub isolate_failures: bool,
    #[serde(default = "ReportConfig::default_stream_name")]
    pub stream_name: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            isolate_failures: false,
            stream_name: Self::default_stream_name(),
        }
    }
}

impl ReportConfig {
    fn default_stream_name() -> String {
        "stdout.txt".to_string()
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct ConsoleConfig {
    /// Wait for ENTER before the process exits.
    #[serde(default = "default_enabled")]
    pub pause_on_exit: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            pause_on_exit: default_enabled(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct HttpConfig {
    /// Timeout of a single call to the batch service.
    #[serde(default = "HttpConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

impl HttpConfig {
    fn default_timeout_secs() -> u64 {
        60
    }
}

fn default_enabled() -> bool {
    true
}

impl AppConfig {
    /// The run described by this configuration, on the image `vm_image_id`.
    pub fn lifecycle_plan(&self, vm_image_id: &str, registry_password: String) -> LifecyclePlan {
        let settings = &self.orchestration;
        let vm_config = VirtualMachineConfiguration {
            image_reference: ImageReference {
                virtual_machine_image_id: vm_image_id.to_string(),
            },
            node_agent_sku_id: self.pool.node_agent_sku_id.clone(),
            container_configuration: Some(ContainerConfiguration {
                container_image_names: self.registry.images.clone(),
                container_registries: vec![ContainerRegistry {
                    registry_server: self.registry.server.clone(),
                    user_name: self.registry.user_name.clone(),
                    password: registry_password,
                }],
            }),
        };
        LifecyclePlan {
            pool: settings.pool_spec(vm_config, MetadataItem::from_map(&self.pool.metadata)),
            job: settings.job_spec(MetadataItem::from_map(&self.job.metadata)),
            template: TaskTemplate {
                command_line: self.task.command_line.clone(),
                container_settings: TaskContainerSettings {
                    image_name: self.task.image_name.clone(),
                    container_run_options: self.task.container_run_options.clone(),
                },
            },
            task_count: settings.task_count,
            target: TaskState::Completed,
            timeout: settings.timeout(),
            isolate_report_failures: self.report.isolate_failures,
        }
    }
}

/// Account settings read from the plain environment.
#[derive(Default, Deserialize, Clone)]
pub struct Credentials {
    #[serde(default)]
    pub batch_account_name: String,
    #[serde(default)]
    pub batch_account_key: String,
    #[serde(default)]
    pub batch_account_url: String,
    #[serde(default)]
    pub storage_account_name: String,
    #[serde(default)]
    pub storage_account_key: String,
    #[serde(default)]
    pub vm_image_id: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("batch_account_name", &self.batch_account_name)
            .field("batch_account_url", &self.batch_account_url)
            .field("storage_account_name", &self.storage_account_name)
            .field("vm_image_id", &self.vm_image_id)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    pub fn from_env() -> BatchResult<Self> {
        let source = config::Config::builder()
            .add_source(config::Environment::default().try_parsing(false))
            .build()
            .and_then(|config| config.try_deserialize::<Credentials>())
            .map_err(|e| BatchException::Configuration {
                reason: format!("unable to read account settings from the environment: {e}"),
            })?;
        source.validated()
    }

    /// Fails naming every required setting that is missing or empty.
    pub fn validated(self) -> BatchResult<Self> {
        let missing = [
            ("BATCH_ACCOUNT_NAME", &self.batch_account_name),
            ("BATCH_ACCOUNT_KEY", &self.batch_account_key),
            ("BATCH_ACCOUNT_URL", &self.batch_account_url),
            ("STORAGE_ACCOUNT_NAME", &self.storage_account_name),
            ("STORAGE_ACCOUNT_KEY", &self.storage_account_key),
            ("VM_IMAGE_ID", &self.vm_image_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(BatchException::Configuration {
                reason: format!("required settings are missing: {}", missing.join(", ")),
            });
        }
        Ok(self)
    }
}
