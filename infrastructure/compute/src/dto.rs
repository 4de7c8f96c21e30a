//! Wire models of the batch REST api.

use domain_batch::{
    exception::{ComputeError, ResourceKind},
    model::entity::{
        AllocationState, ComputeNodeInfo, ContainerConfiguration, ContainerRegistry, Job,
        JobSpec, JobState, MetadataItem, Pool, PoolSpec, PoolState, Task,
        TaskContainerSettings, TaskSpec, TaskState, VirtualMachineConfiguration,
    },
};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MetadataDto {
    pub name: String,
    pub value: String,
}

impl From<&MetadataItem> for MetadataDto {
    fn from(item: &MetadataItem) -> Self {
        Self {
            name: item.name.clone(),
            value: item.value.clone(),
        }
    }
}

impl From<MetadataDto> for MetadataItem {
    fn from(dto: MetadataDto) -> Self {
        MetadataItem::new(dto.name, dto.value)
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PoolAddDto {
    pub id: String,
    pub vm_size: String,
    pub virtual_machine_configuration: VirtualMachineConfigurationDto,
    pub target_dedicated_nodes: u32,
    pub target_low_priority_nodes: u32,
    pub metadata: Vec<MetadataDto>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineConfigurationDto {
    pub image_reference: ImageReferenceDto,
    #[serde(rename = "nodeAgentSKUId")]
    pub node_agent_sku_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_configuration: Option<ContainerConfigurationDto>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ImageReferenceDto {
    pub virtual_machine_image_id: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ContainerConfigurationDto {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub container_image_names: Vec<String>,
    pub container_registries: Vec<ContainerRegistryDto>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRegistryDto {
    pub registry_server: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for ContainerRegistryDto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerRegistryDto")
            .field("registry_server", &self.registry_server)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl From<&ContainerRegistry> for ContainerRegistryDto {
    fn from(registry: &ContainerRegistry) -> Self {
        Self {
            registry_server: registry.registry_server.clone(),
            username: registry.user_name.clone(),
            password: registry.password.clone(),
        }
    }
}

impl From<&ContainerConfiguration> for ContainerConfigurationDto {
    fn from(config: &ContainerConfiguration) -> Self {
        Self {
            kind: "dockerCompatible",
            container_image_names: config.container_image_names.clone(),
            container_registries: config.container_registries.iter().map(Into::into).collect(),
        }
    }
}

impl From<&VirtualMachineConfiguration> for VirtualMachineConfigurationDto {
    fn from(config: &VirtualMachineConfiguration) -> Self {
        Self {
            image_reference: ImageReferenceDto {
                virtual_machine_image_id: config.image_reference.virtual_machine_image_id.clone(),
            },
            node_agent_sku_id: config.node_agent_sku_id.clone(),
            container_configuration: config.container_configuration.as_ref().map(Into::into),
        }
    }
}

impl From<&PoolSpec> for PoolAddDto {
    fn from(spec: &PoolSpec) -> Self {
        Self {
            id: spec.id.clone(),
            vm_size: spec.vm_size.clone(),
            virtual_machine_configuration: (&spec.vm_config).into(),
            target_dedicated_nodes: spec.target_dedicated_nodes,
            target_low_priority_nodes: spec.target_low_priority_nodes,
            metadata: spec.metadata.iter().map(Into::into).collect(),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PoolDto {
    pub id: String,
    pub vm_size: String,
    pub state: Option<String>,
    pub allocation_state: Option<String>,
    pub target_dedicated_nodes: Option<u32>,
    pub target_low_priority_nodes: Option<u32>,
    pub current_dedicated_nodes: Option<u32>,
    pub current_low_priority_nodes: Option<u32>,
    pub metadata: Vec<MetadataDto>,
}

impl From<PoolDto> for Pool {
    fn from(dto: PoolDto) -> Self {
        let state = match dto.state.as_deref() {
            Some("active") => PoolState::Active,
            Some("deleting") => PoolState::Deleting,
            _ => PoolState::Unknown,
        };
        let allocation_state = match dto.allocation_state.as_deref() {
            Some("steady") => AllocationState::Steady,
            Some("resizing") => AllocationState::Resizing,
            Some("stopping") => AllocationState::Stopping,
            _ => AllocationState::Unknown,
        };
        Self {
            id: dto.id,
            vm_size: dto.vm_size,
            state,
            allocation_state,
            target_dedicated_nodes: dto.target_dedicated_nodes.unwrap_or_default(),
            target_low_priority_nodes: dto.target_low_priority_nodes.unwrap_or_default(),
            current_dedicated_nodes: dto.current_dedicated_nodes,
            current_low_priority_nodes: dto.current_low_priority_nodes,
            metadata: dto.metadata.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PoolInfoDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_id: Option<String>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct JobAddDto {
    pub id: String,
    pub pool_info: PoolInfoDto,
    pub metadata: Vec<MetadataDto>,
}

impl From<&JobSpec> for JobAddDto {
    fn from(spec: &JobSpec) -> Self {
        Self {
            id: spec.id.clone(),
            pool_info: PoolInfoDto {
                pool_id: Some(spec.pool_id.clone()),
            },
            metadata: spec.metadata.iter().map(Into::into).collect(),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct JobDto {
    pub id: String,
    pub state: Option<String>,
    pub pool_info: PoolInfoDto,
    pub metadata: Vec<MetadataDto>,
}

impl From<JobDto> for Job {
    fn from(dto: JobDto) -> Self {
        let state = match dto.state.as_deref() {
            Some("active") => JobState::Active,
            Some("disabling") => JobState::Disabling,
            Some("disabled") => JobState::Disabled,
            Some("enabling") => JobState::Enabling,
            Some("terminating") => JobState::Terminating,
            Some("completed") => JobState::Completed,
            Some("deleting") => JobState::Deleting,
            _ => JobState::Unknown,
        };
        Self {
            id: dto.id,
            pool_id: dto.pool_info.pool_id.unwrap_or_default(),
            state,
            metadata: dto.metadata.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskContainerSettingsDto {
    pub image_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub container_run_options: String,
}

impl From<&TaskContainerSettings> for TaskContainerSettingsDto {
    fn from(settings: &TaskContainerSettings) -> Self {
        Self {
            image_name: settings.image_name.clone(),
            container_run_options: settings.container_run_options.clone(),
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TaskAddDto {
    pub id: String,
    pub command_line: String,
    pub container_settings: TaskContainerSettingsDto,
}

impl From<&TaskSpec> for TaskAddDto {
    fn from(spec: &TaskSpec) -> Self {
        Self {
            id: spec.id.clone(),
            command_line: spec.command_line.clone(),
            container_settings: (&spec.container_settings).into(),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct TaskAddCollectionDto {
    pub value: Vec<TaskAddDto>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct TaskAddCollectionResultDto {
    pub value: Vec<TaskAddResultDto>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskAddResultDto {
    pub status: String,
    pub task_id: String,
    pub error: Option<BatchErrorDto>,
}

impl TaskAddResultDto {
    /// `None` when the task was accepted.
    pub fn into_error(self) -> Option<ComputeError> {
        if self.status == "success" {
            return None;
        }
        let code = self.error.as_ref().and_then(|e| e.code.clone());
        if code.as_deref() == Some("TaskExists") {
            return Some(ComputeError::AlreadyExists {
                kind: ResourceKind::Task,
                id: self.task_id,
            });
        }
        let status = if self.status == "servererror" { 500 } else { 400 };
        Some(ComputeError::Rejected {
            status,
            code: code.unwrap_or_else(|| self.status.clone()),
            message: format!(
                "task {} was not added: {}",
                self.task_id,
                self.error.map(BatchErrorDto::message).unwrap_or_default()
            ),
        })
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeInfoDto {
    pub node_id: Option<String>,
    pub pool_id: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutionInfoDto {
    pub exit_code: Option<i32>,
    pub result: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskDto {
    pub id: String,
    pub command_line: String,
    pub state: Option<String>,
    pub container_settings: Option<TaskContainerSettingsDto>,
    pub node_info: Option<NodeInfoDto>,
    pub execution_info: Option<ExecutionInfoDto>,
}

impl From<TaskDto> for Task {
    fn from(dto: TaskDto) -> Self {
        let failed = dto
            .execution_info
            .as_ref()
            .and_then(|info| info.result.as_deref())
            == Some("failure");
        let state = match dto.state.as_deref() {
            Some("active") => TaskState::Active,
            Some("preparing") => TaskState::Preparing,
            Some("running") => TaskState::Running,
            Some("completed") if failed => TaskState::Failed,
            Some("completed") => TaskState::Completed,
            _ => TaskState::Unknown,
        };
        let node_info = dto.node_info.and_then(|info| {
            info.node_id.map(|node_id| ComputeNodeInfo {
                node_id,
                pool_id: info.pool_id.unwrap_or_default(),
            })
        });
        Self {
            id: dto.id,
            command_line: dto.command_line,
            container_settings: dto.container_settings.map(|s| TaskContainerSettings {
                image_name: s.image_name,
                container_run_options: s.container_run_options,
            }),
            state,
            node_info,
            exit_code: dto.execution_info.and_then(|info| info.exit_code),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct TaskListDto {
    pub value: Vec<TaskDto>,
    #[serde(rename = "odata.nextLink")]
    pub next_link: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct BatchErrorDto {
    pub code: Option<String>,
    pub message: Option<ErrorMessageDto>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct ErrorMessageDto {
    pub value: Option<String>,
}

impl BatchErrorDto {
    pub fn message(self) -> String {
        self.message.and_then(|m| m.value).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use domain_batch::model::entity::ImageReference;
    use indoc::indoc;
    use serde_json::json;

    use super::*;

    #[test]
    fn pool_request_carries_container_configuration() {
        let spec = PoolSpec {
            id: "POOL-A".to_string(),
            vm_size: "STANDARD_D2_V3".to_string(),
            target_dedicated_nodes: 1,
            target_low_priority_nodes: 1,
            vm_config: VirtualMachineConfiguration {
                image_reference: ImageReference {
                    virtual_machine_image_id: "/images/ubuntu-docker".to_string(),
                },
                node_agent_sku_id: "batch.node.ubuntu 18.04".to_string(),
                container_configuration: Some(ContainerConfiguration {
                    container_image_names: vec!["registry.example.io/tes/kubectl".to_string()],
                    container_registries: vec![ContainerRegistry {
                        registry_server: "registry.example.io".to_string(),
                        user_name: "puller".to_string(),
                        password: "from-secret-store".to_string(),
                    }],
                }),
            },
            metadata: vec![MetadataItem::new("Customer", "Customer-01")],
        };
        let body = serde_json::to_value(PoolAddDto::from(&spec)).unwrap();
        assert_eq!(
            body,
            json!({
                "id": "POOL-A",
                "vmSize": "STANDARD_D2_V3",
                "virtualMachineConfiguration": {
                    "imageReference": { "virtualMachineImageId": "/images/ubuntu-docker" },
                    "nodeAgentSKUId": "batch.node.ubuntu 18.04",
                    "containerConfiguration": {
                        "type": "dockerCompatible",
                        "containerImageNames": ["registry.example.io/tes/kubectl"],
                        "containerRegistries": [{
                            "registryServer": "registry.example.io",
                            "username": "puller",
                            "password": "from-secret-store"
                        }]
                    }
                },
                "targetDedicatedNodes": 1,
                "targetLowPriorityNodes": 1,
                "metadata": [{ "name": "Customer", "value": "Customer-01" }]
            })
        );
        let printed = format!("{:?}", PoolAddDto::from(&spec));
        assert!(!printed.contains("from-secret-store"));
    }

    #[test]
    fn job_request_binds_the_pool() {
        let spec = JobSpec {
            id: "JOB-A".to_string(),
            pool_id: "POOL-A".to_string(),
            metadata: vec![MetadataItem::new("TaskRun", "DESeq2Test")],
        };
        assert_eq!(
            serde_json::to_value(JobAddDto::from(&spec)).unwrap(),
            json!({
                "id": "JOB-A",
                "poolInfo": { "poolId": "POOL-A" },
                "metadata": [{ "name": "TaskRun", "value": "DESeq2Test" }]
            })
        );
    }

    #[test]
    fn reads_an_existing_pool() {
        let body = indoc! {r#"
            {
              "odata.metadata": "https://acct.batch.azure.com/$metadata#pools/@Element",
              "id": "POOL-A",
              "vmSize": "standard_d2_v3",
              "state": "active",
              "allocationState": "steady",
              "targetDedicatedNodes": 1,
              "targetLowPriorityNodes": 1,
              "currentDedicatedNodes": 1,
              "currentLowPriorityNodes": 0
            }
        "#};
        let pool = Pool::from(serde_json::from_str::<PoolDto>(body).unwrap());
        assert_eq!(pool.state, PoolState::Active);
        assert_eq!(pool.allocation_state, AllocationState::Steady);
        assert_eq!(pool.current_dedicated_nodes, Some(1));
        assert_eq!(pool.current_low_priority_nodes, Some(0));
    }

    #[test]
    fn a_freshly_created_pool_has_no_current_counts() {
        let body = r#"{"id":"POOL-A","state":"active","allocationState":"resizing"}"#;
        let pool = Pool::from(serde_json::from_str::<PoolDto>(body).unwrap());
        assert_eq!(pool.allocation_state, AllocationState::Resizing);
        assert_eq!(pool.current_dedicated_nodes, None);
    }

    #[test]
    fn reads_the_job_pool_binding() {
        let body = r#"{"id":"JOB-A","state":"active","poolInfo":{"poolId":"POOL-B"}}"#;
        let job = Job::from(serde_json::from_str::<JobDto>(body).unwrap());
        assert_eq!(job.pool_id, "POOL-B");
        assert_eq!(job.state, JobState::Active);
    }

    #[test]
    fn task_list_maps_states_and_nodes() {
        let body = indoc! {r#"
            {
              "value": [
                {
                  "id": "Task-0",
                  "commandLine": "version --client=true",
                  "state": "completed",
                  "nodeInfo": { "nodeId": "tvm-1_1-20241001t080000z", "poolId": "POOL-A" },
                  "executionInfo": { "exitCode": 0, "result": "success" }
                },
                {
                  "id": "Task-1",
                  "state": "completed",
                  "nodeInfo": { "nodeId": "tvm-2", "poolId": "POOL-A" },
                  "executionInfo": { "exitCode": 1, "result": "failure" }
                },
                { "id": "Task-2", "state": "running", "nodeInfo": { "nodeId": "tvm-2" } },
                { "id": "Task-3", "state": "active" }
              ],
              "odata.nextLink": "https://acct.batch.azure.com/jobs/JOB-A/tasks?api-version=2023-05-01.17.0&$skiptoken=x"
            }
        "#};
        let list = serde_json::from_str::<TaskListDto>(body).unwrap();
        assert!(list.next_link.is_some());
        let tasks = list.value.into_iter().map(Task::from).collect::<Vec<_>>();

        assert_eq!(tasks[0].state, TaskState::Completed);
        assert_eq!(tasks[0].node_id(), Some("tvm-1_1-20241001t080000z"));
        assert_eq!(tasks[0].exit_code, Some(0));
        assert_eq!(tasks[1].state, TaskState::Failed);
        assert_eq!(tasks[2].state, TaskState::Running);
        assert_eq!(tasks[3].state, TaskState::Active);
        assert_eq!(tasks[3].node_id(), None);
    }

    #[test]
    fn task_add_results_map_to_errors() {
        let body = indoc! {r#"
            {
              "value": [
                { "status": "success", "taskId": "Task-0" },
                {
                  "status": "clienterror",
                  "taskId": "Task-1",
                  "error": { "code": "TaskExists", "message": { "value": "The specified task already exists." } }
                },
                {
                  "status": "servererror",
                  "taskId": "Task-2",
                  "error": { "code": "ServerBusy", "message": { "value": "Try again later." } }
                }
              ]
            }
        "#};
        let errors = serde_json::from_str::<TaskAddCollectionResultDto>(body)
            .unwrap()
            .value
            .into_iter()
            .map(TaskAddResultDto::into_error)
            .collect::<Vec<_>>();
        assert!(errors[0].is_none());
        assert!(matches!(
            &errors[1],
            Some(ComputeError::AlreadyExists { kind: ResourceKind::Task, id }) if id == "Task-1"
        ));
        assert!(matches!(
            &errors[2],
            Some(ComputeError::Rejected { status: 500, code, .. }) if code == "ServerBusy"
        ));
    }
}
