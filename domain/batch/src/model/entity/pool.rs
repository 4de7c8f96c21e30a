use std::fmt;

use super::MetadataItem;

/// A named allocation of compute nodes on the remote service.
///
/// Owned by the service; the orchestrator only ever holds a snapshot of it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pool {
    pub id: String,
    pub vm_size: String,
    pub state: PoolState,
    pub allocation_state: AllocationState,
    pub target_dedicated_nodes: u32,
    pub target_low_priority_nodes: u32,
    /// `None` until the service reports the first allocation.
    pub current_dedicated_nodes: Option<u32>,
    pub current_low_priority_nodes: Option<u32>,
    pub metadata: Vec<MetadataItem>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PoolState {
    Active,
    Deleting,
    #[default]
    Unknown,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AllocationState {
    Steady,
    Resizing,
    Stopping,
    #[default]
    Unknown,
}

impl fmt::Display for AllocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AllocationState::Steady => "steady",
            AllocationState::Resizing => "resizing",
            AllocationState::Stopping => "stopping",
            AllocationState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// What the orchestrator asks the service to create.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolSpec {
    pub id: String,
    pub vm_size: String,
    pub target_dedicated_nodes: u32,
    pub target_low_priority_nodes: u32,
    pub vm_config: VirtualMachineConfiguration,
    pub metadata: Vec<MetadataItem>,
}

impl From<&PoolSpec> for Pool {
    fn from(spec: &PoolSpec) -> Self {
        Self {
            id: spec.id.clone(),
            vm_size: spec.vm_size.clone(),
            state: PoolState::Active,
            allocation_state: AllocationState::Resizing,
            target_dedicated_nodes: spec.target_dedicated_nodes,
            target_low_priority_nodes: spec.target_low_priority_nodes,
            current_dedicated_nodes: None,
            current_low_priority_nodes: None,
            metadata: spec.metadata.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VirtualMachineConfiguration {
    pub image_reference: ImageReference,
    pub node_agent_sku_id: String,
    pub container_configuration: Option<ContainerConfiguration>,
}

/// A custom VM image, e.g. from a shared image gallery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageReference {
    pub virtual_machine_image_id: String,
}

/// Container runtime set up on every node, with images pulled ahead of the first task.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContainerConfiguration {
    pub container_image_names: Vec<String>,
    pub container_registries: Vec<ContainerRegistry>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct ContainerRegistry {
    pub registry_server: String,
    pub user_name: String,
    pub password: String,
}

impl fmt::Debug for ContainerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerRegistry")
            .field("registry_server", &self.registry_server)
            .field("user_name", &self.user_name)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_password_is_not_printed() {
        let registry = ContainerRegistry {
            registry_server: "registry.example.io".to_string(),
            user_name: "robot".to_string(),
            password: "hunter2".to_string(),
        };
        let printed = format!("{registry:?}");
        assert!(printed.contains("registry.example.io"));
        assert!(!printed.contains("hunter2"));
    }
}
