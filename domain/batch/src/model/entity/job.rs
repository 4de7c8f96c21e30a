use std::fmt;

use super::MetadataItem;

/// A named unit of work bound to exactly one pool.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Job {
    pub id: String,
    pub pool_id: String,
    pub state: JobState,
    pub metadata: Vec<MetadataItem>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JobState {
    Active,
    Disabling,
    Disabled,
    Enabling,
    Terminating,
    Completed,
    Deleting,
    #[default]
    Unknown,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Active => "active",
            JobState::Disabling => "disabling",
            JobState::Disabled => "disabled",
            JobState::Enabling => "enabling",
            JobState::Terminating => "terminating",
            JobState::Completed => "completed",
            JobState::Deleting => "deleting",
            JobState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// What the orchestrator asks the service to create.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobSpec {
    pub id: String,
    pub pool_id: String,
    pub metadata: Vec<MetadataItem>,
}

impl From<&JobSpec> for Job {
    fn from(spec: &JobSpec) -> Self {
        Self {
            id: spec.id.clone(),
            pool_id: spec.pool_id.clone(),
            state: JobState::Active,
            metadata: spec.metadata.clone(),
        }
    }
}
