use std::fmt;

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Pool,
    Job,
    Task,
    NodeFile,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceKind::Pool => "pool",
            ResourceKind::Job => "job",
            ResourceKind::Task => "task",
            ResourceKind::NodeFile => "node file",
        };
        f.write_str(s)
    }
}

/// Failures reported by the remote compute service.
#[derive(Error, Debug)]
pub enum ComputeError {
    #[error("The {kind} {id} already exists.")]
    AlreadyExists { kind: ResourceKind, id: String },

    #[error("The {kind} {id} does not exist.")]
    NotFound { kind: ResourceKind, id: String },

    #[error("Request rejected with status {status}, code: {code}: {message}")]
    Rejected {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Unable to reach the compute service: {source}")]
    Transport {
        #[source]
        source: anyhow::Error,
    },
}

impl ComputeError {
    pub fn is_already_exists(&self) -> bool {
        matches!(self, ComputeError::AlreadyExists { .. })
    }
}

impl From<anyhow::Error> for ComputeError {
    fn from(e: anyhow::Error) -> Self {
        ComputeError::Transport { source: e }
    }
}
