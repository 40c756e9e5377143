//! Workflows compose access guards, policy decisions and model mutation.
//!
//! A workflow validates everything before its first write, so a failed call
//! leaves state untouched.

pub mod deploy;
pub mod instance;
pub mod registry;

use crate::{ErrorKind, ThisError};

///
/// WorkflowError
///

#[derive(Debug, ThisError)]
pub enum WorkflowError {
    #[error(transparent)]
    Deploy(#[from] deploy::DeployError),

    #[error(transparent)]
    Instance(#[from] instance::InstanceWorkflowError),

    #[error(transparent)]
    Registry(#[from] registry::RegistryWorkflowError),
}

impl WorkflowError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Deploy(err) => err.kind(),
            Self::Instance(err) => err.kind(),
            Self::Registry(err) => err.kind(),
        }
    }
}
