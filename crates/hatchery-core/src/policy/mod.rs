//! Deterministic decision rules. Policies read state and answer yes/no; they
//! never mutate.

pub mod binding;
pub mod registry;

use crate::{ErrorKind, ThisError};

///
/// PolicyError
///

#[derive(Debug, ThisError)]
pub enum PolicyError {
    #[error(transparent)]
    RegistryPolicy(#[from] registry::RegistryPolicyError),
}

impl PolicyError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::RegistryPolicy(err) => err.kind(),
        }
    }
}
