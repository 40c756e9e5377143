use crate::{
    ThisError, access::AccessError, config::ConfigError, ids::IdError, infra::InfraError,
    ledger::LedgerError, logic::LogicError, policy::PolicyError, workflow::WorkflowError,
};
use candid::CandidType;
use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// Error
///
/// Crate-wide error. Each layer owns its own `thiserror` enum and converts
/// into this one; callers classify failures through [`Error::kind`].
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    AccessError(#[from] AccessError),

    #[error(transparent)]
    ConfigError(#[from] ConfigError),

    #[error(transparent)]
    IdError(#[from] IdError),

    #[error(transparent)]
    InfraError(#[from] InfraError),

    #[error(transparent)]
    LedgerError(#[from] LedgerError),

    #[error(transparent)]
    LogicError(#[from] LogicError),

    #[error(transparent)]
    PolicyError(#[from] PolicyError),

    #[error(transparent)]
    WorkflowError(#[from] WorkflowError),
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AccessError(err) => err.kind(),
            Self::ConfigError(_) => ErrorKind::Config,
            Self::IdError(_) => ErrorKind::InvalidArgument,
            Self::InfraError(err) => err.kind(),
            Self::LedgerError(err) => err.kind(),
            Self::LogicError(err) => err.kind(),
            Self::PolicyError(err) => err.kind(),
            Self::WorkflowError(err) => err.kind(),
        }
    }

    /// Only infrastructure-level failures are worth retrying; everything else
    /// is a usage or logic bug and must surface immediately.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::TransientInfrastructureFailure
    }
}

///
/// ErrorKind
/// Caller-facing error taxonomy.
///

#[derive(CandidType, Clone, Copy, Debug, Display, Eq, PartialEq, Deserialize, Serialize)]
#[remain::sorted]
pub enum ErrorKind {
    AlreadyInitialized,
    Config,
    InvalidArgument,
    InvariantViolation,
    Logic,
    NotFound,
    NotInitialized,
    TransientInfrastructureFailure,
    Unauthorized,
}
