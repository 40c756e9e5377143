//! Endpoints: how the orchestrator and the CLI reach a ledger.
//!
//! An [`Endpoint`] accepts commands on behalf of a caller and answers
//! read-only queries. Infra failures (I/O, lock contention, an endpoint that
//! stops answering) surface as [`ErrorKind::TransientInfrastructureFailure`]
//! and are the only errors the orchestrator retries.

mod file;
mod local;

pub use file::{FileEndpoint, parse_url};
pub use local::LocalEndpoint;

use crate::{
    Error, ErrorKind, ThisError,
    ids::{Identity, InstanceRef, LogicRef, RegistryRef},
    ledger::{Command, Receipt},
    model::{Blueprint, InstanceState, RegistryState},
};
use std::{
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

pub const FILE_SCHEME: &str = "file://";

///
/// InfraError
///

#[derive(Debug, ThisError)]
pub enum InfraError {
    #[error("endpoint unavailable: {0}")]
    Unavailable(String),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no confirmation from {path} within {waited_ms}ms")]
    ConfirmationTimeout { path: PathBuf, waited_ms: u64 },

    #[error("unsupported endpoint '{0}': only {FILE_SCHEME} endpoints are served")]
    UnsupportedEndpoint(String),

    #[error("corrupt journal {path} at line {line}: {reason}")]
    CorruptJournal {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

impl InfraError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unavailable(_) | Self::Io { .. } | Self::ConfirmationTimeout { .. } => {
                ErrorKind::TransientInfrastructureFailure
            }
            Self::UnsupportedEndpoint(_) => ErrorKind::Config,
            Self::CorruptJournal { .. } => ErrorKind::InvariantViolation,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

///
/// Endpoint
///

pub trait Endpoint {
    /// Submit `command` as `caller` and wait for its receipt.
    fn submit(&mut self, caller: Identity, command: Command) -> Result<Receipt, Error>;

    fn blueprint(&self, address: LogicRef) -> Result<Blueprint, Error>;

    fn registry(&self, address: RegistryRef) -> Result<RegistryState, Error>;

    fn instance(&self, address: InstanceRef) -> Result<InstanceState, Error>;
}

impl<E: Endpoint + ?Sized> Endpoint for &mut E {
    fn submit(&mut self, caller: Identity, command: Command) -> Result<Receipt, Error> {
        (**self).submit(caller, command)
    }

    fn blueprint(&self, address: LogicRef) -> Result<Blueprint, Error> {
        (**self).blueprint(address)
    }

    fn registry(&self, address: RegistryRef) -> Result<RegistryState, Error> {
        (**self).registry(address)
    }

    fn instance(&self, address: InstanceRef) -> Result<InstanceState, Error> {
        (**self).instance(address)
    }
}

/// Wall-clock milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}
