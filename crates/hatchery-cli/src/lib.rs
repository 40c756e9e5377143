//! Operator CLI for deploying and inspecting hatchery registries.
//!
//! `main.rs` only parses arguments and maps the result to an exit code; the
//! commands live here so they can be exercised from tests.

pub mod checkpoint;
pub mod cli;
pub mod deploy;
pub mod inspect;

use hatchery_core::{
    ThisError,
    config::{
        Config, ConfigError, ConfigModel,
        schema::{ConfigSchemaError, ProfileConfig},
    },
    infra::FileEndpoint,
    logic::LogicCatalog,
};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

pub const DEFAULT_CONFIG: &str = "hatchery.toml";

///
/// CliError
///

#[derive(Debug, ThisError)]
pub enum CliError {
    #[error("cannot read {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("checkpoint {path}: {reason}")]
    Checkpoint { path: PathBuf, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Core(#[from] hatchery_core::Error),

    #[error("cannot render output: {0}")]
    Render(#[from] serde_json::Error),
}

impl From<ConfigSchemaError> for CliError {
    fn from(err: ConfigSchemaError) -> Self {
        Self::Config(err.into())
    }
}

/// Read, validate and install the config file.
pub fn load_config(path: &Path) -> Result<Arc<ConfigModel>, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(Config::init_from_toml(&text)?)
}

/// Open the ledger a profile points at. Only `file://` endpoints are served.
pub fn open_endpoint(profile: &ProfileConfig) -> Result<FileEndpoint, CliError> {
    let endpoint = FileEndpoint::from_url(
        &profile.endpoint,
        LogicCatalog::builtin(),
        profile.confirmation_timeout(),
    )?;

    Ok(endpoint)
}

///
/// TESTS
///
