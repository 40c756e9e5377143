mod log;
mod profile;
mod registry;

pub use log::*;
pub use profile::*;
pub use registry::*;

use crate::ThisError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

///
/// ConfigSchemaError
///

#[derive(Debug, ThisError)]
pub enum ConfigSchemaError {
    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("profile '{0}' is not defined")]
    UnknownProfile(String),
}

pub const NAME_MAX_BYTES: usize = 40;

fn validate_name_len(name: &str, context: &str) -> Result<(), ConfigSchemaError> {
    if name.is_empty() {
        return Err(ConfigSchemaError::ValidationError(format!(
            "{context} name must not be empty",
        )));
    }

    if name.len() > NAME_MAX_BYTES {
        return Err(ConfigSchemaError::ValidationError(format!(
            "{context} '{name}' exceeds {NAME_MAX_BYTES} bytes",
        )));
    }

    Ok(())
}

///
/// Validate
///

pub trait Validate {
    fn validate(&self) -> Result<(), ConfigSchemaError>;
}

///
/// ConfigModel
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigModel {
    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub blueprint: BlueprintConfig,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileConfig>,
}

impl ConfigModel {
    /// Look up a deployment profile by name.
    pub fn profile(&self, name: &str) -> Result<&ProfileConfig, ConfigSchemaError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigSchemaError::UnknownProfile(name.to_string()))
    }
}

impl Validate for ConfigModel {
    fn validate(&self) -> Result<(), ConfigSchemaError> {
        self.log.validate()?;
        self.blueprint.validate()?;

        for (name, profile) in &self.profiles {
            validate_name_len(name, "profile")?;
            profile.validate()?;
        }

        Ok(())
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ConfigError};

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = Config::parse_toml("").expect("empty config is valid");
        assert_eq!(cfg.registry.binding, BindingMode::Snapshot);
        assert_eq!(cfg.registry.creation, CreationPolicy::Open);
        assert_eq!(cfg.blueprint.name, "collection");
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = Config::parse_toml("[registry]\nmode = \"live\"").expect_err("unknown key");
        assert!(matches!(err, ConfigError::CannotParseToml(_)));
    }

    #[test]
    fn unknown_profile_lookup_fails() {
        let cfg = ConfigModel::default();
        let err = cfg.profile("mainnet").expect_err("no profiles defined");
        assert!(matches!(err, ConfigSchemaError::UnknownProfile(name) if name == "mainnet"));
    }
}
