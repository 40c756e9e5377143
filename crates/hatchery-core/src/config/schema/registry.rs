use super::{ConfigSchemaError, Validate, validate_name_len};
use crate::model::BlueprintCode;
use candid::CandidType;
use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// BindingMode
///
/// Which blueprint an instance executes.
/// - `Snapshot`: the blueprint that was current when the instance was created.
/// - `Live`: whatever the registry currently designates.
///

#[derive(CandidType, Clone, Copy, Debug, Default, Display, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingMode {
    #[default]
    #[display("snapshot")]
    Snapshot,

    #[display("live")]
    Live,
}

///
/// CreationPolicy
/// Who may call `create_instance` on an initialized registry.
///

#[derive(CandidType, Clone, Copy, Debug, Default, Display, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CreationPolicy {
    #[default]
    #[display("open")]
    Open,

    /// Only holders of the creator role.
    #[display("restricted")]
    Restricted,
}

///
/// RegistryConfig
/// Fixed at registry deployment; never changes afterwards.
///

#[derive(CandidType, Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    #[serde(default)]
    pub binding: BindingMode,

    #[serde(default)]
    pub creation: CreationPolicy,
}

///
/// BlueprintConfig
/// Which catalog logic the orchestrator deploys as the blueprint.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BlueprintConfig {
    #[serde(default = "defaults::name")]
    pub name: String,

    #[serde(default = "defaults::version")]
    pub version: u32,
}

mod defaults {
    pub fn name() -> String {
        crate::logic::CollectionLogic::NAME.to_string()
    }

    pub const fn version() -> u32 {
        1
    }
}

impl BlueprintConfig {
    #[must_use]
    pub fn code(&self) -> BlueprintCode {
        BlueprintCode::new(self.name.clone(), self.version)
    }
}

impl Default for BlueprintConfig {
    fn default() -> Self {
        Self {
            name: defaults::name(),
            version: defaults::version(),
        }
    }
}

impl Validate for BlueprintConfig {
    fn validate(&self) -> Result<(), ConfigSchemaError> {
        validate_name_len(&self.name, "blueprint")?;

        if self.version == 0 {
            return Err(ConfigSchemaError::ValidationError(
                "blueprint.version must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
