pub mod schema;

use crate::{ThisError, log, log::Topic};
use schema::{ConfigSchemaError, Validate};
use std::{cell::RefCell, sync::Arc};

pub use schema::ConfigModel;

//
// CONFIG
//
// Held per thread and set once. Arc keeps the model shareable with endpoints
// and the orchestrator without cloning the whole tree.
//

thread_local! {
    static CONFIG: RefCell<Option<Arc<ConfigModel>>> = const { RefCell::new(None) };
}

/// Errors related to configuration lifecycle and parsing.
#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("config has already been initialized")]
    AlreadyInitialized,

    #[error("config has not been initialized")]
    NotInitialized,

    /// TOML could not be parsed into the expected structure.
    #[error("toml error: {0}")]
    CannotParseToml(String),

    /// Wrapper for data schema-level errors.
    #[error(transparent)]
    ConfigSchema(#[from] ConfigSchemaError),
}

///
/// Config
///

pub struct Config {}

impl Config {
    pub fn get() -> Result<Arc<ConfigModel>, ConfigError> {
        Self::try_get().ok_or(ConfigError::NotInitialized)
    }

    #[must_use]
    pub fn try_get() -> Option<Arc<ConfigModel>> {
        CONFIG.with(|cfg| cfg.borrow().clone())
    }

    /// Parse and validate a TOML document without installing it.
    pub fn parse_toml(config_str: &str) -> Result<ConfigModel, ConfigError> {
        let config: ConfigModel =
            toml::from_str(config_str).map_err(|e| ConfigError::CannotParseToml(e.to_string()))?;

        // validate
        config.validate().map_err(ConfigError::from)?;

        Ok(config)
    }

    /// Initialize the global configuration from a TOML string.
    pub fn init_from_toml(config_str: &str) -> Result<Arc<ConfigModel>, ConfigError> {
        let config = Self::parse_toml(config_str)?;

        Self::install(config)
    }

    /// Return the current config as a TOML string.
    pub fn to_toml() -> Result<String, ConfigError> {
        let cfg = Self::get()?;

        toml::to_string_pretty(&*cfg).map_err(|e| ConfigError::CannotParseToml(e.to_string()))
    }

    /// Reset the thread's config so tests can reinitialize with a fresh TOML.
    #[doc(hidden)]
    pub fn reset_for_tests() {
        CONFIG.with(|cfg| {
            *cfg.borrow_mut() = None;
        });
    }

    fn install(config: ConfigModel) -> Result<Arc<ConfigModel>, ConfigError> {
        let arc = CONFIG.with(|cfg| {
            let mut borrow = cfg.borrow_mut();
            if borrow.is_some() {
                return Err(ConfigError::AlreadyInitialized);
            }

            let arc = Arc::new(config);
            *borrow = Some(arc.clone());

            Ok(arc)
        })?;

        log!(
            Topic::Config,
            Info,
            "config loaded: binding={} creation={} profiles={}",
            arc.registry.binding,
            arc.registry.creation,
            arc.profiles.len()
        );

        Ok(arc)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    const TOML: &str = r#"
        [registry]
        binding = "live"
        creation = "restricted"

        [profiles.local]
        endpoint = "file://.hatchery/local.ledger.jsonl"
        deployer = "2vxsx-fae"
    "#;

    #[test]
    fn init_installs_once() {
        Config::reset_for_tests();

        let cfg = Config::init_from_toml(TOML).expect("config parses");
        assert_eq!(cfg.profiles.len(), 1);
        assert!(Config::try_get().is_some());

        let err = Config::init_from_toml(TOML).expect_err("second init must fail");
        assert!(matches!(err, ConfigError::AlreadyInitialized));

        Config::reset_for_tests();
        assert!(matches!(Config::get(), Err(ConfigError::NotInitialized)));
    }

    #[test]
    fn unparseable_toml_is_reported() {
        let err = Config::parse_toml("registry = [").expect_err("broken toml");
        assert!(matches!(err, ConfigError::CannotParseToml(_)));
    }

    #[test]
    fn rendered_toml_parses_back() {
        Config::reset_for_tests();
        Config::init_from_toml(TOML).expect("config parses");

        let rendered = Config::to_toml().expect("render");
        let reparsed = Config::parse_toml(&rendered).expect("reparse");
        assert_eq!(reparsed.profiles.len(), 1);

        Config::reset_for_tests();
    }
}
