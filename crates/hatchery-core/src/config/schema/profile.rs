use super::{ConfigSchemaError, Validate};
use crate::ids::Identity;
use serde::{Deserialize, Serialize};
use std::time::Duration;

///
/// Defaults
///

mod defaults {
    pub const fn confirmation_timeout_ms() -> u64 {
        30_000
    }

    pub const fn max_attempts() -> u32 {
        5
    }

    pub const fn initial_backoff_ms() -> u64 {
        200
    }

    pub const fn max_backoff_ms() -> u64 {
        5_000
    }
}

pub const MAX_RETRY_ATTEMPTS: u32 = 32;

///
/// ProfileConfig
///
/// A named deployment target. The endpoint is a URL; `deployer` is the
/// identity every orchestrator transaction is signed as.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    pub endpoint: String,

    pub deployer: Identity,

    #[serde(default = "defaults::confirmation_timeout_ms")]
    pub confirmation_timeout_ms: u64,

    #[serde(default)]
    pub retry: RetryConfig,
}

impl ProfileConfig {
    #[must_use]
    pub const fn confirmation_timeout(&self) -> Duration {
        Duration::from_millis(self.confirmation_timeout_ms)
    }
}

impl Validate for ProfileConfig {
    fn validate(&self) -> Result<(), ConfigSchemaError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigSchemaError::ValidationError(
                "profile endpoint must not be empty".to_string(),
            ));
        }

        if self.deployer.is_null() {
            return Err(ConfigSchemaError::ValidationError(
                "profile deployer must not be the null identity".to_string(),
            ));
        }

        self.retry.validate()
    }
}

///
/// RetryConfig
/// Backoff schedule for transient infrastructure failures.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "defaults::initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "defaults::max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            initial_backoff_ms: defaults::initial_backoff_ms(),
            max_backoff_ms: defaults::max_backoff_ms(),
        }
    }
}

impl Validate for RetryConfig {
    fn validate(&self) -> Result<(), ConfigSchemaError> {
        if self.max_attempts == 0 || self.max_attempts > MAX_RETRY_ATTEMPTS {
            return Err(ConfigSchemaError::ValidationError(format!(
                "retry.max_attempts must be between 1 and {MAX_RETRY_ATTEMPTS}, got {}",
                self.max_attempts
            )));
        }

        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err(ConfigSchemaError::ValidationError(format!(
                "retry.initial_backoff_ms {} exceeds retry.max_backoff_ms {}",
                self.initial_backoff_ms, self.max_backoff_ms
            )));
        }

        Ok(())
    }
}

///
/// TESTS
///
