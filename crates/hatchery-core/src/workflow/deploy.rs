//! Deployment orchestration: blueprint, registry shell, initialize, verify.
//!
//! The sequence is not atomic. Completed steps are recorded in a
//! [`DeploymentCheckpoint`] so a re-run skips them; a failure aborts the run
//! without compensating for what already landed.

use crate::{
    Error, ErrorKind, ThisError,
    config::schema::{ConfigModel, ConfigSchemaError, RegistryConfig, RetryConfig},
    ids::{Identity, LogicRef, RegistryRef, RoleKind},
    infra::Endpoint,
    ledger::{Command, Outcome},
    log,
    log::Topic,
    model::{BlueprintCode, RegistryState},
    workflow::WorkflowError,
};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::{thread, time::Duration};

///
/// DeployError
///

#[derive(Debug, ThisError)]
pub enum DeployError {
    #[error("checkpoint does not match the plan: {0}")]
    CheckpointMismatch(String),

    #[error("step {step} returned an unexpected outcome: {outcome}")]
    UnexpectedOutcome { step: DeployStep, outcome: String },

    #[error("registry {registry} failed verification: {reason}")]
    VerificationFailed {
        registry: RegistryRef,
        reason: String,
    },
}

impl DeployError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::CheckpointMismatch(_) => ErrorKind::InvalidArgument,
            Self::UnexpectedOutcome { .. } | Self::VerificationFailed { .. } => {
                ErrorKind::InvariantViolation
            }
        }
    }
}

impl From<DeployError> for Error {
    fn from(err: DeployError) -> Self {
        WorkflowError::from(err).into()
    }
}

///
/// DeployStep
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum DeployStep {
    #[display("deploy_blueprint")]
    Blueprint,

    #[display("deploy_registry")]
    Registry,

    #[display("initialize")]
    Initialize,

    #[display("verify")]
    Verify,
}

///
/// DeployPlan
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeployPlan {
    pub deployer: Identity,
    pub admin: Identity,
    pub upgrader: Identity,
    pub blueprint: BlueprintCode,
    pub registry: RegistryConfig,
}

impl DeployPlan {
    /// Plan for `profile`; admin and upgrader default to the profile deployer.
    pub fn from_config(
        config: &ConfigModel,
        profile: &str,
        admin: Option<Identity>,
        upgrader: Option<Identity>,
    ) -> Result<Self, ConfigSchemaError> {
        let deployer = config.profile(profile)?.deployer;

        Ok(Self {
            deployer,
            admin: admin.unwrap_or(deployer),
            upgrader: upgrader.unwrap_or(deployer),
            blueprint: config.blueprint.code(),
            registry: config.registry,
        })
    }
}

///
/// DeploymentCheckpoint
/// Addresses of the steps that already completed.
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct DeploymentCheckpoint {
    #[serde(default)]
    pub blueprint: Option<LogicRef>,

    #[serde(default)]
    pub registry: Option<RegistryRef>,
}

impl DeploymentCheckpoint {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.blueprint.is_none() && self.registry.is_none()
    }
}

///
/// DeploymentOutcome
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeploymentOutcome {
    pub blueprint: LogicRef,
    pub registry: RegistryRef,
    pub resumed: bool,
}

///
/// RetryPolicy
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Single attempt, no waiting.
    pub const NONE: Self = Self {
        max_attempts: 1,
        initial_backoff: Duration::ZERO,
        max_backoff: Duration::ZERO,
    };

    /// Delay after failed attempt number `attempt` (1-based):
    /// `initial_backoff * 2^(attempt-1)`, capped at `max_backoff`.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return self.initial_backoff.min(self.max_backoff);
        }
        let exp = (attempt - 1).min(16);
        let factor = 1u128 << exp;
        let scaled_ms = self.initial_backoff.as_millis().saturating_mul(factor);
        let bounded_ms = scaled_ms.min(self.max_backoff.as_millis());

        Duration::from_millis(u64::try_from(bounded_ms).unwrap_or(u64::MAX))
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            initial_backoff: Duration::from_millis(cfg.initial_backoff_ms),
            max_backoff: Duration::from_millis(cfg.max_backoff_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

///
/// CheckpointSink
/// Called with the checkpoint every time a step lands.
///

pub type CheckpointSink = Box<dyn FnMut(&DeploymentCheckpoint) -> Result<(), Error>>;

///
/// DeploymentOrchestrator
///

pub struct DeploymentOrchestrator<E> {
    endpoint: E,
    retry: RetryPolicy,
    sleep: fn(Duration),
    sink: Option<CheckpointSink>,
}

impl<E: Endpoint> DeploymentOrchestrator<E> {
    pub fn new(endpoint: E, retry: RetryPolicy) -> Self {
        Self {
            endpoint,
            retry,
            sleep: thread::sleep,
            sink: None,
        }
    }

    /// Persist the checkpoint as soon as each step lands, before the next
    /// one starts.
    #[must_use]
    pub fn with_checkpoint_sink(
        mut self,
        sink: impl FnMut(&DeploymentCheckpoint) -> Result<(), Error> + 'static,
    ) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Replace how backoff delays are waited out.
    #[must_use]
    pub fn with_sleep(mut self, sleep: fn(Duration)) -> Self {
        self.sleep = sleep;
        self
    }

    pub const fn endpoint(&self) -> &E {
        &self.endpoint
    }

    pub fn into_endpoint(self) -> E {
        self.endpoint
    }

    /// Run the plan, skipping steps already recorded in `checkpoint`.
    ///
    /// `checkpoint` is updated (and handed to the sink, if any) as each step
    /// lands, so it reflects progress even when the run fails.
    pub fn run(
        &mut self,
        plan: &DeployPlan,
        checkpoint: &mut DeploymentCheckpoint,
    ) -> Result<DeploymentOutcome, Error> {
        let resumed = !checkpoint.is_empty();
        if resumed {
            log!(
                Topic::Deploy,
                Info,
                "resuming deployment (blueprint={:?}, registry={:?})",
                checkpoint.blueprint,
                checkpoint.registry
            );
        }

        let blueprint = self.ensure_blueprint(plan, checkpoint)?;
        let registry = self.ensure_registry(plan, checkpoint)?;
        self.initialize(plan, registry, blueprint, resumed)?;
        self.verify(plan, registry, blueprint)?;

        log!(
            Topic::Deploy,
            Ok,
            "deployment complete: blueprint={blueprint} registry={registry}"
        );

        Ok(DeploymentOutcome {
            blueprint,
            registry,
            resumed,
        })
    }

    fn ensure_blueprint(
        &mut self,
        plan: &DeployPlan,
        checkpoint: &mut DeploymentCheckpoint,
    ) -> Result<LogicRef, Error> {
        if let Some(address) = checkpoint.blueprint {
            let deployed = self.retry(DeployStep::Blueprint, |ep, _| ep.blueprint(address))?;
            if deployed.code() != plan.blueprint {
                return Err(DeployError::CheckpointMismatch(format!(
                    "blueprint {address} is {}, plan wants {}",
                    deployed.code(),
                    plan.blueprint
                ))
                .into());
            }
            log!(Topic::Deploy, Info, "blueprint {address} already deployed, skipping");

            return Ok(address);
        }

        let command = Command::DeployBlueprint {
            code: plan.blueprint.clone(),
        };
        let outcome = self.retry(DeployStep::Blueprint, |ep, _| {
            ep.submit(plan.deployer, command.clone())
        })?;
        let Outcome::BlueprintDeployed(address) = outcome.outcome else {
            return Err(unexpected(DeployStep::Blueprint, &outcome.outcome));
        };
        checkpoint.blueprint = Some(address);
        self.record(checkpoint)?;

        log!(Topic::Deploy, Ok, "blueprint {} deployed at {address}", plan.blueprint);

        Ok(address)
    }

    fn ensure_registry(
        &mut self,
        plan: &DeployPlan,
        checkpoint: &mut DeploymentCheckpoint,
    ) -> Result<RegistryRef, Error> {
        if let Some(address) = checkpoint.registry {
            let state = self.retry(DeployStep::Registry, |ep, _| ep.registry(address))?;
            if state.config() != plan.registry {
                return Err(DeployError::CheckpointMismatch(format!(
                    "registry {address} was deployed with binding={} creation={}",
                    state.config().binding,
                    state.config().creation
                ))
                .into());
            }
            log!(Topic::Deploy, Info, "registry {address} already deployed, skipping");

            return Ok(address);
        }

        let command = Command::DeployRegistry {
            config: plan.registry,
        };
        let outcome = self.retry(DeployStep::Registry, |ep, _| {
            ep.submit(plan.deployer, command.clone())
        })?;
        let Outcome::RegistryDeployed(address) = outcome.outcome else {
            return Err(unexpected(DeployStep::Registry, &outcome.outcome));
        };
        checkpoint.registry = Some(address);
        self.record(checkpoint)?;

        log!(Topic::Deploy, Ok, "registry shell deployed at {address}");

        Ok(address)
    }

    fn initialize(
        &mut self,
        plan: &DeployPlan,
        registry: RegistryRef,
        blueprint: LogicRef,
        resumed: bool,
    ) -> Result<(), Error> {
        let command = Command::Initialize {
            registry,
            admin: plan.admin,
            upgrader: plan.upgrader,
            blueprint,
        };

        let result = self.retry(DeployStep::Initialize, |ep, attempt| {
            match ep.submit(plan.deployer, command.clone()) {
                // an earlier attempt may have landed before its receipt was lost
                Err(err)
                    if err.kind() == ErrorKind::AlreadyInitialized && (resumed || attempt > 1) =>
                {
                    log!(
                        Topic::Deploy,
                        Warn,
                        "registry {registry} already initialized, moving to verification"
                    );
                    Ok(None)
                }
                other => other.map(Some),
            }
        })?;

        if let Some(receipt) = result {
            if receipt.outcome != Outcome::Initialized {
                return Err(unexpected(DeployStep::Initialize, &receipt.outcome));
            }
            log!(Topic::Deploy, Ok, "registry {registry} initialized");
        }

        Ok(())
    }

    fn verify(
        &mut self,
        plan: &DeployPlan,
        registry: RegistryRef,
        blueprint: LogicRef,
    ) -> Result<(), Error> {
        let state = self.retry(DeployStep::Verify, |ep, _| ep.registry(registry))?;

        verify_registry(&state, plan, blueprint).map_err(|reason| {
            log!(Topic::Deploy, Error, "registry {registry} failed verification: {reason}");

            DeployError::VerificationFailed { registry, reason }.into()
        })
    }

    fn record(&mut self, checkpoint: &DeploymentCheckpoint) -> Result<(), Error> {
        match self.sink.as_mut() {
            Some(sink) => sink(checkpoint),
            None => Ok(()),
        }
    }

    fn retry<T>(
        &mut self,
        step: DeployStep,
        mut op: impl FnMut(&mut E, u32) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let mut attempt = 1;

        loop {
            match op(&mut self.endpoint, attempt) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.backoff(attempt);
                    log!(
                        Topic::Deploy,
                        Warn,
                        "{step} attempt {attempt}/{} failed: {err}; retrying in {}ms",
                        self.retry.max_attempts,
                        delay.as_millis()
                    );
                    (self.sleep)(delay);
                    attempt += 1;
                }
                Err(err) => {
                    log!(Topic::Deploy, Error, "{step} failed after {attempt} attempt(s): {err}");
                    return Err(err);
                }
            }
        }
    }
}

fn verify_registry(
    state: &RegistryState,
    plan: &DeployPlan,
    blueprint: LogicRef,
) -> Result<(), String> {
    if !state.is_initialized() {
        return Err("registry is not initialized".to_string());
    }

    match state.current_blueprint() {
        Some(current) if current == blueprint => {}
        Some(current) => {
            return Err(format!("current blueprint is {current}, expected {blueprint}"));
        }
        None => return Err("registry has no current blueprint".to_string()),
    }

    for (kind, holder) in [
        (RoleKind::Admin, plan.admin),
        (RoleKind::Upgrader, plan.upgrader),
    ] {
        if !state.roles().is_holder(kind, holder) {
            return Err(format!("{holder} does not hold {kind}"));
        }
    }

    Ok(())
}

fn unexpected(step: DeployStep, outcome: &Outcome) -> Error {
    DeployError::UnexpectedOutcome {
        step,
        outcome: format!("{outcome:?}"),
    }
    .into()
}

///
/// TESTS
///
