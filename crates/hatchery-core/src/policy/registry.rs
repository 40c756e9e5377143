use crate::{
    Error, ErrorKind, ThisError,
    ids::{Identity, LogicRef, RoleKind},
    model::{BlueprintLookup, RegistryState},
    policy::PolicyError,
};

///
/// RegistryPolicyError
/// Errors raised while evaluating registry state transitions.
///

#[derive(Debug, ThisError)]
pub enum RegistryPolicyError {
    #[error("registry is already initialized")]
    AlreadyInitialized,

    #[error("registry is not initialized")]
    NotInitialized,

    #[error("{0} must not be null")]
    NullArgument(&'static str),

    #[error("blueprint {0} is not deployed")]
    UnknownBlueprint(LogicRef),

    #[error("blueprint {0} is already current")]
    UnchangedBlueprint(LogicRef),

    #[error("{identity} already holds the {kind} role")]
    AlreadyHolder { kind: RoleKind, identity: Identity },

    #[error("{identity} does not hold the {kind} role")]
    NotHolder { kind: RoleKind, identity: Identity },

    #[error("revoking {identity} would leave the {kind} role without holders")]
    LastHolder { kind: RoleKind, identity: Identity },
}

impl RegistryPolicyError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyInitialized => ErrorKind::AlreadyInitialized,
            Self::NotInitialized => ErrorKind::NotInitialized,
            Self::NullArgument(_)
            | Self::UnknownBlueprint(_)
            | Self::UnchangedBlueprint(_)
            | Self::AlreadyHolder { .. }
            | Self::NotHolder { .. } => ErrorKind::InvalidArgument,
            Self::LastHolder { .. } => ErrorKind::InvariantViolation,
        }
    }
}

impl From<RegistryPolicyError> for Error {
    fn from(err: RegistryPolicyError) -> Self {
        PolicyError::from(err).into()
    }
}

///
/// RegistryPolicy
///

pub struct RegistryPolicy;

impl RegistryPolicy {
    /// The one-shot flag checked before every post-initialization mutation.
    pub const fn require_initialized(state: &RegistryState) -> Result<(), RegistryPolicyError> {
        if state.is_initialized() {
            Ok(())
        } else {
            Err(RegistryPolicyError::NotInitialized)
        }
    }

    pub fn can_initialize(
        state: &RegistryState,
        admin: Identity,
        upgrader: Identity,
        blueprint: LogicRef,
        blueprints: &impl BlueprintLookup,
    ) -> Result<(), RegistryPolicyError> {
        if state.is_initialized() {
            return Err(RegistryPolicyError::AlreadyInitialized);
        }

        if admin.is_null() {
            return Err(RegistryPolicyError::NullArgument("admin"));
        }
        if upgrader.is_null() {
            return Err(RegistryPolicyError::NullArgument("upgrader"));
        }
        if blueprint.is_null() {
            return Err(RegistryPolicyError::NullArgument("blueprint"));
        }

        if !blueprints.contains_blueprint(blueprint) {
            return Err(RegistryPolicyError::UnknownBlueprint(blueprint));
        }

        Ok(())
    }

    pub fn can_create(owner: Identity) -> Result<(), RegistryPolicyError> {
        if owner.is_null() {
            return Err(RegistryPolicyError::NullArgument("owner"));
        }

        Ok(())
    }

    pub fn can_upgrade(
        state: &RegistryState,
        blueprint: LogicRef,
        blueprints: &impl BlueprintLookup,
    ) -> Result<(), RegistryPolicyError> {
        if blueprint.is_null() {
            return Err(RegistryPolicyError::NullArgument("blueprint"));
        }

        if state.current_blueprint() == Some(blueprint) {
            return Err(RegistryPolicyError::UnchangedBlueprint(blueprint));
        }

        if !blueprints.contains_blueprint(blueprint) {
            return Err(RegistryPolicyError::UnknownBlueprint(blueprint));
        }

        Ok(())
    }

    pub fn can_grant(
        state: &RegistryState,
        kind: RoleKind,
        identity: Identity,
    ) -> Result<(), RegistryPolicyError> {
        if identity.is_null() {
            return Err(RegistryPolicyError::NullArgument("identity"));
        }

        if state.roles().is_holder(kind, identity) {
            return Err(RegistryPolicyError::AlreadyHolder { kind, identity });
        }

        Ok(())
    }

    pub fn can_revoke(
        state: &RegistryState,
        kind: RoleKind,
        identity: Identity,
    ) -> Result<(), RegistryPolicyError> {
        if !state.roles().is_holder(kind, identity) {
            return Err(RegistryPolicyError::NotHolder { kind, identity });
        }

        if state.roles().holder_count(kind) <= 1 {
            return Err(RegistryPolicyError::LastHolder { kind, identity });
        }

        Ok(())
    }
}

///
/// TESTS
///
