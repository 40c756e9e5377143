use crate::{
    Error, ErrorKind, ThisError, access,
    event::RegistryEvent,
    ids::{Identity, InstanceRef, LogicRef, RegistryRef, RoleKind},
    log,
    log::Topic,
    model::{BlueprintLookup, CreateParams, InstanceRecord, RegistryState},
    policy::registry::RegistryPolicy,
    workflow::WorkflowError,
};

///
/// RegistryWorkflowError
///

#[derive(Debug, ThisError)]
pub enum RegistryWorkflowError {
    #[error("registry {0} is initialized but has no current blueprint")]
    CurrentBlueprintMissing(RegistryRef),
}

impl RegistryWorkflowError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::CurrentBlueprintMissing(_) => ErrorKind::InvariantViolation,
        }
    }
}

impl From<RegistryWorkflowError> for Error {
    fn from(err: RegistryWorkflowError) -> Self {
        WorkflowError::from(err).into()
    }
}

///
/// InitArgs
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct InitArgs {
    pub admin: Identity,
    pub upgrader: Identity,
    pub blueprint: LogicRef,
}

///
/// RegistryWorkflow
///
/// The registry state machine. Each operation runs, in order: the one-shot
/// initialization check, the role guard, the policy check, then mutation.
///

pub struct RegistryWorkflow;

impl RegistryWorkflow {
    pub fn initialize(
        state: &mut RegistryState,
        blueprints: &impl BlueprintLookup,
        args: InitArgs,
    ) -> Result<RegistryEvent, Error> {
        let InitArgs {
            admin,
            upgrader,
            blueprint,
        } = args;

        RegistryPolicy::can_initialize(state, admin, upgrader, blueprint, blueprints)?;

        state.roles.insert(RoleKind::Admin, admin);
        state.roles.insert(RoleKind::Upgrader, upgrader);
        state.roles.insert(RoleKind::Creator, admin);
        state.mark_initialized(blueprint);

        log!(
            Topic::Registry,
            Ok,
            "registry {} initialized admin={admin} upgrader={upgrader} blueprint={blueprint}",
            state.address
        );

        Ok(RegistryEvent::Initialized {
            admin,
            upgrader,
            blueprint,
        })
    }

    pub fn create_instance(
        state: &mut RegistryState,
        caller: Identity,
        params: CreateParams,
        address: InstanceRef,
        now: u64,
    ) -> Result<(InstanceRecord, RegistryEvent), Error> {
        RegistryPolicy::require_initialized(state)?;
        access::require_creator(state.config.creation, &state.roles, caller)?;

        let owner = params.owner.unwrap_or(caller);
        RegistryPolicy::can_create(owner)?;

        let blueprint = state
            .current_blueprint()
            .ok_or(RegistryWorkflowError::CurrentBlueprintMissing(state.address))?;

        let id = state.allocate_instance_id();
        let record = InstanceRecord {
            id,
            address,
            bound_blueprint: blueprint,
            owner,
            created_at: now,
        };
        state.insert_instance(record.clone());

        log!(
            Topic::Registry,
            Info,
            "registry {} created instance #{id} at {address} bound to {blueprint}",
            state.address
        );

        Ok((
            record,
            RegistryEvent::InstanceCreated {
                id,
                address,
                blueprint,
                owner,
            },
        ))
    }

    pub fn upgrade_blueprint(
        state: &mut RegistryState,
        blueprints: &impl BlueprintLookup,
        caller: Identity,
        blueprint: LogicRef,
    ) -> Result<(LogicRef, RegistryEvent), Error> {
        RegistryPolicy::require_initialized(state)?;
        access::require_role(&state.roles, caller, RoleKind::Upgrader)?;
        RegistryPolicy::can_upgrade(state, blueprint, blueprints)?;

        let old = state
            .swap_blueprint(blueprint)
            .ok_or(RegistryWorkflowError::CurrentBlueprintMissing(state.address))?;

        log!(
            Topic::Registry,
            Ok,
            "registry {} upgraded blueprint {old} -> {blueprint} by {caller}",
            state.address
        );

        Ok((
            old,
            RegistryEvent::BlueprintUpgraded {
                old,
                new: blueprint,
            },
        ))
    }

    pub fn grant_role(
        state: &mut RegistryState,
        caller: Identity,
        kind: RoleKind,
        identity: Identity,
    ) -> Result<RegistryEvent, Error> {
        RegistryPolicy::require_initialized(state)?;
        access::require_role(&state.roles, caller, RoleKind::Admin)?;
        RegistryPolicy::can_grant(state, kind, identity)?;

        state.roles.insert(kind, identity);

        log!(
            Topic::Registry,
            Info,
            "registry {} granted {kind} to {identity} by {caller}",
            state.address
        );

        Ok(RegistryEvent::RoleGranted {
            kind,
            identity,
            by: caller,
        })
    }

    pub fn revoke_role(
        state: &mut RegistryState,
        caller: Identity,
        kind: RoleKind,
        identity: Identity,
    ) -> Result<RegistryEvent, Error> {
        RegistryPolicy::require_initialized(state)?;
        access::require_role(&state.roles, caller, RoleKind::Admin)?;
        RegistryPolicy::can_revoke(state, kind, identity)?;

        state.roles.remove(kind, identity);

        log!(
            Topic::Registry,
            Info,
            "registry {} revoked {kind} from {identity} by {caller}",
            state.address
        );

        Ok(RegistryEvent::RoleRevoked {
            kind,
            identity,
            by: caller,
        })
    }
}

///
/// TESTS
///
