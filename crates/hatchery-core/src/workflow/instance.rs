use crate::{
    Error, ErrorKind, ThisError,
    ids::{Identity, InstanceId, LogicRef, RegistryRef},
    log,
    log::Topic,
    logic::{Context, LogicCatalog},
    model::{Blueprint, InstanceRecord, InstanceState, RegistryState},
    policy::binding::BindingPolicy,
    workflow::WorkflowError,
};
use std::collections::BTreeMap;

///
/// InstanceWorkflowError
///

#[derive(Debug, ThisError)]
pub enum InstanceWorkflowError {
    #[error("instance #{id} is missing from registry {registry}")]
    NotInDirectory { registry: RegistryRef, id: InstanceId },

    #[error("registry {0} has instances but no current blueprint")]
    CurrentBlueprintMissing(RegistryRef),

    #[error("bound blueprint {0} is not on the ledger")]
    BlueprintMissing(LogicRef),
}

impl InstanceWorkflowError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotInDirectory { .. }
            | Self::CurrentBlueprintMissing(_)
            | Self::BlueprintMissing(_) => ErrorKind::InvariantViolation,
        }
    }
}

impl From<InstanceWorkflowError> for Error {
    fn from(err: InstanceWorkflowError) -> Self {
        WorkflowError::from(err).into()
    }
}

///
/// InstanceWorkflow
///
/// Delegates an instance call to the blueprint its registry's binding mode
/// selects. Storage is only replaced once logic returns successfully.
///

pub struct InstanceWorkflow;

impl InstanceWorkflow {
    /// Blueprint a call on `instance` would execute right now.
    pub fn resolve(registry: &RegistryState, instance: &InstanceState) -> Result<LogicRef, Error> {
        Self::binding(registry, instance).map(|(_, target)| target)
    }

    pub fn call(
        registry: &RegistryState,
        blueprints: &BTreeMap<LogicRef, Blueprint>,
        catalog: &LogicCatalog,
        instance: &mut InstanceState,
        caller: Identity,
        method: &str,
        args: &[u8],
    ) -> Result<Vec<u8>, Error> {
        let (record, target) = Self::binding(registry, instance)?;
        let owner = record.owner;
        let blueprint = blueprints
            .get(&target)
            .ok_or(InstanceWorkflowError::BlueprintMissing(target))?;
        let logic = catalog.get(&blueprint.code())?;

        let mut scratch = instance.storage.clone();
        let mut ctx = Context::new(caller, owner, instance.address, target, &mut scratch);
        let out = logic.execute(&mut ctx, method, args)?;
        instance.storage = scratch;

        log!(
            Topic::Instance,
            Debug,
            "instance {} ran {method} on {target} ({})",
            instance.address,
            blueprint.code()
        );

        Ok(out)
    }

    fn binding<'a>(
        registry: &'a RegistryState,
        instance: &InstanceState,
    ) -> Result<(&'a InstanceRecord, LogicRef), Error> {
        let record = registry
            .instance(instance.id)
            .ok_or(InstanceWorkflowError::NotInDirectory {
                registry: registry.address(),
                id: instance.id,
            })?;
        let current = registry
            .current_blueprint()
            .ok_or(InstanceWorkflowError::CurrentBlueprintMissing(registry.address()))?;

        let target = BindingPolicy::resolve(registry.config().binding, record, current);

        Ok((record, target))
    }
}
