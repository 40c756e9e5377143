use crate::{
    config::schema::RegistryConfig,
    ids::{Identity, InstanceId, LogicRef, RegistryRef},
    model::{InstanceRecord, RoleTable},
};
use candid::CandidType;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

///
/// RegistryPhase
/// `Uninitialized -> Initialized`; the second state is terminal.
///

#[derive(CandidType, Clone, Copy, Debug, Display, Eq, PartialEq, Deserialize, Serialize)]
pub enum RegistryPhase {
    Uninitialized,
    Initialized,
}

///
/// RegistryState
///
/// Governance state of one registry: roles, the current blueprint and the
/// instance directory. Fields are crate-visible so that only workflows, after
/// access and policy checks, can mutate them.
///

#[derive(CandidType, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct RegistryState {
    pub(crate) address: RegistryRef,
    pub(crate) deployer: Identity,
    pub(crate) deployed_at: u64,
    pub(crate) config: RegistryConfig,
    pub(crate) initialized: bool,
    pub(crate) roles: RoleTable,
    pub(crate) current_blueprint: Option<LogicRef>,
    pub(crate) instances: BTreeMap<InstanceId, InstanceRecord>,
    pub(crate) next_instance_id: InstanceId,
}

impl RegistryState {
    /// A freshly deployed, uninitialized registry shell.
    #[must_use]
    pub fn new(
        address: RegistryRef,
        deployer: Identity,
        deployed_at: u64,
        config: RegistryConfig,
    ) -> Self {
        Self {
            address,
            deployer,
            deployed_at,
            config,
            initialized: false,
            roles: RoleTable::default(),
            current_blueprint: None,
            instances: BTreeMap::new(),
            next_instance_id: InstanceId::FIRST,
        }
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    #[must_use]
    pub const fn address(&self) -> RegistryRef {
        self.address
    }

    #[must_use]
    pub const fn deployer(&self) -> Identity {
        self.deployer
    }

    #[must_use]
    pub const fn deployed_at(&self) -> u64 {
        self.deployed_at
    }

    #[must_use]
    pub const fn config(&self) -> RegistryConfig {
        self.config
    }

    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    #[must_use]
    pub const fn phase(&self) -> RegistryPhase {
        if self.initialized {
            RegistryPhase::Initialized
        } else {
            RegistryPhase::Uninitialized
        }
    }

    #[must_use]
    pub const fn roles(&self) -> &RoleTable {
        &self.roles
    }

    /// `None` only while uninitialized.
    #[must_use]
    pub const fn current_blueprint(&self) -> Option<LogicRef> {
        self.current_blueprint
    }

    #[must_use]
    pub fn instance(&self, id: InstanceId) -> Option<&InstanceRecord> {
        self.instances.get(&id)
    }

    pub fn instances(&self) -> impl Iterator<Item = &InstanceRecord> {
        self.instances.values()
    }

    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    #[must_use]
    pub const fn next_instance_id(&self) -> InstanceId {
        self.next_instance_id
    }

    // ---------------------------------------------------------------------
    // Mutation (unchecked)
    // ---------------------------------------------------------------------

    pub(crate) fn mark_initialized(&mut self, blueprint: LogicRef) {
        self.current_blueprint = Some(blueprint);
        self.initialized = true;
    }

    /// Returns the replaced reference.
    pub(crate) fn swap_blueprint(&mut self, blueprint: LogicRef) -> Option<LogicRef> {
        self.current_blueprint.replace(blueprint)
    }

    pub(crate) fn allocate_instance_id(&mut self) -> InstanceId {
        let id = self.next_instance_id;
        self.next_instance_id = id.next();

        id
    }

    pub(crate) fn insert_instance(&mut self, record: InstanceRecord) {
        self.instances.insert(record.id, record);
    }
}
