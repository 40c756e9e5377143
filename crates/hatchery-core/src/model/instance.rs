use crate::ids::{Identity, InstanceId, InstanceRef, LogicRef, RegistryRef};
use candid::CandidType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

///
/// InstanceRecord
///
/// Directory entry a registry keeps for each instance it created.
/// `bound_blueprint` is the blueprint that was current at creation time.
///

#[derive(CandidType, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct InstanceRecord {
    pub id: InstanceId,
    pub address: InstanceRef,
    pub bound_blueprint: LogicRef,
    pub owner: Identity,
    pub created_at: u64,
}

///
/// CreateParams
///

#[derive(CandidType, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct CreateParams {
    /// Defaults to the caller.
    pub owner: Option<Identity>,
}

impl CreateParams {
    #[must_use]
    pub const fn owned_by(owner: Identity) -> Self {
        Self { owner: Some(owner) }
    }
}

///
/// Storage
/// Per-instance key/value state. Never shared between instances.
///

#[derive(CandidType, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct Storage {
    slots: BTreeMap<String, Vec<u8>>,
}

impl Storage {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.slots.get(key).map(Vec::as_slice)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Vec<u8>) -> Option<Vec<u8>> {
        self.slots.insert(key.into(), value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

///
/// InstanceState
///
/// The instance itself as hosted on the ledger: a back-reference to its
/// registry entry plus isolated storage. Its lifetime does not depend on the
/// registry's.
///

#[derive(CandidType, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct InstanceState {
    pub address: InstanceRef,
    pub registry: RegistryRef,
    pub id: InstanceId,
    pub storage: Storage,
}

impl InstanceState {
    #[must_use]
    pub fn new(address: InstanceRef, registry: RegistryRef, id: InstanceId) -> Self {
        Self {
            address,
            registry,
            id,
            storage: Storage::default(),
        }
    }
}
