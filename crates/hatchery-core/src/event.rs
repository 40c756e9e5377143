use crate::ids::{Identity, InstanceId, InstanceRef, LogicRef, RegistryRef, RoleKind};
use candid::CandidType;
use serde::{Deserialize, Serialize};

///
/// RegistryEvent
///
/// Audit record for a successful registry mutation. Exactly one is emitted
/// per successful mutating call; failed calls emit nothing.
///

#[derive(CandidType, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum RegistryEvent {
    Initialized {
        admin: Identity,
        upgrader: Identity,
        blueprint: LogicRef,
    },
    InstanceCreated {
        id: InstanceId,
        address: InstanceRef,
        blueprint: LogicRef,
        owner: Identity,
    },
    BlueprintUpgraded {
        old: LogicRef,
        new: LogicRef,
    },
    RoleGranted {
        kind: RoleKind,
        identity: Identity,
        by: Identity,
    },
    RoleRevoked {
        kind: RoleKind,
        identity: Identity,
        by: Identity,
    },
}

///
/// EventRecord
/// A registry event as stored in the ledger's event log.
///

#[derive(CandidType, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct EventRecord {
    /// Sequence number of the transaction that produced the event.
    pub seq: u64,
    pub registry: RegistryRef,
    pub event: RegistryEvent,
}
