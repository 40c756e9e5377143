use crate::{
    ErrorKind,
    config::schema::RegistryConfig,
    ids::{Identity, InstanceId, InstanceRef, LogicRef, RegistryRef, RoleKind},
    model::{BlueprintCode, CreateParams},
};
use candid::CandidType;
use serde::{Deserialize, Serialize};

///
/// Command
/// Every state-mutating call the ledger accepts.
///

#[derive(CandidType, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    DeployBlueprint {
        code: BlueprintCode,
    },
    DeployRegistry {
        config: RegistryConfig,
    },
    Initialize {
        registry: RegistryRef,
        admin: Identity,
        upgrader: Identity,
        blueprint: LogicRef,
    },
    CreateInstance {
        registry: RegistryRef,
        params: CreateParams,
    },
    UpgradeBlueprint {
        registry: RegistryRef,
        blueprint: LogicRef,
    },
    GrantRole {
        registry: RegistryRef,
        kind: RoleKind,
        identity: Identity,
    },
    RevokeRole {
        registry: RegistryRef,
        kind: RoleKind,
        identity: Identity,
    },
    CallInstance {
        instance: InstanceRef,
        method: String,
        args: Vec<u8>,
    },
}

impl Command {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::DeployBlueprint { .. } => "deploy_blueprint",
            Self::DeployRegistry { .. } => "deploy_registry",
            Self::Initialize { .. } => "initialize",
            Self::CreateInstance { .. } => "create_instance",
            Self::UpgradeBlueprint { .. } => "upgrade_blueprint",
            Self::GrantRole { .. } => "grant_role",
            Self::RevokeRole { .. } => "revoke_role",
            Self::CallInstance { .. } => "call_instance",
        }
    }
}

///
/// Transaction
/// A command placed in the ledger's total order.
///

#[derive(CandidType, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct Transaction {
    pub seq: u64,
    pub caller: Identity,
    pub timestamp: u64,
    pub command: Command,
}

///
/// Outcome
///

#[derive(CandidType, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum Outcome {
    BlueprintDeployed(LogicRef),
    RegistryDeployed(RegistryRef),
    Initialized,
    InstanceCreated { id: InstanceId, address: InstanceRef },
    BlueprintUpgraded { old: LogicRef, new: LogicRef },
    RoleGranted,
    RoleRevoked,
    Returned(Vec<u8>),
}

///
/// Receipt
///

#[derive(CandidType, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct Receipt {
    pub seq: u64,
    pub outcome: Outcome,
}

///
/// TxStatus
///

#[derive(CandidType, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum TxStatus {
    Applied,
    Rejected { kind: ErrorKind, message: String },
}

///
/// JournalEntry
///

#[derive(CandidType, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct JournalEntry {
    pub transaction: Transaction,
    pub status: TxStatus,
}

impl JournalEntry {
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self.status, TxStatus::Applied)
    }
}
