use candid::CandidType;
use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// RoleKind
/// Permission classes a registry tracks holder sets for.
///

#[derive(
    CandidType,
    Clone,
    Copy,
    Debug,
    Display,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Deserialize,
    Serialize,
)]
#[remain::sorted]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    Admin,
    Creator,
    Upgrader,
}

impl RoleKind {
    pub const ALL: [Self; 3] = [Self::Admin, Self::Creator, Self::Upgrader];
}
