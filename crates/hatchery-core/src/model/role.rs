use crate::{
    access::RoleLookup,
    ids::{Identity, RoleKind},
};
use candid::CandidType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

///
/// Role
/// A permission class and its current holders.
///

#[derive(CandidType, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct Role {
    pub kind: RoleKind,
    pub holders: BTreeSet<Identity>,
}

///
/// RoleTable
///
/// Holder sets per role kind. After registry initialization every kind has
/// at least one holder; the revoke policy keeps it that way.
///

#[derive(CandidType, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct RoleTable {
    roles: BTreeMap<RoleKind, BTreeSet<Identity>>,
}

impl RoleTable {
    #[must_use]
    pub fn role(&self, kind: RoleKind) -> Role {
        Role {
            kind,
            holders: self.roles.get(&kind).cloned().unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn holder_count(&self, kind: RoleKind) -> usize {
        self.roles.get(&kind).map_or(0, BTreeSet::len)
    }

    #[must_use]
    pub fn is_holder(&self, kind: RoleKind, identity: Identity) -> bool {
        self.roles
            .get(&kind)
            .is_some_and(|holders| holders.contains(&identity))
    }

    /// Returns false if the identity already held the role.
    pub(crate) fn insert(&mut self, kind: RoleKind, identity: Identity) -> bool {
        self.roles.entry(kind).or_default().insert(identity)
    }

    /// Returns false if the identity did not hold the role.
    pub(crate) fn remove(&mut self, kind: RoleKind, identity: Identity) -> bool {
        self.roles
            .get_mut(&kind)
            .is_some_and(|holders| holders.remove(&identity))
    }
}

impl RoleLookup for RoleTable {
    fn roles_of(&self, identity: Identity) -> BTreeSet<RoleKind> {
        self.roles
            .iter()
            .filter(|(_, holders)| holders.contains(&identity))
            .map(|(kind, _)| *kind)
            .collect()
    }
}

///
/// TESTS
///
