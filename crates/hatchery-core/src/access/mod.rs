//! Role-based access checks.
//!
//! Every mutating registry operation runs an explicit guard before any policy
//! or state work. Guards are parameterized by a [`RoleLookup`] so the holder
//! source is injected rather than ambient.

mod guard;

pub use guard::*;

use crate::{
    ErrorKind, ThisError,
    ids::{Identity, RoleKind},
};
use std::collections::BTreeSet;

///
/// AccessError
///

#[derive(Debug, ThisError)]
pub enum AccessError {
    #[error("caller '{caller}' does not hold the {role} role")]
    Unauthorized { caller: Identity, role: RoleKind },
}

impl AccessError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
        }
    }
}

///
/// RoleLookup
/// `Identity -> Set<RoleKind>`.
///

pub trait RoleLookup {
    fn roles_of(&self, identity: Identity) -> BTreeSet<RoleKind>;

    fn has_role(&self, identity: Identity, role: RoleKind) -> bool {
        self.roles_of(identity).contains(&role)
    }
}
