use super::{AccessError, RoleLookup};
use crate::{
    config::schema::CreationPolicy,
    ids::{Identity, RoleKind},
    log,
    log::Topic,
};

/// Require that `caller` holds `role`.
pub fn require_role(
    lookup: &impl RoleLookup,
    caller: Identity,
    role: RoleKind,
) -> Result<(), AccessError> {
    if lookup.has_role(caller, role) {
        return Ok(());
    }

    log!(Topic::Access, Warn, "access denied caller={caller} role={role}");

    Err(AccessError::Unauthorized { caller, role })
}

/// Gate instance creation according to the registry's creation policy.
pub fn require_creator(
    policy: CreationPolicy,
    lookup: &impl RoleLookup,
    caller: Identity,
) -> Result<(), AccessError> {
    match policy {
        CreationPolicy::Open => Ok(()),
        CreationPolicy::Restricted => require_role(lookup, caller, RoleKind::Creator),
    }
}

///
/// TESTS
///
