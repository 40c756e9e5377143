use crate::{config::schema::BindingMode, ids::LogicRef, model::InstanceRecord};

///
/// BindingPolicy
/// Chooses the blueprint an instance call is delegated to.
///

pub struct BindingPolicy;

impl BindingPolicy {
    #[must_use]
    pub const fn resolve(
        mode: BindingMode,
        record: &InstanceRecord,
        current: LogicRef,
    ) -> LogicRef {
        match mode {
            BindingMode::Snapshot => record.bound_blueprint,
            BindingMode::Live => current,
        }
    }
}

///
/// TESTS
///
