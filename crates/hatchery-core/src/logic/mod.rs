//! Blueprint logic.
//!
//! A blueprint is a [`Logic`] implementation looked up in a [`LogicCatalog`]
//! by its [`BlueprintCode`]. Logic is stateless: everything an execution may
//! touch arrives through the [`Context`] built for that one call.

mod collection;

pub use collection::CollectionLogic;

use crate::{
    Error, ErrorKind, ThisError,
    ids::{Identity, InstanceRef, LogicRef},
    model::{BlueprintCode, Storage},
};
use std::{collections::BTreeMap, fmt, sync::Arc};

///
/// LogicError
///

#[derive(Debug, ThisError)]
pub enum LogicError {
    #[error("blueprint code {0} is not in the logic catalog")]
    UnknownCode(BlueprintCode),

    #[error("method '{method}' is not provided by {code}")]
    UnknownMethod { method: String, code: BlueprintCode },

    #[error("invalid arguments for '{method}': {reason}")]
    InvalidArgs { method: String, reason: String },

    #[error("call to '{method}' denied for {caller}")]
    Denied { method: String, caller: Identity },

    #[error("result encoding failed: {0}")]
    Encode(String),
}

impl LogicError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownCode(_) => ErrorKind::InvalidArgument,
            Self::UnknownMethod { .. }
            | Self::InvalidArgs { .. }
            | Self::Denied { .. }
            | Self::Encode(_) => ErrorKind::Logic,
        }
    }
}

///
/// Logic
///
/// The capability every blueprint variant implements. `execute` must be
/// deterministic: ledger replay re-runs it.
///

pub trait Logic: Send + Sync {
    fn code(&self) -> BlueprintCode;

    fn execute(&self, ctx: &mut Context<'_>, method: &str, args: &[u8])
    -> Result<Vec<u8>, LogicError>;
}

///
/// Context
/// Per-call view of one instance.
///

pub struct Context<'a> {
    pub caller: Identity,
    pub owner: Identity,
    pub instance: InstanceRef,
    pub blueprint: LogicRef,
    storage: &'a mut Storage,
}

impl<'a> Context<'a> {
    pub const fn new(
        caller: Identity,
        owner: Identity,
        instance: InstanceRef,
        blueprint: LogicRef,
        storage: &'a mut Storage,
    ) -> Self {
        Self {
            caller,
            owner,
            instance,
            blueprint,
            storage,
        }
    }

    #[must_use]
    pub const fn storage(&self) -> &Storage {
        &*self.storage
    }

    pub const fn storage_mut(&mut self) -> &mut Storage {
        &mut *self.storage
    }
}

///
/// LogicCatalog
///

#[derive(Clone, Default)]
pub struct LogicCatalog {
    entries: BTreeMap<BlueprintCode, Arc<dyn Logic>>,
}

impl LogicCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the reference `collection` logic, versions 1 and 2.
    #[must_use]
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.register(Arc::new(CollectionLogic::new(1)));
        catalog.register(Arc::new(CollectionLogic::new(2)));

        catalog
    }

    /// Returns the logic previously registered under the same code, if any.
    pub fn register(&mut self, logic: Arc<dyn Logic>) -> Option<Arc<dyn Logic>> {
        self.entries.insert(logic.code(), logic)
    }

    pub fn get(&self, code: &BlueprintCode) -> Result<Arc<dyn Logic>, Error> {
        self.entries
            .get(code)
            .cloned()
            .ok_or_else(|| LogicError::UnknownCode(code.clone()).into())
    }
}

impl fmt::Debug for LogicCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}
