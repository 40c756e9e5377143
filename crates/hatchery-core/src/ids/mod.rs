//!
//! Strongly-typed identifiers for identities, ledger addresses and instance
//! ids. Every address is principal-shaped; the empty principal (`aaaaa-aa`)
//! is the null identity/reference.
//!

mod role;

pub use role::RoleKind;

use crate::ThisError;
use candid::{CandidType, Principal};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

///
/// IdError
///

#[derive(Debug, ThisError)]
pub enum IdError {
    #[error("invalid principal text '{text}': {reason}")]
    InvalidText { text: String, reason: String },
}

///
/// principal_id
/// Generates a principal-backed newtype with a null constant and text helpers.
///

macro_rules! principal_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
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
        #[serde(transparent)]
        pub struct $name(pub Principal);

        impl $name {
            pub const NULL: Self = Self(Principal::management_canister());

            #[must_use]
            pub const fn new(principal: Principal) -> Self {
                Self(principal)
            }

            #[must_use]
            pub fn is_null(&self) -> bool {
                self.0.as_slice().is_empty()
            }

            #[must_use]
            pub const fn as_principal(&self) -> &Principal {
                &self.0
            }

            #[must_use]
            pub fn as_slice(&self) -> &[u8] {
                self.0.as_slice()
            }

            pub fn from_text(text: &str) -> Result<Self, IdError> {
                Principal::from_text(text)
                    .map(Self)
                    .map_err(|err| IdError::InvalidText {
                        text: text.to_string(),
                        reason: err.to_string(),
                    })
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_text(s)
            }
        }

        impl From<Principal> for $name {
            fn from(principal: Principal) -> Self {
                Self(principal)
            }
        }
    };
}

principal_id!(
    ///
    /// Identity
    /// A caller, role holder or instance owner.
    ///
    Identity
);

principal_id!(
    ///
    /// LogicRef
    /// Ledger address of a deployed blueprint.
    ///
    LogicRef
);

principal_id!(
    ///
    /// RegistryRef
    /// Ledger address of a registry.
    ///
    RegistryRef
);

principal_id!(
    ///
    /// InstanceRef
    /// Ledger address of an instance's isolated storage.
    ///
    InstanceRef
);

///
/// InstanceId
/// Registry-local, monotonically increasing instance number (first id is 1).
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
#[serde(transparent)]
pub struct InstanceId(pub u64);

impl InstanceId {
    pub const FIRST: Self = Self(1);

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::FIRST
    }
}

///
/// TESTS
///
