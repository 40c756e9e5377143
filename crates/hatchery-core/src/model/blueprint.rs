use crate::ids::{Identity, LogicRef};
use candid::CandidType;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

///
/// BlueprintCode
/// Names a logic implementation in the catalog (`name@vN`).
///

#[derive(
    CandidType, Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Deserialize, Serialize,
)]
#[display("{name}@v{version}")]
pub struct BlueprintCode {
    pub name: String,
    pub version: u32,
}

impl BlueprintCode {
    #[must_use]
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }

    /// SHA-256 over the canonical `name@vN` form.
    #[must_use]
    pub fn hash(&self) -> Vec<u8> {
        Sha256::digest(self.to_string().as_bytes()).to_vec()
    }
}

///
/// Blueprint
///
/// An immutable, stateless logic unit. Once recorded on the ledger it is never
/// mutated; a newer blueprint supersedes it without destroying it.
///

#[derive(CandidType, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct Blueprint {
    pub address: LogicRef,
    pub name: String,
    pub version: u32,
    pub code_hash: Vec<u8>,
    pub deployer: Identity,
    pub deployed_at: u64,
}

impl Blueprint {
    #[must_use]
    pub fn new(address: LogicRef, code: &BlueprintCode, deployer: Identity, now: u64) -> Self {
        Self {
            address,
            name: code.name.clone(),
            version: code.version,
            code_hash: code.hash(),
            deployer,
            deployed_at: now,
        }
    }

    #[must_use]
    pub fn code(&self) -> BlueprintCode {
        BlueprintCode::new(self.name.clone(), self.version)
    }
}

///
/// BlueprintLookup
/// Answers whether a reference names a deployed blueprint.
///

pub trait BlueprintLookup {
    fn contains_blueprint(&self, address: LogicRef) -> bool;
}

impl BlueprintLookup for BTreeMap<LogicRef, Blueprint> {
    fn contains_blueprint(&self, address: LogicRef) -> bool {
        self.contains_key(&address)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_hash_depends_on_version() {
        let v1 = BlueprintCode::new("collection", 1);
        let v2 = BlueprintCode::new("collection", 2);

        assert_eq!(v1.to_string(), "collection@v1");
        assert_eq!(v1.hash().len(), 32);
        assert_ne!(v1.hash(), v2.hash());
    }
}
