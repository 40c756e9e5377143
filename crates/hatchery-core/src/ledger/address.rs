use crate::ids::Identity;
use candid::Principal;
use sha2::{Digest, Sha256};

pub const ADDRESS_LEN: usize = 20;

///
/// AddressTag
/// Domain separator so blueprints, registries and instances never share an
/// address even when allocated by the same caller in the same slot.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AddressTag {
    Blueprint,
    Instance,
    Registry,
}

impl AddressTag {
    const fn domain(self) -> &'static [u8] {
        match self {
            Self::Blueprint => b"hatchery:blueprint",
            Self::Instance => b"hatchery:instance",
            Self::Registry => b"hatchery:registry",
        }
    }
}

/// `SHA-256(tag ‖ deployer ‖ seq)`, truncated to [`ADDRESS_LEN`] bytes.
///
/// Deterministic in its inputs, so replaying a journal reallocates the same
/// addresses.
#[must_use]
pub fn derive_address(tag: AddressTag, deployer: Identity, seq: u64) -> Principal {
    let mut hasher = Sha256::new();
    hasher.update(tag.domain());
    hasher.update(deployer.as_slice());
    hasher.update(seq.to_be_bytes());
    let digest = hasher.finalize();

    Principal::from_slice(&digest[..ADDRESS_LEN])
}

///
/// TESTS
///
