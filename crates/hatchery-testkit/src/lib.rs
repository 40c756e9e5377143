//! Test utilities and fixtures for exercising hatchery ledgers.
//!
//! Provides stable dummy identities, a fault-injecting endpoint for
//! orchestrator retry tests, and a registry fixture that drives a ledger
//! through the usual deploy/initialize sequence.

pub mod fixture;
pub mod flaky;

pub use fixture::RegistryFixture;
pub use flaky::{Fault, FlakyEndpoint};

use candid::Principal;
use hatchery_core::ids::Identity;

///
/// Deterministic dummy-value generator for tests.
///
/// Produces stable identities derived from a numeric seed, which makes tests
/// reproducible without hardcoding raw byte arrays.
///

pub struct Fake;

impl Fake {
    ///
    /// Deterministically derive an [`Identity`] from `seed`.
    ///
    #[must_use]
    pub fn identity(seed: u32) -> Identity {
        Identity::new(Self::principal(seed))
    }

    ///
    /// Deterministically derive a [`Principal`] from `seed`.
    ///
    #[must_use]
    pub fn principal(seed: u32) -> Principal {
        let mut buf = [0u8; 29];
        buf[..4].copy_from_slice(&seed.to_be_bytes());

        Principal::from_slice(&buf)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_identity_is_deterministic_and_unique() {
        let a1 = Fake::identity(42);
        let a2 = Fake::identity(42);
        let b = Fake::identity(99);

        assert_eq!(a1, a2, "Fake::identity should be deterministic");
        assert_ne!(a1, b, "Fake::identity should vary by seed");
        assert!(!Fake::identity(0).is_null(), "seed 0 must not be the null identity");
        assert_eq!(a1.as_slice().len(), 29, "Principal must be 29 bytes");
    }
}
