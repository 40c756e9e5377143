use crate::ids::{Identity, LogicRef};
use candid::Principal;

#[must_use]
pub fn p(id: u8) -> Identity {
    Identity::new(Principal::from_slice(&[id; 29]))
}

#[must_use]
pub fn logic(id: u8) -> LogicRef {
    LogicRef::new(Principal::from_slice(&[id; 20]))
}
