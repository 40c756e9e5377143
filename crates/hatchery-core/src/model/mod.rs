//! Data records owned by the ledger.
//!
//! Mutators here are mechanical and infallible: every precondition is checked
//! by `access/` and `policy/` before a workflow touches these types.

mod blueprint;
mod instance;
mod registry;
mod role;

pub use blueprint::*;
pub use instance::*;
pub use registry::*;
pub use role::*;
