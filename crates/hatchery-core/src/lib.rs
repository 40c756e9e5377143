//! Core Hatchery library: blueprint deployment, registry governance and
//! instance delegation on a single ordered ledger.
//!
//! ## Layering
//!
//! Hatchery keeps governance rules centralized and side effects mechanical:
//! - `access/` contains role lookup and guard helpers for boundary enforcement.
//! - `policy/` owns deterministic decision rules (no mutation).
//! - `model/` owns the data records (blueprints, registries, instances, roles).
//! - `workflow/` composes access → policy → model mutation and emits events.
//! - `ledger/` serializes every mutating call through one journaled total order.
//! - `infra/` provides endpoints the deployment orchestrator talks to.
//!
//! The default flow is: endpoint → ledger → workflow → access/policy → model.

pub mod access;
pub mod config;
pub mod error;
pub mod event;
pub mod ids;
pub mod infra;
pub mod ledger;
pub mod log;
pub mod logic;
pub mod model;
pub mod policy;
#[cfg(test)]
pub mod test;
pub mod workflow;

pub use error::{Error, ErrorKind};
pub use thiserror::Error as ThisError;

///
/// Crate Version
///

pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

