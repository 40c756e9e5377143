use crate::{CliError, cli::InspectArgs, load_config, open_endpoint};
use hatchery_core::{
    ids::{Identity, InstanceId, InstanceRef, LogicRef, RegistryRef, RoleKind},
    infra::Endpoint,
    model::{RegistryPhase, RegistryState},
};
use serde::Serialize;
use std::collections::BTreeMap;

///
/// RegistryView
/// What `hatchery inspect` prints, as JSON.
///

#[derive(Debug, Serialize)]
pub struct RegistryView {
    pub address: RegistryRef,
    pub phase: RegistryPhase,
    pub binding: String,
    pub creation: String,
    pub deployer: Identity,
    pub current_blueprint: Option<LogicRef>,
    pub roles: BTreeMap<RoleKind, Vec<Identity>>,
    pub instances: Vec<InstanceView>,
}

#[derive(Debug, Serialize)]
pub struct InstanceView {
    pub id: InstanceId,
    pub address: InstanceRef,
    pub bound_blueprint: LogicRef,
    pub owner: Identity,
    pub created_at: u64,
}

impl From<&RegistryState> for RegistryView {
    fn from(state: &RegistryState) -> Self {
        let roles = RoleKind::ALL
            .into_iter()
            .map(|kind| {
                let holders = state.roles().role(kind).holders.into_iter().collect();
                (kind, holders)
            })
            .collect();

        let instances = state
            .instances()
            .map(|record| InstanceView {
                id: record.id,
                address: record.address,
                bound_blueprint: record.bound_blueprint,
                owner: record.owner,
                created_at: record.created_at,
            })
            .collect();

        Self {
            address: state.address(),
            phase: state.phase(),
            binding: state.config().binding.to_string(),
            creation: state.config().creation.to_string(),
            deployer: state.deployer(),
            current_blueprint: state.current_blueprint(),
            roles,
            instances,
        }
    }
}

/// `hatchery inspect`: print a registry view from a profile's ledger.
pub fn run(args: &InspectArgs) -> Result<String, CliError> {
    let config = load_config(&args.config)?;
    let profile = config.profile(&args.profile)?;
    let endpoint = open_endpoint(profile)?;

    let state = endpoint.registry(args.registry)?;
    let view = RegistryView::from(&state);

    Ok(serde_json::to_string_pretty(&view)?)
}
