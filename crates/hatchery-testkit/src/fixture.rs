use crate::Fake;
use hatchery_core::{
    Error,
    config::schema::{BindingMode, CreationPolicy, RegistryConfig},
    ids::{Identity, InstanceId, InstanceRef, LogicRef, RegistryRef, RoleKind},
    infra::{Endpoint, LocalEndpoint},
    ledger::{Command, Ledger, Outcome},
    logic::LogicCatalog,
    model::{BlueprintCode, CreateParams, RegistryState},
};

pub const DEPLOYER: u32 = 1;
pub const ADMIN: u32 = 2;
pub const UPGRADER: u32 = 3;

///
/// RegistryFixture
///
/// A local ledger with one `collection@v1` blueprint and one registry
/// initialized with [`ADMIN`] and [`UPGRADER`]. Timestamps come from a
/// counter so replays compare equal.
///

pub struct RegistryFixture {
    pub endpoint: LocalEndpoint,
    pub registry: RegistryRef,
    pub b1: LogicRef,
}

impl RegistryFixture {
    #[must_use]
    pub fn snapshot() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    #[must_use]
    pub fn live() -> Self {
        Self::with_config(RegistryConfig {
            binding: BindingMode::Live,
            creation: CreationPolicy::Open,
        })
    }

    #[must_use]
    pub fn restricted() -> Self {
        Self::with_config(RegistryConfig {
            binding: BindingMode::Snapshot,
            creation: CreationPolicy::Restricted,
        })
    }

    /// # Panics
    /// Panics if the fixture's own setup transactions are rejected.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        let mut tick = 0;
        let mut endpoint =
            LocalEndpoint::with_clock(Ledger::new(LogicCatalog::builtin()), move || {
                tick += 1;
                tick
            });

        let b1 = deploy_blueprint(&mut endpoint, 1).expect("deploy collection@v1");
        let registry = match endpoint
            .submit(Fake::identity(DEPLOYER), Command::DeployRegistry { config })
            .expect("deploy registry")
            .outcome
        {
            Outcome::RegistryDeployed(address) => address,
            other => panic!("unexpected outcome {other:?}"),
        };
        endpoint
            .submit(
                Fake::identity(DEPLOYER),
                Command::Initialize {
                    registry,
                    admin: Fake::identity(ADMIN),
                    upgrader: Fake::identity(UPGRADER),
                    blueprint: b1,
                },
            )
            .expect("initialize");

        Self {
            endpoint,
            registry,
            b1,
        }
    }

    pub fn deploy_blueprint(&mut self, version: u32) -> Result<LogicRef, Error> {
        deploy_blueprint(&mut self.endpoint, version)
    }

    pub fn create_instance(
        &mut self,
        caller: Identity,
        params: CreateParams,
    ) -> Result<(InstanceId, InstanceRef), Error> {
        let registry = self.registry;
        match self
            .endpoint
            .submit(caller, Command::CreateInstance { registry, params })?
            .outcome
        {
            Outcome::InstanceCreated { id, address } => Ok((id, address)),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    pub fn upgrade(&mut self, caller: Identity, blueprint: LogicRef) -> Result<(), Error> {
        let registry = self.registry;
        self.endpoint
            .submit(
                caller,
                Command::UpgradeBlueprint {
                    registry,
                    blueprint,
                },
            )
            .map(|_| ())
    }

    pub fn grant(
        &mut self,
        caller: Identity,
        kind: RoleKind,
        identity: Identity,
    ) -> Result<(), Error> {
        let registry = self.registry;
        self.endpoint
            .submit(
                caller,
                Command::GrantRole {
                    registry,
                    kind,
                    identity,
                },
            )
            .map(|_| ())
    }

    pub fn revoke(
        &mut self,
        caller: Identity,
        kind: RoleKind,
        identity: Identity,
    ) -> Result<(), Error> {
        let registry = self.registry;
        self.endpoint
            .submit(
                caller,
                Command::RevokeRole {
                    registry,
                    kind,
                    identity,
                },
            )
            .map(|_| ())
    }

    pub fn call(
        &mut self,
        caller: Identity,
        instance: InstanceRef,
        method: &str,
        args: Vec<u8>,
    ) -> Result<Vec<u8>, Error> {
        match self
            .endpoint
            .submit(
                caller,
                Command::CallInstance {
                    instance,
                    method: method.to_string(),
                    args,
                },
            )?
            .outcome
        {
            Outcome::Returned(out) => Ok(out),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    /// # Panics
    /// Panics if the fixture registry is missing from its own ledger.
    #[must_use]
    pub fn state(&self) -> RegistryState {
        self.endpoint
            .registry(self.registry)
            .expect("fixture registry exists")
    }

    #[must_use]
    pub const fn ledger(&self) -> &Ledger {
        self.endpoint.ledger()
    }
}

fn deploy_blueprint(endpoint: &mut LocalEndpoint, version: u32) -> Result<LogicRef, Error> {
    let receipt = endpoint.submit(
        Fake::identity(DEPLOYER),
        Command::DeployBlueprint {
            code: BlueprintCode::new("collection", version),
        },
    )?;

    match receipt.outcome {
        Outcome::BlueprintDeployed(address) => Ok(address),
        other => panic!("unexpected outcome {other:?}"),
    }
}
