//! The ledger: one total order over every mutating call.
//!
//! A [`Transaction`] is accepted only at `seq == next_seq`, recorded in the
//! journal, then applied. A rejected transaction is journaled with its error
//! kind and has no effect on state, so replaying the journal through a fresh
//! ledger reproduces the same state exactly.

mod address;
mod command;

pub use address::{ADDRESS_LEN, AddressTag, derive_address};
pub use command::{Command, JournalEntry, Outcome, Receipt, Transaction, TxStatus};

use crate::{
    Error, ErrorKind, ThisError,
    event::{EventRecord, RegistryEvent},
    ids::{Identity, InstanceRef, LogicRef, RegistryRef},
    log,
    log::Topic,
    logic::LogicCatalog,
    model::{Blueprint, InstanceState, RegistryState},
    workflow::{
        instance::InstanceWorkflow,
        registry::{InitArgs, RegistryWorkflow},
    },
};
use candid::Principal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

///
/// LedgerError
///

#[derive(Debug, ThisError)]
pub enum LedgerError {
    #[error("transaction out of order: expected seq {expected}, got {got}")]
    OutOfOrder { expected: u64, got: u64 },

    #[error("derived address {0} is already in use")]
    AddressCollision(Principal),

    #[error("replay diverged at seq {seq}: journal says {recorded}, ledger says {replayed}")]
    ReplayDiverged {
        seq: u64,
        recorded: String,
        replayed: String,
    },

    #[error("blueprint {0} not found")]
    BlueprintNotFound(LogicRef),

    #[error("registry {0} not found")]
    RegistryNotFound(RegistryRef),

    #[error("instance {0} not found")]
    InstanceNotFound(InstanceRef),
}

impl LedgerError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::OutOfOrder { .. } | Self::AddressCollision(_) | Self::ReplayDiverged { .. } => {
                ErrorKind::InvariantViolation
            }
            Self::BlueprintNotFound(_) | Self::RegistryNotFound(_) | Self::InstanceNotFound(_) => {
                ErrorKind::NotFound
            }
        }
    }
}

///
/// LedgerSnapshot
/// Comparable copy of everything a ledger hosts.
///

#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct LedgerSnapshot {
    pub head: u64,
    pub blueprints: BTreeMap<LogicRef, Blueprint>,
    pub registries: BTreeMap<RegistryRef, RegistryState>,
    pub instances: BTreeMap<InstanceRef, InstanceState>,
    pub events: Vec<EventRecord>,
}

///
/// Ledger
///

#[derive(Debug)]
pub struct Ledger {
    catalog: LogicCatalog,
    journal: Vec<JournalEntry>,
    events: Vec<EventRecord>,
    blueprints: BTreeMap<LogicRef, Blueprint>,
    registries: BTreeMap<RegistryRef, RegistryState>,
    instances: BTreeMap<InstanceRef, InstanceState>,
}

impl Ledger {
    #[must_use]
    pub const fn new(catalog: LogicCatalog) -> Self {
        Self {
            catalog,
            journal: Vec::new(),
            events: Vec::new(),
            blueprints: BTreeMap::new(),
            registries: BTreeMap::new(),
            instances: BTreeMap::new(),
        }
    }

    /// Rebuild a ledger by re-applying a journal from the start.
    ///
    /// Each entry must reproduce its recorded status; a transaction that was
    /// applied originally but is rejected now (or the reverse) means the
    /// journal and the catalog disagree.
    pub fn replay<I>(catalog: LogicCatalog, entries: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = JournalEntry>,
    {
        let mut ledger = Self::new(catalog);

        for entry in entries {
            let seq = entry.transaction.seq;
            let _ = ledger.submit(entry.transaction);

            let replayed = ledger
                .journal
                .last()
                .filter(|last| last.transaction.seq == seq)
                .map(|last| last.status.clone());

            if replayed.as_ref() != Some(&entry.status) {
                return Err(LedgerError::ReplayDiverged {
                    seq,
                    recorded: status_label(Some(&entry.status)),
                    replayed: status_label(replayed.as_ref()),
                }
                .into());
            }
        }

        log!(
            Topic::Ledger,
            Info,
            "ledger replayed to seq {} ({} events)",
            ledger.head(),
            ledger.events.len()
        );

        Ok(ledger)
    }

    // ---------------------------------------------------------------------
    // Ordering
    // ---------------------------------------------------------------------

    /// Sequence number of the last journaled transaction, `0` when empty.
    #[must_use]
    pub fn head(&self) -> u64 {
        self.journal.len() as u64
    }

    #[must_use]
    pub fn next_seq(&self) -> u64 {
        self.head() + 1
    }

    /// Wrap `command` as the next transaction in order.
    #[must_use]
    pub fn transaction(&self, caller: Identity, timestamp: u64, command: Command) -> Transaction {
        Transaction {
            seq: self.next_seq(),
            caller,
            timestamp,
            command,
        }
    }

    /// Journal and apply one transaction.
    ///
    /// An out-of-order transaction is refused without being journaled. Any
    /// other failure is journaled as rejected and returned.
    pub fn submit(&mut self, tx: Transaction) -> Result<Receipt, Error> {
        let expected = self.next_seq();
        if tx.seq != expected {
            return Err(LedgerError::OutOfOrder {
                expected,
                got: tx.seq,
            }
            .into());
        }

        let seq = tx.seq;
        let result = self.apply(&tx);

        match result {
            Ok((outcome, event)) => {
                self.journal.push(JournalEntry {
                    transaction: tx,
                    status: TxStatus::Applied,
                });
                if let Some((registry, event)) = event {
                    self.events.push(EventRecord {
                        seq,
                        registry,
                        event,
                    });
                }

                Ok(Receipt { seq, outcome })
            }
            Err(err) => {
                log!(
                    Topic::Ledger,
                    Warn,
                    "tx {seq} {} by {} rejected: {err}",
                    tx.command.name(),
                    tx.caller
                );
                self.journal.push(JournalEntry {
                    transaction: tx,
                    status: TxStatus::Rejected {
                        kind: err.kind(),
                        message: err.to_string(),
                    },
                });

                Err(err)
            }
        }
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    #[must_use]
    pub const fn catalog(&self) -> &LogicCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn journal(&self) -> &[JournalEntry] {
        &self.journal
    }

    #[must_use]
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn events_for(&self, registry: RegistryRef) -> impl Iterator<Item = &EventRecord> {
        self.events.iter().filter(move |e| e.registry == registry)
    }

    pub fn blueprint(&self, address: LogicRef) -> Result<&Blueprint, Error> {
        self.blueprints
            .get(&address)
            .ok_or_else(|| LedgerError::BlueprintNotFound(address).into())
    }

    pub fn registry(&self, address: RegistryRef) -> Result<&RegistryState, Error> {
        self.registries
            .get(&address)
            .ok_or_else(|| LedgerError::RegistryNotFound(address).into())
    }

    pub fn instance(&self, address: InstanceRef) -> Result<&InstanceState, Error> {
        self.instances
            .get(&address)
            .ok_or_else(|| LedgerError::InstanceNotFound(address).into())
    }

    /// Blueprint a call on `instance` would execute right now.
    pub fn resolve_blueprint(&self, instance: InstanceRef) -> Result<LogicRef, Error> {
        let instance = self.instance(instance)?;
        let registry = self.registry(instance.registry)?;

        InstanceWorkflow::resolve(registry, instance)
    }

    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            head: self.head(),
            blueprints: self.blueprints.clone(),
            registries: self.registries.clone(),
            instances: self.instances.clone(),
            events: self.events.clone(),
        }
    }

    // ---------------------------------------------------------------------
    // Apply
    // ---------------------------------------------------------------------

    fn apply(
        &mut self,
        tx: &Transaction,
    ) -> Result<(Outcome, Option<(RegistryRef, RegistryEvent)>), Error> {
        let Transaction {
            seq,
            caller,
            timestamp,
            ref command,
        } = *tx;

        match command {
            Command::DeployBlueprint { code } => {
                self.catalog.get(code)?;

                let address = LogicRef::new(self.fresh(AddressTag::Blueprint, caller, seq)?);
                self.blueprints
                    .insert(address, Blueprint::new(address, code, caller, timestamp));

                log!(Topic::Ledger, Ok, "blueprint {code} deployed at {address}");

                Ok((Outcome::BlueprintDeployed(address), None))
            }

            Command::DeployRegistry { config } => {
                let address = RegistryRef::new(self.fresh(AddressTag::Registry, caller, seq)?);
                self.registries.insert(
                    address,
                    RegistryState::new(address, caller, timestamp, *config),
                );

                log!(
                    Topic::Ledger,
                    Ok,
                    "registry deployed at {address} (binding={}, creation={})",
                    config.binding,
                    config.creation
                );

                Ok((Outcome::RegistryDeployed(address), None))
            }

            Command::Initialize {
                registry,
                admin,
                upgrader,
                blueprint,
            } => {
                let state = self
                    .registries
                    .get_mut(registry)
                    .ok_or(LedgerError::RegistryNotFound(*registry))?;
                let event = RegistryWorkflow::initialize(
                    state,
                    &self.blueprints,
                    InitArgs {
                        admin: *admin,
                        upgrader: *upgrader,
                        blueprint: *blueprint,
                    },
                )?;

                Ok((Outcome::Initialized, Some((*registry, event))))
            }

            Command::CreateInstance { registry, params } => {
                let address = InstanceRef::new(self.fresh(AddressTag::Instance, caller, seq)?);
                let state = self
                    .registries
                    .get_mut(registry)
                    .ok_or(LedgerError::RegistryNotFound(*registry))?;
                let (record, event) = RegistryWorkflow::create_instance(
                    state,
                    caller,
                    params.clone(),
                    address,
                    timestamp,
                )?;
                self.instances
                    .insert(address, InstanceState::new(address, *registry, record.id));

                Ok((
                    Outcome::InstanceCreated {
                        id: record.id,
                        address,
                    },
                    Some((*registry, event)),
                ))
            }

            Command::UpgradeBlueprint {
                registry,
                blueprint,
            } => {
                let state = self
                    .registries
                    .get_mut(registry)
                    .ok_or(LedgerError::RegistryNotFound(*registry))?;
                let (old, event) = RegistryWorkflow::upgrade_blueprint(
                    state,
                    &self.blueprints,
                    caller,
                    *blueprint,
                )?;
                let outcome = Outcome::BlueprintUpgraded {
                    old,
                    new: *blueprint,
                };

                Ok((outcome, Some((*registry, event))))
            }

            Command::GrantRole {
                registry,
                kind,
                identity,
            } => {
                let state = self
                    .registries
                    .get_mut(registry)
                    .ok_or(LedgerError::RegistryNotFound(*registry))?;
                let event = RegistryWorkflow::grant_role(state, caller, *kind, *identity)?;

                Ok((Outcome::RoleGranted, Some((*registry, event))))
            }

            Command::RevokeRole {
                registry,
                kind,
                identity,
            } => {
                let state = self
                    .registries
                    .get_mut(registry)
                    .ok_or(LedgerError::RegistryNotFound(*registry))?;
                let event = RegistryWorkflow::revoke_role(state, caller, *kind, *identity)?;

                Ok((Outcome::RoleRevoked, Some((*registry, event))))
            }

            Command::CallInstance {
                instance,
                method,
                args,
            } => {
                let state = self
                    .instances
                    .get_mut(instance)
                    .ok_or(LedgerError::InstanceNotFound(*instance))?;
                let registry = self
                    .registries
                    .get(&state.registry)
                    .ok_or(LedgerError::RegistryNotFound(state.registry))?;
                let out = InstanceWorkflow::call(
                    registry,
                    &self.blueprints,
                    &self.catalog,
                    state,
                    caller,
                    method,
                    args,
                )?;

                Ok((Outcome::Returned(out), None))
            }
        }
    }

    /// Derive an address for `seq` and make sure nothing already lives there.
    fn fresh(&self, tag: AddressTag, caller: Identity, seq: u64) -> Result<Principal, Error> {
        let address = derive_address(tag, caller, seq);
        let taken = self.blueprints.contains_key(&LogicRef::new(address))
            || self.registries.contains_key(&RegistryRef::new(address))
            || self.instances.contains_key(&InstanceRef::new(address));

        if taken {
            return Err(LedgerError::AddressCollision(address).into());
        }

        Ok(address)
    }
}

fn status_label(status: Option<&TxStatus>) -> String {
    match status {
        Some(TxStatus::Applied) => "applied".to_string(),
        Some(TxStatus::Rejected { kind, .. }) => format!("rejected ({kind})"),
        None => "not journaled".to_string(),
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::schema::{BindingMode, CreationPolicy, RegistryConfig},
        ids::RoleKind,
        model::{BlueprintCode, CreateParams},
        test::p,
    };
    use candid::{encode_args, encode_one};

    const DEPLOYER: u8 = 1;
    const UPGRADER: u8 = 2;
    const OWNER: u8 = 3;

    fn submit(ledger: &mut Ledger, caller: u8, command: Command) -> Result<Outcome, Error> {
        let tx = ledger.transaction(p(caller), ledger.next_seq() * 10, command);
        ledger.submit(tx).map(|receipt| receipt.outcome)
    }

    fn deploy_blueprint(ledger: &mut Ledger, version: u32) -> LogicRef {
        match submit(
            ledger,
            DEPLOYER,
            Command::DeployBlueprint {
                code: BlueprintCode::new("collection", version),
            },
        ) {
            Ok(Outcome::BlueprintDeployed(address)) => address,
            other => panic!("unexpected deploy result: {other:?}"),
        }
    }

    fn deploy_registry(ledger: &mut Ledger, binding: BindingMode) -> RegistryRef {
        match submit(
            ledger,
            DEPLOYER,
            Command::DeployRegistry {
                config: RegistryConfig {
                    binding,
                    creation: CreationPolicy::Open,
                },
            },
        ) {
            Ok(Outcome::RegistryDeployed(address)) => address,
            other => panic!("unexpected deploy result: {other:?}"),
        }
    }

    fn create(ledger: &mut Ledger, registry: RegistryRef) -> InstanceRef {
        match submit(
            ledger,
            OWNER,
            Command::CreateInstance {
                registry,
                params: CreateParams::default(),
            },
        ) {
            Ok(Outcome::InstanceCreated { address, .. }) => address,
            other => panic!("unexpected create result: {other:?}"),
        }
    }

    fn call(
        ledger: &mut Ledger,
        caller: u8,
        instance: InstanceRef,
        method: &str,
        args: Vec<u8>,
    ) -> Result<Vec<u8>, Error> {
        match submit(
            ledger,
            caller,
            Command::CallInstance {
                instance,
                method: method.to_string(),
                args,
            },
        )? {
            Outcome::Returned(out) => Ok(out),
            other => panic!("unexpected call result: {other:?}"),
        }
    }

    fn version_of(ledger: &mut Ledger, instance: InstanceRef) -> u32 {
        let out = call(ledger, OWNER, instance, "version", encode_args(()).expect("encode"))
            .expect("version call");

        candid::decode_one(&out).expect("decode version")
    }

    fn setup(binding: BindingMode) -> (Ledger, LogicRef, RegistryRef) {
        let mut ledger = Ledger::new(LogicCatalog::builtin());
        let b1 = deploy_blueprint(&mut ledger, 1);
        let registry = deploy_registry(&mut ledger, binding);
        submit(
            &mut ledger,
            DEPLOYER,
            Command::Initialize {
                registry,
                admin: p(DEPLOYER),
                upgrader: p(UPGRADER),
                blueprint: b1,
            },
        )
        .expect("initialize");

        (ledger, b1, registry)
    }

    #[test]
    fn out_of_order_transactions_are_not_journaled() {
        let mut ledger = Ledger::new(LogicCatalog::builtin());
        let tx = Transaction {
            seq: 5,
            caller: p(DEPLOYER),
            timestamp: 0,
            command: Command::DeployBlueprint {
                code: BlueprintCode::new("collection", 1),
            },
        };

        let err = ledger.submit(tx).expect_err("seq gap");
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
        assert_eq!(ledger.head(), 0);
    }

    #[test]
    fn unknown_code_is_rejected_and_journaled() {
        let mut ledger = Ledger::new(LogicCatalog::builtin());

        let err = submit(
            &mut ledger,
            DEPLOYER,
            Command::DeployBlueprint {
                code: BlueprintCode::new("nope", 1),
            },
        )
        .expect_err("unknown code");

        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(ledger.head(), 1);
        assert!(!ledger.journal()[0].is_applied());
        assert!(ledger.snapshot().blueprints.is_empty());
    }

    #[test]
    fn each_deploy_allocates_an_independent_blueprint() {
        let mut ledger = Ledger::new(LogicCatalog::builtin());
        let a = deploy_blueprint(&mut ledger, 1);
        let b = deploy_blueprint(&mut ledger, 1);

        assert_ne!(a, b);
        assert_eq!(ledger.blueprint(a).expect("a").version, 1);
        assert_eq!(ledger.blueprint(b).expect("b").deployed_at, 20);
    }

    #[test]
    fn events_are_recorded_once_per_successful_mutation() {
        let (mut ledger, b1, registry) = setup(BindingMode::Snapshot);
        let b2 = deploy_blueprint(&mut ledger, 2);

        create(&mut ledger, registry);
        submit(
            &mut ledger,
            OWNER,
            Command::UpgradeBlueprint {
                registry,
                blueprint: b2,
            },
        )
        .expect_err("owner is not an upgrader");
        let outcome = submit(
            &mut ledger,
            UPGRADER,
            Command::UpgradeBlueprint {
                registry,
                blueprint: b2,
            },
        )
        .expect("upgrader");

        assert_eq!(outcome, Outcome::BlueprintUpgraded { old: b1, new: b2 });

        let role = |kind, identity: u8, grant: bool| {
            if grant {
                Command::GrantRole {
                    registry,
                    kind,
                    identity: p(identity),
                }
            } else {
                Command::RevokeRole {
                    registry,
                    kind,
                    identity: p(identity),
                }
            }
        };

        submit(&mut ledger, DEPLOYER, role(RoleKind::Upgrader, OWNER, true)).expect("grant");
        submit(&mut ledger, DEPLOYER, role(RoleKind::Upgrader, UPGRADER, true))
            .expect_err("already a holder");
        submit(&mut ledger, DEPLOYER, role(RoleKind::Upgrader, UPGRADER, false)).expect("revoke");
        submit(&mut ledger, DEPLOYER, role(RoleKind::Admin, DEPLOYER, false))
            .expect_err("last admin");

        let kinds: Vec<_> = ledger.events_for(registry).map(|e| &e.event).collect();
        assert_eq!(kinds.len(), 5);
        assert!(matches!(kinds[0], RegistryEvent::Initialized { .. }));
        assert!(matches!(kinds[1], RegistryEvent::InstanceCreated { .. }));
        assert!(matches!(kinds[2], RegistryEvent::BlueprintUpgraded { .. }));
        assert_eq!(
            kinds[3],
            &RegistryEvent::RoleGranted {
                kind: RoleKind::Upgrader,
                identity: p(OWNER),
                by: p(DEPLOYER),
            }
        );
        assert_eq!(
            kinds[4],
            &RegistryEvent::RoleRevoked {
                kind: RoleKind::Upgrader,
                identity: p(UPGRADER),
                by: p(DEPLOYER),
            }
        );
    }

    #[test]
    fn snapshot_instances_keep_their_blueprint_across_upgrades() {
        let (mut ledger, b1, registry) = setup(BindingMode::Snapshot);
        let before = create(&mut ledger, registry);
        let b2 = deploy_blueprint(&mut ledger, 2);
        submit(
            &mut ledger,
            UPGRADER,
            Command::UpgradeBlueprint {
                registry,
                blueprint: b2,
            },
        )
        .expect("upgrade");
        let after = create(&mut ledger, registry);

        assert_eq!(ledger.resolve_blueprint(before).expect("resolve"), b1);
        assert_eq!(ledger.resolve_blueprint(after).expect("resolve"), b2);
        assert_eq!(version_of(&mut ledger, before), 1);
        assert_eq!(version_of(&mut ledger, after), 2);
    }

    #[test]
    fn live_instances_follow_the_current_blueprint() {
        let (mut ledger, _, registry) = setup(BindingMode::Live);
        let instance = create(&mut ledger, registry);
        let b2 = deploy_blueprint(&mut ledger, 2);
        submit(
            &mut ledger,
            UPGRADER,
            Command::UpgradeBlueprint {
                registry,
                blueprint: b2,
            },
        )
        .expect("upgrade");

        assert_eq!(ledger.resolve_blueprint(instance).expect("resolve"), b2);
        assert_eq!(version_of(&mut ledger, instance), 2);
    }

    #[test]
    fn instance_storage_is_isolated_and_failed_calls_change_nothing() {
        let (mut ledger, _, registry) = setup(BindingMode::Snapshot);
        let a = create(&mut ledger, registry);
        let b = create(&mut ledger, registry);

        call(
            &mut ledger,
            OWNER,
            a,
            "set",
            encode_args(("k", vec![1u8, 2])).expect("encode"),
        )
        .expect("owner sets");

        let err = call(
            &mut ledger,
            UPGRADER,
            a,
            "set",
            encode_args(("k", vec![9u8])).expect("encode"),
        )
        .expect_err("non-owner");
        assert_eq!(err.kind(), ErrorKind::Logic);

        let got: Option<Vec<u8>> = candid::decode_one(
            &call(&mut ledger, OWNER, a, "get", encode_one("k").expect("encode")).expect("get"),
        )
        .expect("decode");
        assert_eq!(got, Some(vec![1, 2]));
        assert!(ledger.instance(b).expect("b").storage.is_empty());
    }

    #[test]
    fn queries_on_missing_addresses_are_not_found() {
        let ledger = Ledger::new(LogicCatalog::builtin());

        let err = ledger
            .registry(RegistryRef::new(p(9).0))
            .expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn replay_reproduces_identical_state() {
        let (mut ledger, _, registry) = setup(BindingMode::Snapshot);
        let instance = create(&mut ledger, registry);
        call(
            &mut ledger,
            OWNER,
            instance,
            "set",
            encode_args(("k", vec![7u8])).expect("encode"),
        )
        .expect("set");
        submit(
            &mut ledger,
            DEPLOYER,
            Command::GrantRole {
                registry,
                kind: RoleKind::Upgrader,
                identity: p(OWNER),
            },
        )
        .expect("grant");
        submit(
            &mut ledger,
            DEPLOYER,
            Command::RevokeRole {
                registry,
                kind: RoleKind::Admin,
                identity: p(DEPLOYER),
            },
        )
        .expect_err("last admin");

        let replayed = Ledger::replay(LogicCatalog::builtin(), ledger.journal().to_vec())
            .expect("replay");

        assert_eq!(replayed.snapshot(), ledger.snapshot());
        assert_eq!(replayed.journal(), ledger.journal());
    }

    #[test]
    fn replay_detects_a_catalog_that_disagrees_with_the_journal() {
        let (ledger, _, _) = setup(BindingMode::Snapshot);

        let err = Ledger::replay(LogicCatalog::new(), ledger.journal().to_vec())
            .expect_err("empty catalog cannot deploy");
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    }
}
