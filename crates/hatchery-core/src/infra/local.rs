use super::{Endpoint, now_millis};
use crate::{
    Error,
    ids::{Identity, InstanceRef, LogicRef, RegistryRef},
    ledger::{Command, Ledger, Receipt},
    logic::LogicCatalog,
    model::{Blueprint, InstanceState, RegistryState},
};

///
/// LocalEndpoint
/// In-process ledger. Confirmation is immediate.
///

pub struct LocalEndpoint {
    ledger: Ledger,
    clock: Box<dyn FnMut() -> u64 + Send>,
}

impl LocalEndpoint {
    #[must_use]
    pub fn new(catalog: LogicCatalog) -> Self {
        Self::with_clock(Ledger::new(catalog), now_millis)
    }

    /// Wrap an existing ledger, stamping transactions with `clock`.
    pub fn with_clock(ledger: Ledger, clock: impl FnMut() -> u64 + Send + 'static) -> Self {
        Self {
            ledger,
            clock: Box::new(clock),
        }
    }

    #[must_use]
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    #[must_use]
    pub fn into_ledger(self) -> Ledger {
        self.ledger
    }
}

impl Endpoint for LocalEndpoint {
    fn submit(&mut self, caller: Identity, command: Command) -> Result<Receipt, Error> {
        let now = (self.clock)();
        let tx = self.ledger.transaction(caller, now, command);

        self.ledger.submit(tx)
    }

    fn blueprint(&self, address: LogicRef) -> Result<Blueprint, Error> {
        self.ledger.blueprint(address).cloned()
    }

    fn registry(&self, address: RegistryRef) -> Result<RegistryState, Error> {
        self.ledger.registry(address).cloned()
    }

    fn instance(&self, address: InstanceRef) -> Result<InstanceState, Error> {
        self.ledger.instance(address).cloned()
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, ledger::Outcome, model::BlueprintCode, test::p};

    #[test]
    fn transactions_are_stamped_by_the_clock() {
        let mut tick = 100;
        let mut endpoint = LocalEndpoint::with_clock(Ledger::new(LogicCatalog::builtin()), move || {
            tick += 1;
            tick
        });

        let receipt = endpoint
            .submit(
                p(1),
                Command::DeployBlueprint {
                    code: BlueprintCode::new("collection", 1),
                },
            )
            .expect("deploy");
        let Outcome::BlueprintDeployed(address) = receipt.outcome else {
            panic!("unexpected outcome {:?}", receipt.outcome);
        };

        assert_eq!(receipt.seq, 1);
        assert_eq!(endpoint.blueprint(address).expect("blueprint").deployed_at, 101);

        let err = endpoint
            .registry(RegistryRef::new(address.0))
            .expect_err("a blueprint is not a registry");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
