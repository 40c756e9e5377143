use hatchery_core::{
    Error,
    ids::{Identity, InstanceRef, LogicRef, RegistryRef},
    infra::{Endpoint, InfraError},
    ledger::{Command, Receipt},
    model::{Blueprint, InstanceState, RegistryState},
};

///
/// Fault
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Fault {
    /// The command never reaches the ledger.
    Dropped,

    /// The command is applied but its receipt is lost.
    ReceiptLost,

    /// The process dies before the command reaches the ledger (panics).
    Crash,
}

///
/// FlakyEndpoint
///
/// Wraps an endpoint and fails the first `failures` matching submits with
/// [`InfraError::Unavailable`]. Queries always pass through.
///

pub struct FlakyEndpoint<E> {
    inner: E,
    failures: u32,
    fault: Fault,
    only: Option<&'static str>,
    submits: u32,
}

impl<E: Endpoint> FlakyEndpoint<E> {
    pub const fn new(inner: E, failures: u32) -> Self {
        Self {
            inner,
            failures,
            fault: Fault::Dropped,
            only: None,
            submits: 0,
        }
    }

    #[must_use]
    pub const fn with_fault(mut self, fault: Fault) -> Self {
        self.fault = fault;
        self
    }

    /// Restrict injected failures to one command (see `Command::name`).
    #[must_use]
    pub const fn only(mut self, command: &'static str) -> Self {
        self.only = Some(command);
        self
    }

    /// Submits seen so far, failed ones included.
    #[must_use]
    pub const fn submits(&self) -> u32 {
        self.submits
    }

    pub const fn inner(&self) -> &E {
        &self.inner
    }

    pub fn into_inner(self) -> E {
        self.inner
    }
}

impl<E: Endpoint> Endpoint for FlakyEndpoint<E> {
    fn submit(&mut self, caller: Identity, command: Command) -> Result<Receipt, Error> {
        self.submits += 1;

        let targeted = self.only.is_none_or(|name| name == command.name());
        if !targeted || self.failures == 0 {
            return self.inner.submit(caller, command);
        }
        self.failures -= 1;

        let name = command.name();
        match self.fault {
            Fault::Dropped => {}
            Fault::ReceiptLost => {
                // the outcome of the real submit is discarded either way
                let _ = self.inner.submit(caller, command);
            }
            Fault::Crash => panic!("crashed while submitting {name}"),
        }

        Err(InfraError::Unavailable(format!("injected failure on {name}")).into())
    }

    fn blueprint(&self, address: LogicRef) -> Result<Blueprint, Error> {
        self.inner.blueprint(address)
    }

    fn registry(&self, address: RegistryRef) -> Result<RegistryState, Error> {
        self.inner.registry(address)
    }

    fn instance(&self, address: InstanceRef) -> Result<InstanceState, Error> {
        self.inner.instance(address)
    }
}
