use hatchery_core::{
    ErrorKind,
    config::schema::RegistryConfig,
    ids::RoleKind,
    infra::{Endpoint, FileEndpoint, LocalEndpoint},
    logic::LogicCatalog,
    model::BlueprintCode,
    workflow::deploy::{DeployPlan, DeploymentCheckpoint, DeploymentOrchestrator, RetryPolicy},
};
use hatchery_testkit::{Fake, Fault, FlakyEndpoint};
use std::{
    cell::RefCell,
    panic::{self, AssertUnwindSafe},
    rc::Rc,
    time::Duration,
};

fn plan() -> DeployPlan {
    DeployPlan {
        deployer: Fake::identity(1),
        admin: Fake::identity(2),
        upgrader: Fake::identity(3),
        blueprint: BlueprintCode::new("collection", 1),
        registry: RegistryConfig::default(),
    }
}

fn retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(4),
    }
}

fn flaky(failures: u32) -> FlakyEndpoint<LocalEndpoint> {
    FlakyEndpoint::new(LocalEndpoint::new(LogicCatalog::builtin()), failures)
}

#[test]
fn transient_failures_are_retried_until_success() {
    let endpoint = flaky(2).only("deploy_registry");
    let mut orchestrator = DeploymentOrchestrator::new(endpoint, retry(3)).with_sleep(|_| {});
    let mut checkpoint = DeploymentCheckpoint::default();

    let outcome = orchestrator.run(&plan(), &mut checkpoint).expect("deploy");

    // blueprint + 3 registry attempts + initialize
    assert_eq!(orchestrator.endpoint().submits(), 5);
    let state = orchestrator
        .endpoint()
        .registry(outcome.registry)
        .expect("registry");
    assert_eq!(state.current_blueprint(), Some(outcome.blueprint));
}

#[test]
fn exhausted_retries_keep_the_checkpoint_for_resume() {
    let endpoint = flaky(5).only("deploy_registry");
    let mut orchestrator = DeploymentOrchestrator::new(endpoint, retry(2)).with_sleep(|_| {});
    let mut checkpoint = DeploymentCheckpoint::default();

    let err = orchestrator
        .run(&plan(), &mut checkpoint)
        .expect_err("registry never lands");
    assert!(err.is_retryable());
    assert!(checkpoint.blueprint.is_some());
    assert!(checkpoint.registry.is_none());

    // resume on a healthy endpoint over the same ledger
    let ledger = orchestrator.into_endpoint().into_inner().into_ledger();
    let healthy = LocalEndpoint::with_clock(ledger, || 0);
    let mut orchestrator = DeploymentOrchestrator::new(healthy, retry(2)).with_sleep(|_| {});

    let outcome = orchestrator.run(&plan(), &mut checkpoint).expect("resume");
    assert!(outcome.resumed);
    assert_eq!(checkpoint.blueprint, Some(outcome.blueprint));
    assert_eq!(orchestrator.endpoint().ledger().snapshot().blueprints.len(), 1);
}

#[test]
fn lost_initialize_receipt_is_tolerated_on_retry() {
    let endpoint = flaky(1)
        .only("initialize")
        .with_fault(Fault::ReceiptLost);
    let mut orchestrator = DeploymentOrchestrator::new(endpoint, retry(3)).with_sleep(|_| {});
    let mut checkpoint = DeploymentCheckpoint::default();

    let outcome = orchestrator.run(&plan(), &mut checkpoint).expect("deploy");

    let state = orchestrator
        .endpoint()
        .registry(outcome.registry)
        .expect("registry");
    assert!(state.roles().is_holder(RoleKind::Admin, Fake::identity(2)));
}

#[test]
fn crash_after_registry_resumes_from_the_persisted_checkpoint() {
    let saved = Rc::new(RefCell::new(DeploymentCheckpoint::default()));
    let sink = Rc::clone(&saved);
    let endpoint = flaky(1).only("initialize").with_fault(Fault::Crash);
    let mut orchestrator = DeploymentOrchestrator::new(endpoint, retry(3))
        .with_sleep(|_| {})
        .with_checkpoint_sink(move |cp| {
            *sink.borrow_mut() = cp.clone();
            Ok(())
        });

    // the in-memory checkpoint dies with the process
    let crashed = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut lost = DeploymentCheckpoint::default();
        orchestrator.run(&plan(), &mut lost)
    }));
    assert!(crashed.is_err());

    let mut checkpoint = saved.borrow().clone();
    assert!(checkpoint.blueprint.is_some());
    assert!(checkpoint.registry.is_some());

    let ledger = orchestrator.into_endpoint().into_inner().into_ledger();
    let healthy = LocalEndpoint::with_clock(ledger, || 0);
    let mut orchestrator = DeploymentOrchestrator::new(healthy, retry(1));

    let outcome = orchestrator.run(&plan(), &mut checkpoint).expect("resume");
    assert!(outcome.resumed);

    let snapshot = orchestrator.endpoint().ledger().snapshot();
    assert_eq!(snapshot.blueprints.len(), 1);
    assert_eq!(snapshot.registries.len(), 1);
    let state = orchestrator
        .endpoint()
        .registry(outcome.registry)
        .expect("registry");
    assert!(state.is_initialized());
}

#[test]
fn validation_errors_are_not_retried() {
    let mut orchestrator = DeploymentOrchestrator::new(flaky(0), retry(5)).with_sleep(|_| {});
    let mut checkpoint = DeploymentCheckpoint::default();
    let mut bad = plan();
    bad.blueprint = BlueprintCode::new("missing", 1);

    let err = orchestrator
        .run(&bad, &mut checkpoint)
        .expect_err("unknown code");

    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(orchestrator.endpoint().submits(), 1);
    assert!(checkpoint.is_empty());
}

#[test]
fn file_endpoint_deployment_survives_reopen() {
    let dir = tempfile::tempdir().expect("create tempdir");
    let path = dir.path().join("local.ledger.jsonl");
    let timeout = Duration::from_secs(1);

    let endpoint = FileEndpoint::open(&path, LogicCatalog::builtin(), timeout).expect("open");
    let mut orchestrator = DeploymentOrchestrator::new(endpoint, retry(1));
    let mut checkpoint = DeploymentCheckpoint::default();
    let outcome = orchestrator.run(&plan(), &mut checkpoint).expect("deploy");
    drop(orchestrator);

    let reopened = FileEndpoint::open(&path, LogicCatalog::builtin(), timeout).expect("reopen");
    let state = reopened.registry(outcome.registry).expect("registry");
    assert!(state.is_initialized());
    assert_eq!(state.current_blueprint(), Some(outcome.blueprint));

    // a second run against the reopened journal resumes and verifies
    let mut orchestrator = DeploymentOrchestrator::new(reopened, retry(1));
    let again = orchestrator.run(&plan(), &mut checkpoint).expect("resume");
    assert_eq!(again.registry, outcome.registry);
}
