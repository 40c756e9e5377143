use hatchery_cli::{
    cli::{DeployArgs, InspectArgs},
    deploy, inspect,
};
use hatchery_core::{config::Config, ids::RegistryRef};
use std::{fs, path::Path};

const DEPLOYER: &str = "2vxsx-fae";

fn write_config(dir: &Path) -> std::path::PathBuf {
    let ledger = dir.join("ledger.jsonl");
    let config = dir.join("hatchery.toml");
    fs::write(
        &config,
        format!(
            r#"
            [registry]
            binding = "live"

            [log]
            level = "warn"

            [profiles.local]
            endpoint = "file://{}"
            deployer = "{DEPLOYER}"
            confirmation_timeout_ms = 1000

            [profiles.mainnet]
            endpoint = "https://mainnet.example"
            deployer = "{DEPLOYER}"
            "#,
            ledger.display()
        ),
    )
    .expect("write config");

    config
}

fn deploy_args(dir: &Path, profile: &str) -> DeployArgs {
    DeployArgs {
        profile: profile.to_string(),
        config: write_config(dir),
        admin: None,
        upgrader: None,
        checkpoint: Some(dir.join("checkpoint.json")),
        fresh: false,
    }
}

fn registry_from(output: &str) -> RegistryRef {
    let line = output
        .lines()
        .find_map(|line| line.strip_prefix("registry:"))
        .expect("registry line");

    line.trim().parse().expect("registry principal")
}

#[test]
fn deploy_then_inspect() {
    let dir = tempfile::tempdir().expect("create tempdir");

    Config::reset_for_tests();
    let output = deploy::run(&deploy_args(dir.path(), "local")).expect("deploy");
    let registry = registry_from(&output);
    assert!(dir.path().join("checkpoint.json").exists());

    Config::reset_for_tests();
    let view = inspect::run(&InspectArgs {
        profile: "local".to_string(),
        config: dir.path().join("hatchery.toml"),
        registry,
    })
    .expect("inspect");

    assert!(view.contains(&registry.to_string()));
    assert!(view.contains("\"binding\": \"live\""));
    assert!(view.contains("\"phase\": \"Initialized\""));
    assert!(view.contains(DEPLOYER));

    // re-running resumes from the checkpoint and lands on the same registry
    Config::reset_for_tests();
    let again = deploy::run(&deploy_args(dir.path(), "local")).expect("redeploy");
    assert_eq!(registry_from(&again), registry);
    assert!(again.contains("resumed"));

    Config::reset_for_tests();
}

#[test]
fn remote_profile_fails_without_touching_the_checkpoint() {
    let dir = tempfile::tempdir().expect("create tempdir");

    Config::reset_for_tests();
    let err = deploy::run(&deploy_args(dir.path(), "mainnet")).expect_err("https endpoint");
    assert!(err.to_string().contains("unsupported endpoint"));
    assert!(!dir.path().join("checkpoint.json").exists());

    Config::reset_for_tests();
}
