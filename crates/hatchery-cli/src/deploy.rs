use crate::{CliError, checkpoint, cli::DeployArgs, load_config, open_endpoint};
use hatchery_core::{
    log,
    log::Topic,
    workflow::deploy::{
        DeployPlan, DeploymentCheckpoint, DeploymentOrchestrator, DeploymentOutcome, RetryPolicy,
    },
};

/// `hatchery deploy`: run (or resume) the deployment sequence for a profile.
///
/// The checkpoint file is rewritten as each step lands, so a run that fails
/// or dies part way can be resumed by re-running the same command.
pub fn run(args: &DeployArgs) -> Result<String, CliError> {
    let config = load_config(&args.config)?;
    let profile = config.profile(&args.profile)?;
    let plan = DeployPlan::from_config(&config, &args.profile, args.admin, args.upgrader)?;

    let checkpoint_path = args
        .checkpoint
        .clone()
        .unwrap_or_else(|| checkpoint::default_path(&args.profile));
    let mut checkpoint = if args.fresh {
        DeploymentCheckpoint::default()
    } else {
        checkpoint::load(&checkpoint_path)?
    };

    log!(
        Topic::Deploy,
        Info,
        "deploying {} to profile '{}' via {}",
        plan.blueprint,
        args.profile,
        profile.endpoint
    );

    let endpoint = open_endpoint(profile)?;
    if args.fresh {
        checkpoint::save(&checkpoint_path, &checkpoint)?;
    }

    let mut orchestrator = DeploymentOrchestrator::new(endpoint, RetryPolicy::from(&profile.retry))
        .with_checkpoint_sink(move |cp| checkpoint::save(&checkpoint_path, cp));
    let outcome = orchestrator.run(&plan, &mut checkpoint)?;

    Ok(render(&outcome))
}

fn render(outcome: &DeploymentOutcome) -> String {
    let mut out = format!(
        "blueprint: {}\nregistry:  {}\n",
        outcome.blueprint, outcome.registry
    );
    if outcome.resumed {
        out.push_str("resumed:   yes\n");
    }

    out
}
