use clap::Parser;
use hatchery_cli::{
    CliError,
    cli::{Cli, Command},
    deploy, inspect,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<String, CliError> {
    match &cli.command {
        Command::Deploy(args) => deploy::run(args),
        Command::Inspect(args) => inspect::run(args),
    }
}
