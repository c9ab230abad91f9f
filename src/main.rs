use anyhow::Context;
use clap::Parser;
use console::style;
use ferry::config::Cli;
use ferry::{Config, RunStatus};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(status) => ExitCode::from(status.exit_code()),
        Err(e) => {
            eprintln!("{} {:#}", style("error:").red().bold(), e);
            ExitCode::from(RunStatus::Failed.exit_code())
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<RunStatus> {
    // Convert CLI args to Config - this validates immediately
    let config = Config::try_from(cli).context("invalid configuration")?;
    let status = ferry::commands::run(&config)
        .with_context(|| format!("{} failed", config.operation.name()))?;
    Ok(status)
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .init();
}
