//! Command implementations

mod copy;
mod pipeline;
mod sync;

pub use pipeline::{CopyHandler, EntryHandler, Handled, Pass};

use crate::config::{Config, Operation};
use crate::context::{EngineEvent, RunContext, RunStatus};
use crate::executor::apply_deferred_attributes;
use crate::scanner::WalkEnumerator;
use crate::types::FerryError;
use crate::ui::{ConsolePrompter, Reporter};
use std::sync::{Arc, Mutex};

/// Run a configured command against the console.
///
/// Entry lines stream while the run goes; the summary is printed at the end.
/// Validation failures are returned before anything is touched.
pub fn run(config: &Config) -> Result<RunStatus, FerryError> {
    // Per-entry lines would break the JSON document on stdout.
    let quiet = config.quiet || config.json_summary;
    let reporter = Arc::new(Mutex::new(Reporter::new(quiet, config.omit_skipped)));

    let mut ctx = {
        let reporter = Arc::clone(&reporter);
        RunContext::new(config.dry_run, Box::new(ConsolePrompter::new())).with_events(Box::new(
            move |event: &EngineEvent| {
                if let Ok(mut reporter) = reporter.lock() {
                    reporter.handle(event);
                }
            },
        ))
    };

    execute(config, &mut ctx)?;

    let status = ctx.status();
    if let Ok(reporter) = reporter.lock() {
        reporter.finish(&ctx.telemetry, status, config.dry_run, config.json_summary);
    }
    Ok(status)
}

/// Validate, then dispatch to the command with a caller-built context
pub fn execute(config: &Config, ctx: &mut RunContext) -> Result<(), FerryError> {
    config.validate()?;
    let enumerator = WalkEnumerator::from_config(config)?;

    tracing::info!(
        operation = config.operation.name(),
        dry_run = config.dry_run,
        "run started"
    );

    let result = match config.operation {
        Operation::Copy | Operation::Move => copy::run(config, ctx, &enumerator),
        Operation::Sync => sync::run(config, ctx, &enumerator),
    };
    // Directories created before a failure or cancel still get their attributes.
    apply_deferred_attributes(ctx);
    result?;

    tracing::info!(telemetry = ?ctx.telemetry, failures = ctx.failures(), "run finished");
    Ok(())
}
