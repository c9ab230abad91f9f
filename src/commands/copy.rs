//! Copy and move commands

use super::pipeline::{CopyHandler, Pass};
use crate::config::Config;
use crate::context::RunContext;
use crate::diff::ConflictResolver;
use crate::executor::Executor;
use crate::scanner::Enumerator;
use crate::types::FerryError;

/// Transfer every source root into the target, one root after the other
pub fn run(
    config: &Config,
    ctx: &mut RunContext,
    enumerator: &dyn Enumerator,
) -> Result<(), FerryError> {
    let executor = Executor::new(config.operation.transfer(), config.effective_structure_only());
    let resolver = ConflictResolver::new(
        config.conflict_policy,
        config.compare,
        config.effective_structure_only(),
    );
    // One handler for all roots: an escalated answer holds for the whole run.
    let mut handler = CopyHandler::new(resolver, executor);

    for source in &config.sources {
        if ctx.is_canceled() {
            break;
        }
        tracing::debug!(
            operation = config.operation.name(),
            source = %source.display(),
            target = %config.target.display(),
            "processing source root"
        );

        let pass = Pass {
            source_root: source,
            target_root: &config.target,
            flatten: config.flatten,
            ignored: None,
        };
        pass.run(ctx, enumerator, &mut handler, None)?;
    }

    Ok(())
}
