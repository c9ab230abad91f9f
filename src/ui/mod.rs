//! Operator-facing output and prompts

mod prompt;
mod report;

pub use prompt::{ConflictAnswer, ConsolePrompter, PreferenceAnswer, Prompter, ScriptedPrompter};
pub use report::{ErrorRecord, Reporter};
