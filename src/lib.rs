//! # ferry - bulk copy, move and sync of matched files
//!
//! Walks a source tree, maps each matched entry onto a target tree and
//! settles every collision through an escalating conflict policy: ask,
//! then remember "yes to all" or "no to all" for the rest of the run.
//! Sync adds contribute, mirror and two-way modes. Every command has a
//! dry-run that reports exactly what a live run would do.

pub mod commands;
pub mod config;
pub mod context;
pub mod diff;
pub mod executor;
pub mod hash;
pub mod scanner;
pub mod types;
pub mod ui;

// Re-export commonly used types
pub use config::{Config, Operation};
pub use context::{EngineEvent, RunContext, RunStatus};
pub use types::{Entry, FerryError, Telemetry};
