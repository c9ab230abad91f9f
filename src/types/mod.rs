//! Core type definitions for ferry

mod action;
mod entry;
mod error;
mod policy;
mod telemetry;

pub use action::{Action, Decision};
pub use entry::{Attributes, DestState, Entry};
pub use error::{map_io_error, FerryError};
pub use policy::{
    CompareProperty, CompareSpec, ConflictPolicy, SearchTarget, SyncMode, SyncPreference, Transfer,
};
pub use telemetry::Telemetry;
