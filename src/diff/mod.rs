//! Decision logic - comparison, path mapping, conflict resolution and arbitration

mod compare;
mod path;
mod resolve;
mod synchronize;

pub use compare::{compare_modified, directories_equal, files_equal};
pub use path::{check_roots_disjoint, map_destination, normalize, unique_path};
pub use resolve::{ConflictResolver, Resolution};
pub use synchronize::{SyncArbiter, Verdict, Winner};
