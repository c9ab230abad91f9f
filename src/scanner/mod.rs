//! Source entry enumeration

mod walker;

pub use walker::{list_tree, TreeListing, WalkEnumerator, IGNORE_FILE_NAME};

use crate::types::{Entry, FerryError};
use std::path::Path;

/// Yields matched entries under a root, parents before children.
///
/// A subtree that cannot be read comes out as an `Err` item and the walk
/// goes on with its siblings. Consumers stop early by dropping the iterator.
pub trait Enumerator {
    fn entries<'a>(
        &'a self,
        root: &Path,
    ) -> Result<Box<dyn Iterator<Item = Result<Entry, FerryError>> + 'a>, FerryError>;
}
