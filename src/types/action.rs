//! Decision - what to do with one entry

use std::fmt;

/// Decision computed per entry by the resolver or the sync arbiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Destination is free; create it
    Add,

    /// Replace what occupies the destination
    Overwrite,

    /// Leave the destination alone
    Skip,

    /// Add at a collision-free variant of the destination path
    Rename,

    /// Remove the destination
    Delete,

    /// Operator canceled the run
    Cancel,
}

impl Decision {
    /// Reported action for a mutating decision
    pub fn action(&self) -> Option<Action> {
        match self {
            Decision::Add | Decision::Rename => Some(Action::Add),
            Decision::Overwrite => Some(Action::Update),
            Decision::Delete => Some(Action::Delete),
            Decision::Skip | Decision::Cancel => None,
        }
    }
}

/// Action shown to the operator for each processed path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Add,
    Update,
    Delete,
}

impl Action {
    /// Three-letter prefix used in per-entry output
    pub fn prefix(&self) -> &'static str {
        match self {
            Action::Add => "ADD",
            Action::Update => "UPD",
            Action::Delete => "DEL",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}
