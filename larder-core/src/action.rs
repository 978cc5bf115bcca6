//! Write action outcomes.

use serde::{Deserialize, Serialize};

/// What a mutating store operation actually did.
///
/// `set` reports `Added`, `Modified`, or `Unchanged`; `remove` reports
/// `Removed`. `Unchanged` is reported distinctly so callers can tell
/// "nothing changed" apart from a real modification: no persistence is
/// issued and no event fires for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WriteAction {
    /// The key was unseen and a record was created.
    Added,
    /// The key existed and the merged value differs from the current one.
    Modified,
    /// The key was removed.
    Removed,
    /// The merged value deep-equals the current value.
    Unchanged,
}

impl WriteAction {
    /// Whether this action altered the in-memory cache.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_is_not_a_mutation() {
        assert!(WriteAction::Added.is_mutation());
        assert!(WriteAction::Modified.is_mutation());
        assert!(WriteAction::Removed.is_mutation());
        assert!(!WriteAction::Unchanged.is_mutation());
    }
}
