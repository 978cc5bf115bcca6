//! Runtime store options.

use serde::{Deserialize, Serialize};

/// Runtime-configurable store behavior.
///
/// Passed at construction or swapped wholesale through the store's
/// `reconfigure` method. There is no partial merge: start from
/// [`StoreOptions::default`] and override the fields you care about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOptions {
    /// Publish `added`/`modified`/`removed` and custom events. The
    /// lifecycle signals `ready` and `cleared` fire regardless.
    pub publish: bool,
    /// Emit a per-key `removed` event for each cached entry evicted by
    /// `clear`. Off by default: `clear` then evicts silently and emits
    /// only the single `cleared` event.
    pub publish_remove_on_clear: bool,
    /// Field name used by `put` to derive the key from an object value.
    /// When unset, `put` fails with an invalid-key error.
    pub primary_key: Option<String>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            publish: true,
            publish_remove_on_clear: false,
            primary_key: None,
        }
    }
}

impl StoreOptions {
    /// Options with a primary-key field configured for `put`.
    pub fn with_primary_key(field: impl Into<String>) -> Self {
        Self {
            primary_key: Some(field.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_publish_but_not_per_key_clear_events() {
        let options = StoreOptions::default();
        assert!(options.publish);
        assert!(!options.publish_remove_on_clear);
        assert!(options.primary_key.is_none());
    }
}
