//! Event names and payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Name of a store event.
///
/// Five names are built in; additional names can be registered at runtime
/// through the publisher and are carried as [`EventName::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventName {
    /// A record was created for an unseen key.
    Added,
    /// An existing record's value changed.
    Modified,
    /// A record was removed.
    Removed,
    /// The whole store was cleared.
    Cleared,
    /// `load` (or an initializing `clear`) completed.
    Ready,
    /// A dynamically registered event.
    Custom(String),
}

impl EventName {
    /// The built-in event names, in their canonical order.
    pub const BUILT_IN: [EventName; 5] = [
        EventName::Added,
        EventName::Modified,
        EventName::Removed,
        EventName::Cleared,
        EventName::Ready,
    ];

    /// The wire/display name of this event.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Removed => "removed",
            Self::Cleared => "cleared",
            Self::Ready => "ready",
            Self::Custom(name) => name,
        }
    }

    /// Parse a name, mapping the five built-ins and treating anything else
    /// as a custom name.
    pub fn parse(name: &str) -> Self {
        match name {
            "added" => Self::Added,
            "modified" => Self::Modified,
            "removed" => Self::Removed,
            "cleared" => Self::Cleared,
            "ready" => Self::Ready,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A published store event with its payload.
///
/// Payload shapes mirror the store's change semantics: `Added` and
/// `Removed` carry the full (deep-copied) value, `Modified` carries the
/// changed partial and the prior values at exactly the changed paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StoreEvent {
    Added {
        key: String,
        value: Value,
    },
    Modified {
        key: String,
        /// The partial of changed/new fields (whole value for non-objects).
        changed: Value,
        /// Prior values at the changed paths (whole prior value for
        /// non-objects).
        previous: Value,
    },
    Removed {
        key: String,
        value: Value,
    },
    Cleared,
    Ready,
    Custom {
        name: String,
        payload: Value,
    },
}

impl StoreEvent {
    /// The name this event publishes under.
    pub fn name(&self) -> EventName {
        match self {
            Self::Added { .. } => EventName::Added,
            Self::Modified { .. } => EventName::Modified,
            Self::Removed { .. } => EventName::Removed,
            Self::Cleared => EventName::Cleared,
            Self::Ready => EventName::Ready,
            Self::Custom { name, .. } => EventName::Custom(name.clone()),
        }
    }

    /// Whether this event bypasses publication gating.
    ///
    /// `ready` and `cleared` are lifecycle-completion signals and fire even
    /// when publication is suppressed.
    pub fn always_fires(&self) -> bool {
        matches!(self, Self::Ready | Self::Cleared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_names_roundtrip() {
        for name in EventName::BUILT_IN {
            assert_eq!(EventName::parse(name.as_str()), name);
        }
    }

    #[test]
    fn unknown_names_parse_as_custom() {
        assert_eq!(
            EventName::parse("expired"),
            EventName::Custom("expired".to_string())
        );
    }

    #[test]
    fn lifecycle_events_always_fire() {
        assert!(StoreEvent::Ready.always_fires());
        assert!(StoreEvent::Cleared.always_fires());
        assert!(!StoreEvent::Added {
            key: "k".to_string(),
            value: serde_json::json!(1),
        }
        .always_fires());
    }
}
