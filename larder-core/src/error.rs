//! Error types for Larder operations.

use thiserror::Error;

/// Result alias used throughout the workspace.
pub type LarderResult<T> = Result<T, LarderError>;

/// Machine-checkable error kind.
///
/// Every [`LarderError`] maps to exactly one kind, and an error can be
/// constructed for any kind via [`LarderError::of_kind`]. Callers that
/// dispatch on failure mode should match on the kind rather than the
/// display string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A key-accessing operation ran before `load` or `clear`.
    UninitializedAccess,
    /// The namespace contains the reserved separator character.
    InvalidNamespace,
    /// A key could not be derived or is not usable as a key.
    InvalidKey,
    /// The addressed key is not present in the store.
    NonexistentKey,
    /// A value (or metadata value) was absent where one is required.
    UndefinedValue,
    /// An event name that was never registered with the publisher.
    UnknownEvent,
    /// The storage provider failed.
    Provider,
}

/// Validation and access errors raised synchronously by the store.
///
/// Failures in the asynchronous persistence tail are never surfaced
/// through this type; they are reported through the logging side channel
/// (see the store crate's writer module).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LarderError {
    #[error("store is uninitialized: call load or clear first")]
    UninitializedAccess,

    #[error("namespace {namespace:?} contains the reserved separator character")]
    InvalidNamespace { namespace: String },

    #[error("invalid key: {reason}")]
    InvalidKey { reason: String },

    #[error("key {key:?} does not exist")]
    NonexistentKey { key: String },

    #[error("value must not be undefined")]
    UndefinedValue,

    #[error("event {name:?} is not registered")]
    UnknownEvent { name: String },

    #[error("storage provider failed: {reason}")]
    Provider { reason: String },
}

impl LarderError {
    /// The machine-checkable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UninitializedAccess => ErrorKind::UninitializedAccess,
            Self::InvalidNamespace { .. } => ErrorKind::InvalidNamespace,
            Self::InvalidKey { .. } => ErrorKind::InvalidKey,
            Self::NonexistentKey { .. } => ErrorKind::NonexistentKey,
            Self::UndefinedValue => ErrorKind::UndefinedValue,
            Self::UnknownEvent { .. } => ErrorKind::UnknownEvent,
            Self::Provider { .. } => ErrorKind::Provider,
        }
    }

    /// Construct an error of the given kind with generic context.
    ///
    /// Call sites inside the engine construct variants directly with their
    /// context fields filled in; this constructor exists for callers (and
    /// capability extensions) that need to raise a recognized kind of
    /// their own.
    pub fn of_kind(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::UninitializedAccess => Self::UninitializedAccess,
            ErrorKind::InvalidNamespace => Self::InvalidNamespace {
                namespace: String::new(),
            },
            ErrorKind::InvalidKey => Self::InvalidKey {
                reason: "key is not usable".to_string(),
            },
            ErrorKind::NonexistentKey => Self::NonexistentKey { key: String::new() },
            ErrorKind::UndefinedValue => Self::UndefinedValue,
            ErrorKind::UnknownEvent => Self::UnknownEvent {
                name: String::new(),
            },
            ErrorKind::Provider => Self::Provider {
                reason: "storage provider failed".to_string(),
            },
        }
    }

    /// Shorthand for a [`LarderError::Provider`] with a reason. Intended
    /// for storage provider implementations.
    pub fn provider(reason: impl Into<String>) -> Self {
        Self::Provider {
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`LarderError::NonexistentKey`] with the key filled in.
    pub fn nonexistent(key: impl Into<String>) -> Self {
        Self::NonexistentKey { key: key.into() }
    }

    /// Shorthand for a [`LarderError::InvalidKey`] with a reason.
    pub fn invalid_key(reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            reason: reason.into(),
        }
    }
}
