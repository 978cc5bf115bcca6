//! Larder Core - Shared Types and Leaf Logic
//!
//! Pure data types and dependency-free logic for the Larder cache engine.
//! All other crates in the workspace depend on this one. This crate contains
//! no I/O: errors, write actions, runtime options, and the value differ
//! live here.

pub mod action;
pub mod diff;
pub mod error;
pub mod options;

pub use action::WriteAction;
pub use error::{ErrorKind, LarderError, LarderResult};
pub use options::StoreOptions;

/// Separator reserved for derived storage keys. Namespaces must not
/// contain it.
pub const NS_SEPARATOR: char = '#';
