//! Larder Store - Namespaced Cache Engine
//!
//! A namespaced, in-memory object cache that mirrors its contents to a
//! pluggable storage provider and publishes change notifications. Reads
//! are synchronous and served from memory; persistence happens underneath
//! through a background writer that applies provider writes in call order.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use larder_store::{MapExt, Store};
//! use larder_storage::MemoryProvider;
//! use serde_json::json;
//!
//! # async fn demo() -> larder_core::LarderResult<()> {
//! let mut store = Store::new("sessions", Arc::new(MemoryProvider::new()))?;
//! store.load().await?;
//!
//! let result = store.set("alice", json!({"visits": 1}))?;
//! result.receipt.wait().await; // only needed for durability confirmation
//! # Ok(())
//! # }
//! ```

pub mod ext;
pub mod keyspace;
mod store;
mod writer;

pub use ext::{EnumerableExt, MapExt, MetadataExt, MetadataHandle, StorePort};
pub use keyspace::Keyspace;
pub use store::{RemoveResult, SetResult, Store};
pub use writer::WriteReceipt;

// Re-export the sibling crates' surface for convenience.
pub use larder_core::{ErrorKind, LarderError, LarderResult, StoreOptions, WriteAction};
pub use larder_events::{EventName, Publication, StoreEvent, SubscriptionId};
pub use larder_storage::{MemoryProvider, StorageProvider};
