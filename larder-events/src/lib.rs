//! Larder Events - Change Notification Publisher
//!
//! Typed event names and payloads for store change notifications, plus the
//! [`Publisher`] that dispatches them to subscribers.
//!
//! # Dispatch model
//!
//! Publication is synchronous and ordered: subscribers run on the calling
//! thread, in subscription order, after the corresponding state change has
//! been committed to the in-memory cache. Persistence to the storage
//! provider may still be in flight when a subscriber runs; payloads always
//! reflect the new in-memory state.
//!
//! # Gating
//!
//! Publication can be globally suppressed (see [`Publication`]), except for
//! the lifecycle signals `ready` and `cleared`, which always fire so
//! callers can reliably detect end-of-initialization and end-of-clear.

mod event;
mod publisher;

pub use event::{EventName, StoreEvent};
pub use publisher::{Publication, Publisher, SubscriptionId};
