//! Capability extensions over the store's internal port.
//!
//! The engine exposes a narrow internal surface, [`StorePort`], and the
//! map, enumeration, and metadata capabilities are extension traits with
//! default method bodies over that port. They are composed into the public
//! interface at compile time: bring the trait into scope and every
//! [`Store`](crate::Store) (or other port implementor) has the methods.
//!
//! Third-party capabilities follow the same shape: define a trait bound on
//! `StorePort`, implement it blanketly, and register any custom event
//! names through the port. No capability owns the cache map; the port
//! hands out copies and guarded views only, and every accessor enforces
//! the initialization check itself.

use larder_core::{LarderError, LarderResult};
use larder_events::StoreEvent;
use serde_json::Value;

use crate::store::{RemoveResult, SetResult, Store};
use crate::writer::WriteReceipt;

/// The restricted internal surface capabilities are built against.
///
/// Every method is initialization-gated. Write primitives carry the full
/// engine semantics (diffing, events, index bookkeeping, persistence), so
/// capabilities cannot bypass the change pipeline.
pub trait StorePort {
    /// Whether a key exists.
    fn contains(&self, key: &str) -> LarderResult<bool>;

    /// Deep copy of a key's value, `None` if absent.
    fn value_of(&self, key: &str) -> LarderResult<Option<Value>>;

    /// Full `set` semantics (upsert + events + persistence).
    fn write(
        &mut self,
        key: &str,
        value: Value,
        metadata: Option<Value>,
    ) -> LarderResult<SetResult>;

    /// Full `remove` semantics. Fails for nonexistent keys.
    fn erase(&mut self, key: &str) -> LarderResult<RemoveResult>;

    /// A key's metadata. Fails for nonexistent keys.
    fn metadata_of(&self, key: &str) -> LarderResult<Option<Value>>;

    /// Set a key's metadata independent of its value. Fails for
    /// nonexistent keys.
    fn write_metadata(&mut self, key: &str, value: Value) -> LarderResult<WriteReceipt>;

    /// Derive a key from an object value via the configured primary-key
    /// field.
    fn derive_key(&self, value: &Value) -> LarderResult<String>;

    /// Publish an event through the store's publisher (honors gating).
    fn emit(&mut self, event: &StoreEvent) -> LarderResult<()>;

    /// Register a custom event name.
    fn register_event(&mut self, name: &str);

    /// Guarded view of the cached keys, in insertion order.
    fn entry_keys(&self) -> LarderResult<Vec<String>>;

    /// Guarded view of the cached entries (key, deep-copied value), in
    /// insertion order.
    fn entries(&self) -> LarderResult<Vec<(String, Value)>>;
}

impl StorePort for Store {
    fn contains(&self, key: &str) -> LarderResult<bool> {
        self.contains_key(key)
    }

    fn value_of(&self, key: &str) -> LarderResult<Option<Value>> {
        self.value_copy(key)
    }

    fn write(
        &mut self,
        key: &str,
        value: Value,
        metadata: Option<Value>,
    ) -> LarderResult<SetResult> {
        self.write_value(key, value, metadata)
    }

    fn erase(&mut self, key: &str) -> LarderResult<RemoveResult> {
        self.remove_value(key)
    }

    fn metadata_of(&self, key: &str) -> LarderResult<Option<Value>> {
        self.metadata_copy(key)
    }

    fn write_metadata(&mut self, key: &str, value: Value) -> LarderResult<WriteReceipt> {
        self.set_record_metadata(key, value)
    }

    fn derive_key(&self, value: &Value) -> LarderResult<String> {
        self.key_from_value(value)
    }

    fn emit(&mut self, event: &StoreEvent) -> LarderResult<()> {
        self.publish_event(event)
    }

    fn register_event(&mut self, name: &str) {
        self.add_event(name);
    }

    fn entry_keys(&self) -> LarderResult<Vec<String>> {
        self.key_snapshot()
    }

    fn entries(&self) -> LarderResult<Vec<(String, Value)>> {
        self.entry_copies()
    }
}

/// Map-like access: `has`/`get`/`set`/`remove` and friends.
pub trait MapExt: StorePort {
    fn has(&self, key: &str) -> LarderResult<bool> {
        self.contains(key)
    }

    /// Deep copy of the stored value, or `None` if absent.
    fn get(&self, key: &str) -> LarderResult<Option<Value>> {
        self.value_of(key)
    }

    /// Deep copy of the stored value, or `default` if absent.
    fn get_or(&self, key: &str, default: Value) -> LarderResult<Value> {
        Ok(self.value_of(key)?.unwrap_or(default))
    }

    /// Store a value under a key. Object values patch the existing value;
    /// everything else replaces it. See [`SetResult`] for what happened.
    fn set(&mut self, key: &str, value: Value) -> LarderResult<SetResult> {
        self.write(key, value, None)
    }

    /// Store a value and its metadata in one call.
    fn set_with_metadata(
        &mut self,
        key: &str,
        value: Value,
        metadata: Value,
    ) -> LarderResult<SetResult> {
        self.write(key, value, Some(metadata))
    }

    /// Store an object value under the key derived from its primary-key
    /// field (see `StoreOptions::primary_key`).
    fn put(&mut self, value: Value) -> LarderResult<SetResult> {
        let key = self.derive_key(&value)?;
        self.write(&key, value, None)
    }

    /// Remove a key, returning its value.
    fn remove(&mut self, key: &str) -> LarderResult<RemoveResult> {
        self.erase(key)
    }

    /// Alias for [`MapExt::remove`].
    fn delete(&mut self, key: &str) -> LarderResult<RemoveResult> {
        self.erase(key)
    }
}

impl<P: StorePort + ?Sized> MapExt for P {}

/// Enumeration: keys, traversal, and the property-equality scan.
pub trait EnumerableExt: StorePort {
    /// The cached keys, in insertion order.
    fn keys(&self) -> LarderResult<Vec<String>> {
        self.entry_keys()
    }

    /// Visit every (key, deep-copied value) pair in insertion order.
    fn for_each(&self, mut f: impl FnMut(&str, Value)) -> LarderResult<()>
    where
        Self: Sized,
    {
        for (key, value) in self.entries()? {
            f(&key, value);
        }
        Ok(())
    }

    /// All records whose object value has `field` equal to `expected`.
    fn find_where(&self, field: &str, expected: &Value) -> LarderResult<Vec<(String, Value)>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|(_, value)| value.get(field) == Some(expected))
            .collect())
    }
}

impl<P: StorePort + ?Sized> EnumerableExt for P {}

/// Per-key metadata access.
pub trait MetadataExt: StorePort {
    /// Accessor for an existing key's metadata. Fails with a
    /// nonexistent-key error if the key is absent.
    fn metadata(&mut self, key: &str) -> LarderResult<MetadataHandle<'_, Self>> {
        if !self.contains(key)? {
            return Err(LarderError::nonexistent(key));
        }
        Ok(MetadataHandle {
            port: self,
            key: key.to_string(),
        })
    }
}

impl<P: StorePort + ?Sized> MetadataExt for P {}

/// Get/set view over one record's metadata.
pub struct MetadataHandle<'a, P: StorePort + ?Sized> {
    port: &'a mut P,
    key: String,
}

impl<P: StorePort + ?Sized> std::fmt::Debug for MetadataHandle<'_, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataHandle")
            .field("key", &self.key)
            .finish()
    }
}

impl<P: StorePort + ?Sized> MetadataHandle<'_, P> {
    /// The record's current metadata.
    pub fn get(&self) -> LarderResult<Option<Value>> {
        self.port.metadata_of(&self.key)
    }

    /// Replace the record's metadata, persisting it independently of the
    /// value.
    pub fn set(self, value: Value) -> LarderResult<WriteReceipt> {
        self.port.write_metadata(&self.key, value)
    }
}
