//! In-memory reference provider.

use async_trait::async_trait;
use larder_core::LarderResult;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::provider::StorageProvider;

/// In-memory [`StorageProvider`] backed by two plain maps.
///
/// Completes every call immediately; used by the engine's tests and as the
/// smallest possible template for writing a real backend. Lock poisoning
/// is treated as unreachable (no panics occur while a lock is held).
#[derive(Debug, Default)]
pub struct MemoryProvider {
    items: RwLock<HashMap<String, Value>>,
    metadata: RwLock<HashMap<String, Value>>,
    item_serializer: RwLock<Option<String>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items (not metadata entries).
    pub fn item_count(&self) -> usize {
        self.items.read().expect("lock poisoned").len()
    }

    /// Snapshot of an item, bypassing the async contract. Test helper.
    pub fn item(&self, key: &str) -> Option<Value> {
        self.items.read().expect("lock poisoned").get(key).cloned()
    }

    /// Snapshot of a metadata value, bypassing the async contract. Test
    /// helper.
    pub fn metadata_value(&self, key: &str) -> Option<Value> {
        self.metadata
            .read()
            .expect("lock poisoned")
            .get(key)
            .cloned()
    }
}

#[async_trait]
impl StorageProvider for MemoryProvider {
    async fn get_item(&self, key: &str) -> LarderResult<Option<Value>> {
        Ok(self.items.read().expect("lock poisoned").get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &Value) -> LarderResult<()> {
        self.items
            .write()
            .expect("lock poisoned")
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> LarderResult<()> {
        self.items.write().expect("lock poisoned").remove(key);
        Ok(())
    }

    async fn get_metadata(&self, key: &str) -> LarderResult<Option<Value>> {
        Ok(self
            .metadata
            .read()
            .expect("lock poisoned")
            .get(key)
            .cloned())
    }

    async fn set_metadata(&self, key: &str, value: &Value) -> LarderResult<()> {
        self.metadata
            .write()
            .expect("lock poisoned")
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn remove_metadata(&self, key: &str) -> LarderResult<()> {
        self.metadata.write().expect("lock poisoned").remove(key);
        Ok(())
    }

    fn item_serializer(&self) -> Option<String> {
        self.item_serializer.read().expect("lock poisoned").clone()
    }

    fn set_item_serializer(&self, name: Option<String>) {
        *self.item_serializer.write().expect("lock poisoned") = name;
    }
}
