//! The storage provider contract.

use async_trait::async_trait;
use larder_core::LarderResult;
use serde_json::Value;

/// Key-value and key-metadata persistence backend the engine delegates to.
///
/// The engine never interprets provider keys; it derives them from its
/// namespace and hands them down fully formed. Items and metadata are two
/// separate channels: whatever is written with [`set_metadata`] is read
/// with [`get_metadata`] and deleted with [`remove_metadata`], never
/// through the item methods.
///
/// A synchronous backend (an in-process map, a blocking browser-storage
/// bridge) implements the trait by returning immediately; the engine's
/// consumer-facing behavior does not change between synchronous and
/// asynchronous providers.
///
/// The `item_serializer` descriptor is a provider-level marker the engine
/// reads and writes during `load` to detect which serialization convention
/// existing data was written with. Implementations hold it with interior
/// mutability; it is not persisted by the provider itself (the engine
/// persists it under the bare namespace key).
///
/// [`set_metadata`]: StorageProvider::set_metadata
/// [`get_metadata`]: StorageProvider::get_metadata
/// [`remove_metadata`]: StorageProvider::remove_metadata
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Read an item. Returns `None` if the key has never been written or
    /// was removed.
    async fn get_item(&self, key: &str) -> LarderResult<Option<Value>>;

    /// Write an item.
    async fn set_item(&self, key: &str, value: &Value) -> LarderResult<()>;

    /// Delete an item. Deleting an absent key is a no-op.
    async fn remove_item(&self, key: &str) -> LarderResult<()>;

    /// Read a metadata value.
    async fn get_metadata(&self, key: &str) -> LarderResult<Option<Value>>;

    /// Write a metadata value.
    async fn set_metadata(&self, key: &str, value: &Value) -> LarderResult<()>;

    /// Delete a metadata value. Deleting an absent key is a no-op.
    async fn remove_metadata(&self, key: &str) -> LarderResult<()>;

    /// The serialization convention this provider is operating under.
    fn item_serializer(&self) -> Option<String>;

    /// Record the serialization convention to operate under.
    fn set_item_serializer(&self, name: Option<String>);
}
