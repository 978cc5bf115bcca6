//! The cache engine.
//!
//! [`Store`] owns the in-memory map for one namespace and mirrors every
//! mutation to its storage provider through the background writer. Reads
//! are served from memory only; the provider is consulted exclusively by
//! `load` and `clear`.
//!
//! # Initialization
//!
//! A store starts `Uninitialized`: every key-accessing operation fails
//! until `load` or `clear` has run. Both flip the state as their first
//! effect, before any provider I/O.
//!
//! # Ownership
//!
//! The store assumes a single logical owner: mutating operations take
//! `&mut self` and there is no internal locking. Values must be plain JSON
//! data; they are cloned on the way in and out, so callers can never alias
//! the store's own records.

use larder_core::{diff, LarderError, LarderResult, StoreOptions, WriteAction};
use larder_events::{EventName, Publication, Publisher, StoreEvent, SubscriptionId};
use larder_storage::StorageProvider;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::keyspace::Keyspace;
use crate::writer::{WriteReceipt, WriteStep, Writer};

/// Serializer name assumed for pre-descriptor data found at load time.
const JSON_SERIALIZER: &str = "JSONSerializer";

/// Field holding the serializer name inside the namespace descriptor.
const DESCRIPTOR_FIELD: &str = "itemSerializer";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoreState {
    Uninitialized,
    Initialized,
}

/// One cached record: the value plus its independent metadata.
struct Record {
    value: Value,
    metadata: Option<Value>,
}

/// Outcome of a `set`-family call.
#[derive(Debug)]
pub struct SetResult {
    /// `Added`, `Modified`, or `Unchanged`.
    pub action: WriteAction,
    pub key: String,
    /// The value now stored (the merge result for object patches).
    pub value: Value,
    /// Prior values at the changed paths; present only for `Modified`.
    pub previous: Option<Value>,
    /// Metadata written by this call, if any was supplied.
    pub metadata: Option<Value>,
    /// Settles when this call's provider writes have been applied.
    pub receipt: WriteReceipt,
}

/// Outcome of a `remove`/`delete` call.
#[derive(Debug)]
pub struct RemoveResult {
    pub key: String,
    /// The removed value.
    pub value: Value,
    /// Settles when this call's provider deletions have been applied.
    pub receipt: WriteReceipt,
}

/// Result of one upsert through the in-memory map.
struct Upsert {
    action: WriteAction,
    value: Value,
    previous: Option<Value>,
}

/// Namespaced in-memory object cache mirrored to a storage provider.
///
/// Construct with [`Store::new`] (requires a tokio runtime: a background
/// writer task is spawned to apply provider writes in call order), then
/// call [`Store::load`] once to populate the cache, or [`Store::clear`] to
/// start from nothing. The map-like surface lives on the capability
/// extension traits [`MapExt`], [`EnumerableExt`], and [`MetadataExt`].
///
/// [`MapExt`]: crate::ext::MapExt
/// [`EnumerableExt`]: crate::ext::EnumerableExt
/// [`MetadataExt`]: crate::ext::MetadataExt
pub struct Store {
    keyspace: Keyspace,
    provider: Arc<dyn StorageProvider>,
    writer: Writer,
    publisher: Publisher,
    state: StoreState,
    cache: HashMap<String, Record>,
    /// Insertion-ordered key list; the in-memory image of the persisted
    /// index.
    index: Vec<String>,
    options: StoreOptions,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl Store {
    /// Build a store with default options.
    ///
    /// Fails with an invalid-namespace error before any provider call if
    /// the namespace contains the reserved separator.
    pub fn new(
        namespace: impl Into<String>,
        provider: Arc<dyn StorageProvider>,
    ) -> LarderResult<Self> {
        Self::with_options(namespace, provider, StoreOptions::default())
    }

    /// Build a store with explicit options.
    pub fn with_options(
        namespace: impl Into<String>,
        provider: Arc<dyn StorageProvider>,
        options: StoreOptions,
    ) -> LarderResult<Self> {
        let keyspace = Keyspace::new(namespace)?;
        let writer = Writer::spawn(provider.clone());
        let mut publisher = Publisher::new();
        publisher.set_publication(publication_for(&options));
        Ok(Self {
            keyspace,
            provider,
            writer,
            publisher,
            state: StoreState::Uninitialized,
            cache: HashMap::new(),
            index: Vec::new(),
            options,
        })
    }

    pub fn namespace(&self) -> &str {
        self.keyspace.namespace()
    }

    pub fn is_initialized(&self) -> bool {
        self.state == StoreState::Initialized
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Replace the options wholesale and apply the publication mode.
    pub fn reconfigure(&mut self, options: StoreOptions) {
        self.publisher.set_publication(publication_for(&options));
        self.options = options;
    }

    /// Subscribe to an event.
    pub fn on(
        &mut self,
        event: EventName,
        callback: impl Fn(&StoreEvent) + Send + Sync + 'static,
    ) -> LarderResult<SubscriptionId> {
        self.publisher.on(event, callback)
    }

    /// Subscribe to the next occurrence of an event only.
    pub fn once(
        &mut self,
        event: EventName,
        callback: impl Fn(&StoreEvent) + Send + Sync + 'static,
    ) -> LarderResult<SubscriptionId> {
        self.publisher.once(event, callback)
    }

    /// Remove a subscription. Returns whether it was present.
    pub fn off(&mut self, id: SubscriptionId) -> bool {
        self.publisher.off(id)
    }

    /// Register a custom event name for use with `on`/`once` and the
    /// capability port's emit.
    pub fn add_event(&mut self, name: &str) {
        self.publisher.add_event(name);
    }

    /// Populate the cache from the storage provider.
    ///
    /// Flips the store to initialized as its first effect, then reads the
    /// persisted index, resolves the serializer descriptor, and inserts
    /// every indexed item through the same upsert path as `set`, one
    /// `added` event per key. Indexed keys whose item is missing from the
    /// provider are logged and skipped. Finishes with an unconditional
    /// `ready` event.
    ///
    /// Called once per instance in normal use. Duplicate calls re-run the
    /// read loop (upserting over the existing cache) but do not
    /// re-transition.
    pub async fn load(&mut self) -> LarderResult<()> {
        self.initialize();
        let indexed = self.read_index().await?;
        self.resolve_item_serializer(!indexed.is_empty()).await?;
        for key in indexed {
            let item = self.provider.get_item(&self.keyspace.item_key(&key)).await?;
            match item {
                Some(value) => {
                    self.upsert(&key, value)?;
                }
                None => {
                    let missing = LarderError::UndefinedValue;
                    tracing::warn!(key = %key, error = %missing, "indexed item missing from provider, skipping");
                }
            }
        }
        self.publisher.publish_always(&StoreEvent::Ready)?;
        Ok(())
    }

    /// Remove everything belonging to this namespace, loaded or not.
    ///
    /// Flips the store to initialized first if needed. Every key reachable
    /// from the persisted index (plus any cached key the index does not
    /// know yet) gets its item and metadata deleted from the provider;
    /// cached records are evicted in reverse-insertion order (emitting
    /// per-key `removed` events when `publish_remove_on_clear` is set);
    /// finally the persisted index and the serializer descriptor are
    /// deleted. Emits `cleared` (always), and `ready` if this call
    /// performed the initialization transition.
    pub async fn clear(&mut self) -> LarderResult<WriteReceipt> {
        let transitioned = self.initialize();

        let mut targets = self.read_index().await?;
        for key in &self.index {
            if !targets.contains(key) {
                targets.push(key.clone());
            }
        }

        let mut steps = Vec::with_capacity(targets.len() * 2 + 2);
        for key in &targets {
            steps.push(WriteStep::RemoveItem(self.keyspace.item_key(key)));
            steps.push(WriteStep::RemoveMetadata(self.keyspace.metadata_key(key)));
        }

        let publish_removed = self.options.publish_remove_on_clear;
        let evicting: Vec<String> = self.index.iter().rev().cloned().collect();
        self.index.clear();
        for key in evicting {
            if let Some(record) = self.cache.remove(&key) {
                if publish_removed {
                    self.publisher.publish(&StoreEvent::Removed {
                        key,
                        value: record.value,
                    })?;
                }
            }
        }

        steps.push(WriteStep::RemoveMetadata(self.keyspace.index_key()));
        steps.push(WriteStep::RemoveMetadata(
            self.keyspace.descriptor_key().to_string(),
        ));
        let receipt = self.writer.enqueue(steps);

        self.publisher.publish_always(&StoreEvent::Cleared)?;
        if transitioned {
            self.publisher.publish_always(&StoreEvent::Ready)?;
        }
        Ok(receipt)
    }

    // ------------------------------------------------------------------
    // Internal primitives. The capability port (crate::ext) exposes these
    // to the extension traits; nothing else touches the cache map.
    // ------------------------------------------------------------------

    pub(crate) fn ensure_initialized(&self) -> LarderResult<()> {
        match self.state {
            StoreState::Initialized => Ok(()),
            StoreState::Uninitialized => Err(LarderError::UninitializedAccess),
        }
    }

    pub(crate) fn contains_key(&self, key: &str) -> LarderResult<bool> {
        self.ensure_initialized()?;
        Ok(self.cache.contains_key(key))
    }

    pub(crate) fn value_copy(&self, key: &str) -> LarderResult<Option<Value>> {
        self.ensure_initialized()?;
        Ok(self.cache.get(key).map(|record| record.value.clone()))
    }

    pub(crate) fn metadata_copy(&self, key: &str) -> LarderResult<Option<Value>> {
        self.ensure_initialized()?;
        let record = self
            .cache
            .get(key)
            .ok_or_else(|| LarderError::nonexistent(key))?;
        Ok(record.metadata.clone())
    }

    pub(crate) fn key_snapshot(&self) -> LarderResult<Vec<String>> {
        self.ensure_initialized()?;
        Ok(self.index.clone())
    }

    pub(crate) fn entry_copies(&self) -> LarderResult<Vec<(String, Value)>> {
        self.ensure_initialized()?;
        Ok(self
            .index
            .iter()
            .filter_map(|key| {
                self.cache
                    .get(key)
                    .map(|record| (key.clone(), record.value.clone()))
            })
            .collect())
    }

    /// Full `set` semantics: upsert, then enqueue the persistence batch
    /// (serializer descriptor → index → item → metadata, in that order).
    pub(crate) fn write_value(
        &mut self,
        key: &str,
        value: Value,
        metadata: Option<Value>,
    ) -> LarderResult<SetResult> {
        self.ensure_initialized()?;
        let outcome = self.upsert(key, value)?;

        let mut steps = Vec::new();
        if outcome.action == WriteAction::Added {
            if self.index.len() == 1 {
                // First key this namespace has ever held: record which
                // serializer convention its items are written with.
                steps.push(WriteStep::SetMetadata(
                    self.keyspace.descriptor_key().to_string(),
                    json!({ DESCRIPTOR_FIELD: self.provider.item_serializer() }),
                ));
            }
            steps.push(self.index_step());
        }
        if outcome.action.is_mutation() {
            steps.push(WriteStep::SetItem(
                self.keyspace.item_key(key),
                outcome.value.clone(),
            ));
        }

        let metadata_written = if let Some(meta) = metadata {
            if let Some(record) = self.cache.get_mut(key) {
                record.metadata = Some(meta.clone());
            }
            steps.push(WriteStep::SetMetadata(
                self.keyspace.metadata_key(key),
                meta.clone(),
            ));
            Some(meta)
        } else {
            None
        };

        Ok(SetResult {
            action: outcome.action,
            key: key.to_string(),
            value: outcome.value,
            previous: outcome.previous,
            metadata: metadata_written,
            receipt: self.writer.enqueue(steps),
        })
    }

    /// Full `remove` semantics: evict first, then enqueue the deletions
    /// and the index re-persist, then emit `removed`.
    pub(crate) fn remove_value(&mut self, key: &str) -> LarderResult<RemoveResult> {
        self.ensure_initialized()?;
        let record = self
            .cache
            .remove(key)
            .ok_or_else(|| LarderError::nonexistent(key))?;
        self.index.retain(|k| k != key);

        let receipt = self.writer.enqueue(vec![
            WriteStep::RemoveItem(self.keyspace.item_key(key)),
            WriteStep::RemoveMetadata(self.keyspace.metadata_key(key)),
            self.index_step(),
        ]);

        self.publisher.publish(&StoreEvent::Removed {
            key: key.to_string(),
            value: record.value.clone(),
        })?;

        Ok(RemoveResult {
            key: key.to_string(),
            value: record.value,
            receipt,
        })
    }

    /// Set a record's metadata independent of its value.
    pub(crate) fn set_record_metadata(
        &mut self,
        key: &str,
        value: Value,
    ) -> LarderResult<WriteReceipt> {
        self.ensure_initialized()?;
        let record = self
            .cache
            .get_mut(key)
            .ok_or_else(|| LarderError::nonexistent(key))?;
        record.metadata = Some(value.clone());
        Ok(self.writer.enqueue(vec![WriteStep::SetMetadata(
            self.keyspace.metadata_key(key),
            value,
        )]))
    }

    /// Derive a key from an object value via the configured primary-key
    /// field.
    pub(crate) fn key_from_value(&self, value: &Value) -> LarderResult<String> {
        self.ensure_initialized()?;
        let field = self
            .options
            .primary_key
            .as_ref()
            .ok_or_else(|| LarderError::invalid_key("no primary-key field configured"))?;
        match value.get(field) {
            Some(Value::String(key)) => Ok(key.clone()),
            Some(_) => Err(LarderError::invalid_key(format!(
                "field {field:?} is not a string"
            ))),
            None => Err(LarderError::invalid_key(format!(
                "field {field:?} is missing"
            ))),
        }
    }

    pub(crate) fn publish_event(&mut self, event: &StoreEvent) -> LarderResult<()> {
        self.publisher.publish(event)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Flip to initialized; returns whether this call did the transition.
    fn initialize(&mut self) -> bool {
        if self.state == StoreState::Uninitialized {
            self.state = StoreState::Initialized;
            true
        } else {
            false
        }
    }

    /// Insert or patch a record in the map and publish the change.
    ///
    /// This is the single path through which records enter the cache;
    /// `set` and `load` both go through it, so load replays yield the same
    /// `added` events a live `set` would.
    fn upsert(&mut self, key: &str, candidate: Value) -> LarderResult<Upsert> {
        let current = self.cache.get(key).map(|record| record.value.clone());
        let Some(current) = current else {
            self.cache.insert(
                key.to_string(),
                Record {
                    value: candidate.clone(),
                    metadata: None,
                },
            );
            self.index.push(key.to_string());
            self.publisher.publish(&StoreEvent::Added {
                key: key.to_string(),
                value: candidate.clone(),
            })?;
            return Ok(Upsert {
                action: WriteAction::Added,
                value: candidate,
                previous: None,
            });
        };

        let (merged, changed, previous) = match (current.as_object(), candidate.as_object()) {
            (Some(current_fields), Some(candidate_fields)) => {
                let merged = diff::patch(current_fields, candidate_fields);
                let changed = diff::whats_different(current_fields, &merged);
                let previous = diff::previously(current_fields, &changed);
                (
                    Value::Object(merged),
                    Value::Object(changed),
                    Value::Object(previous),
                )
            }
            // Scalars, arrays, and mixed shapes replace wholesale.
            _ => (candidate.clone(), candidate, current.clone()),
        };

        if merged == current {
            return Ok(Upsert {
                action: WriteAction::Unchanged,
                value: merged,
                previous: None,
            });
        }

        if let Some(record) = self.cache.get_mut(key) {
            record.value = merged.clone();
        }
        self.publisher.publish(&StoreEvent::Modified {
            key: key.to_string(),
            changed,
            previous: previous.clone(),
        })?;
        Ok(Upsert {
            action: WriteAction::Modified,
            value: merged,
            previous: Some(previous),
        })
    }

    /// The step that re-persists the current index.
    fn index_step(&self) -> WriteStep {
        let keys: Vec<Value> = self.index.iter().map(|key| json!(key)).collect();
        WriteStep::SetMetadata(self.keyspace.index_key(), Value::Array(keys))
    }

    /// Read the persisted index; absent or malformed indexes read as
    /// empty.
    async fn read_index(&self) -> LarderResult<Vec<String>> {
        let raw = self.provider.get_metadata(&self.keyspace.index_key()).await?;
        Ok(match raw {
            Some(Value::Array(keys)) => keys
                .into_iter()
                .filter_map(|key| key.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        })
    }

    /// Decide which serializer convention the namespace's data uses and
    /// record it on the provider.
    ///
    /// An existing descriptor always wins. Data without a descriptor
    /// predates descriptors and was written as plain JSON; an empty
    /// namespace has no convention yet.
    async fn resolve_item_serializer(&self, has_items: bool) -> LarderResult<()> {
        let descriptor = self
            .provider
            .get_metadata(self.keyspace.descriptor_key())
            .await?;
        let name = match descriptor {
            Some(value) => value
                .get(DESCRIPTOR_FIELD)
                .and_then(Value::as_str)
                .map(str::to_string),
            None => has_items.then(|| JSON_SERIALIZER.to_string()),
        };
        self.provider.set_item_serializer(name);
        Ok(())
    }
}

fn publication_for(options: &StoreOptions) -> Publication {
    if options.publish {
        Publication::Enabled
    } else {
        Publication::Suppressed
    }
}
