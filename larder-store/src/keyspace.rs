//! Namespaced storage-key derivation.
//!
//! All provider keys for one store instance are derived from its namespace,
//! so independent stores can share a backend without collision. Three key
//! shapes exist:
//!
//! - item:      `namespace:key`
//! - index:     `namespace#index:primary`
//! - metadata:  `namespace#metadata:key`
//!
//! The `#` separator is reserved: a namespace containing it is rejected at
//! construction, which guarantees a literal item key can never collide with
//! an index or metadata key (the first `#` in a derived key always sits
//! immediately after the namespace, and item keys have `:` there instead).

use larder_core::{LarderError, LarderResult, NS_SEPARATOR};

/// Name of the primary key index within the index channel.
const PRIMARY_INDEX: &str = "primary";

/// Validated namespace plus the key-derivation rules for it.
///
/// Construction is the only place the namespace is validated; once a
/// `Keyspace` exists, every key it derives is collision-free against the
/// other key shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyspace {
    namespace: String,
}

impl Keyspace {
    /// Validate the namespace and build the keyspace for it.
    ///
    /// Fails with an invalid-namespace error if the namespace contains the
    /// reserved separator. No storage-provider call is made.
    pub fn new(namespace: impl Into<String>) -> LarderResult<Self> {
        let namespace = namespace.into();
        if namespace.contains(NS_SEPARATOR) {
            return Err(LarderError::InvalidNamespace { namespace });
        }
        Ok(Self { namespace })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Key an item is persisted under: `namespace:key`.
    pub fn item_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    /// Key the primary index is persisted under: `namespace#index:primary`.
    pub fn index_key(&self) -> String {
        format!("{}{}index:{}", self.namespace, NS_SEPARATOR, PRIMARY_INDEX)
    }

    /// Key a record's metadata is persisted under: `namespace#metadata:key`.
    pub fn metadata_key(&self, key: &str) -> String {
        format!("{}{}metadata:{}", self.namespace, NS_SEPARATOR, key)
    }

    /// Key the serializer descriptor is persisted under: the bare namespace.
    pub fn descriptor_key(&self) -> &str {
        &self.namespace
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    /// Strategy for namespaces free of the reserved separator.
    fn namespace_strategy() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_:.-]{1,16}"
    }

    /// Keys are unrestricted: callers may use any string, separator
    /// included.
    fn key_strategy() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_:#.-]{0,16}"
    }

    proptest! {
        /// Item keys never collide with the index key or any metadata key.
        #[test]
        fn prop_key_shapes_never_collide(
            namespace in namespace_strategy(),
            key_a in key_strategy(),
            key_b in key_strategy(),
        ) {
            let keyspace = Keyspace::new(namespace).expect("namespace has no separator");
            prop_assert_ne!(keyspace.item_key(&key_a), keyspace.index_key());
            prop_assert_ne!(keyspace.item_key(&key_a), keyspace.metadata_key(&key_b));
            prop_assert_ne!(keyspace.index_key(), keyspace.metadata_key(&key_b));
            prop_assert_ne!(keyspace.item_key(&key_a), keyspace.descriptor_key().to_string());
        }

        /// Distinct keys derive distinct item and metadata keys.
        #[test]
        fn prop_distinct_keys_stay_distinct(
            namespace in namespace_strategy(),
            key_a in key_strategy(),
            key_b in key_strategy(),
        ) {
            prop_assume!(key_a != key_b);
            let keyspace = Keyspace::new(namespace).expect("namespace has no separator");
            prop_assert_ne!(keyspace.item_key(&key_a), keyspace.item_key(&key_b));
            prop_assert_ne!(keyspace.metadata_key(&key_a), keyspace.metadata_key(&key_b));
        }
    }
}
