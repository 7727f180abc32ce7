//! In-memory key/value store with an optional byte quota.

use super::{KeyValueStore, StorageError, StorageResult};
use std::collections::BTreeMap;

/// `BTreeMap`-backed store, used by tests and ephemeral sessions.
///
/// The quota counts key and value bytes across all entries, like the
/// per-origin limit of browser local storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    items: BTreeMap<String, String>,
    quota_bytes: Option<usize>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that rejects writes once `quota_bytes` would be exceeded.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            items: BTreeMap::new(),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Sets or clears the quota. Existing entries are kept even when over.
    pub fn set_quota(&mut self, quota_bytes: Option<usize>) {
        self.quota_bytes = quota_bytes;
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.items
            .iter()
            .filter(|(existing, _)| existing.as_str() != key)
            .map(|(existing, value)| existing.len() + value.len())
            .sum()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> StorageResult<()> {
        if let Some(quota_bytes) = self.quota_bytes {
            let required_bytes = self.used_bytes_without(key) + key.len() + value.len();
            if required_bytes > quota_bytes {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    required_bytes,
                    quota_bytes,
                });
            }
        }

        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> StorageResult<()> {
        self.items.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryKeyValueStore;
    use crate::storage::{KeyValueStore, StorageError};

    #[test]
    fn set_item_overwrites_previous_value() {
        let mut store = MemoryKeyValueStore::new();
        store.set_item("k", "one").unwrap();
        store.set_item("k", "two").unwrap();

        assert_eq!(store.get_item("k").unwrap().as_deref(), Some("two"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn quota_counts_replacement_not_sum_of_writes() {
        let mut store = MemoryKeyValueStore::with_quota(8);
        store.set_item("k", "1234567").unwrap();
        store.set_item("k", "abcdefg").unwrap();

        let err = store.set_item("k", "12345678").unwrap_err();
        assert!(matches!(
            err,
            StorageError::QuotaExceeded {
                required_bytes: 9,
                quota_bytes: 8,
                ..
            }
        ));
        assert_eq!(store.get_item("k").unwrap().as_deref(), Some("abcdefg"));
    }

    #[test]
    fn missing_key_reads_as_none() {
        let mut store = MemoryKeyValueStore::new();
        assert_eq!(store.get_item("absent").unwrap(), None);
        store.remove_item("absent").unwrap();
        assert!(store.is_empty());
    }
}
