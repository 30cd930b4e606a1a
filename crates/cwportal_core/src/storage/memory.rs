//! In-memory key-value backend.
//!
//! Mirrors browser storage limits: an optional byte quota counted over keys
//! and values, a fully disabled mode, and per-key write blocking for
//! exercising partial-failure paths.

use super::{KeyValueStorage, StorageError, StorageResult};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
    quota_bytes: Option<usize>,
    disabled: bool,
    blocked_keys: BTreeSet<String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects writes that would push total key+value bytes over `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::default()
        }
    }

    /// Every operation fails with `StorageError::Unavailable`.
    pub fn disabled() -> Self {
        Self {
            disabled: true,
            ..Self::default()
        }
    }

    /// Makes subsequent writes to `key` fail. Reads are unaffected.
    pub fn block_key(&mut self, key: impl Into<String>) {
        self.blocked_keys.insert(key.into());
    }

    pub fn unblock_key(&mut self, key: &str) {
        self.blocked_keys.remove(key);
    }

    /// Total bytes held, counted as key length plus value length.
    pub fn used_bytes(&self) -> usize {
        self.items
            .iter()
            .map(|(key, value)| key.len() + value.len())
            .sum()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn ensure_enabled(&self) -> StorageResult<()> {
        if self.disabled {
            return Err(StorageError::Unavailable(
                "memory storage is disabled".to_string(),
            ));
        }
        Ok(())
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        self.ensure_enabled()?;
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.ensure_enabled()?;
        if self.blocked_keys.contains(key) {
            return Err(StorageError::Unavailable(format!(
                "writes to `{key}` are blocked"
            )));
        }

        if let Some(quota) = self.quota_bytes {
            let replaced = self
                .items
                .get(key)
                .map_or(0, |existing| key.len() + existing.len());
            let required = self.used_bytes() - replaced + key.len() + value.len();
            if required > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    required,
                    quota,
                });
            }
        }

        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> StorageResult<()> {
        self.ensure_enabled()?;
        self.items.remove(key);
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        self.ensure_enabled()?;
        Ok(self.items.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryStorage;
    use crate::storage::{KeyValueStorage, StorageError};

    #[test]
    fn set_get_remove_roundtrip() {
        let mut storage = MemoryStorage::new();
        storage.set_item("a", "1").unwrap();
        storage.set_item("b", "2").unwrap();
        assert_eq!(storage.get_item("a").unwrap().as_deref(), Some("1"));
        assert_eq!(storage.keys().unwrap(), vec!["a", "b"]);

        storage.remove_item("a").unwrap();
        storage.remove_item("missing").unwrap();
        assert_eq!(storage.get_item("a").unwrap(), None);
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn quota_counts_replacement_not_accumulation() {
        let mut storage = MemoryStorage::with_quota(10);
        storage.set_item("k", "123456789").unwrap();
        storage.set_item("k", "987654321").unwrap();

        let err = storage.set_item("x", "1").unwrap_err();
        assert!(matches!(
            err,
            StorageError::QuotaExceeded { required: 12, quota: 10, .. }
        ));
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("987654321"));
    }

    #[test]
    fn disabled_storage_rejects_everything() {
        let mut storage = MemoryStorage::disabled();
        assert!(storage.get_item("a").is_err());
        assert!(storage.set_item("a", "1").is_err());
        assert!(storage.keys().is_err());
    }

    #[test]
    fn blocked_key_fails_writes_only() {
        let mut storage = MemoryStorage::new();
        storage.set_item("a", "1").unwrap();
        storage.block_key("a");
        assert!(matches!(
            storage.set_item("a", "2"),
            Err(StorageError::Unavailable(_))
        ));
        assert_eq!(storage.get_item("a").unwrap().as_deref(), Some("1"));

        storage.unblock_key("a");
        storage.set_item("a", "2").unwrap();
    }
}
