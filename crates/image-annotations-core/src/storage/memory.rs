//! In-memory [`Storage`] implementation for testing and WASM targets.
//!
//! Uses a `HashMap` behind `std::sync::RwLock`. An optional byte quota makes
//! writes fail the way a full browser storage area does.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{bail, Result};
use async_trait::async_trait;

use super::Storage;

/// In-memory slot store.
pub struct InMemoryStorage {
    items: RwLock<HashMap<String, String>>,
    quota: Option<usize>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            quota: None,
        }
    }

    /// A store that rejects writes once keys plus values exceed `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            quota: Some(bytes),
        }
    }

    /// Pre-populate a slot, bypassing the quota.
    pub fn insert(&self, key: &str, value: &str) {
        self.items
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    /// Synchronous read for assertions.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.items.read().unwrap().get(key).cloned()
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.read().unwrap().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.items.write().unwrap();
        if let Some(quota) = self.quota {
            let others: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                bail!(
                    "storage quota exceeded: {} bytes needed, {} available",
                    needed,
                    quota
                );
            }
        }
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_replaces_value() {
        let store = InMemoryStorage::new();
        assert_eq!(store.get_item("k").await.unwrap(), None);
        store.set_item("k", "v1").await.unwrap();
        store.set_item("k", "v2").await.unwrap();
        assert_eq!(store.get_item("k").await.unwrap().as_deref(), Some("v2"));
        assert_eq!(store.peek("other"), None);
    }

    #[tokio::test]
    async fn test_quota_rejects_large_write() {
        let store = InMemoryStorage::with_quota(10);
        store.set_item("k", "small").await.unwrap();
        let err = store.set_item("k", "much too large").await.unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
        assert_eq!(store.peek("k").as_deref(), Some("small"));
    }
}
