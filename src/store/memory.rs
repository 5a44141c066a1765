//! Process-local key store.

use std::collections::HashMap;
use std::sync::RwLock;

use super::{SecureStore, StoredKeyMaterial, WriteMode};
use crate::error::{error_codes, KeyPairError, KeyPairResult};

/// In-memory store, mainly for tests and ephemeral identities
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, StoredKeyMaterial>>,
    write_mode: WriteMode,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_write_mode(write_mode: WriteMode) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            write_mode,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SecureStore for MemoryStore {
    fn put(&self, identifier: &str, material: &StoredKeyMaterial) -> KeyPairResult<()> {
        let mut entries = self.entries.write().map_err(|_| {
            KeyPairError::store_write_error(identifier, "store lock poisoned", error_codes::STORE_WRITE_FAILED)
        })?;

        let existing = entries.get(identifier).map(|entry| entry.created_at);
        if self.write_mode == WriteMode::CreateNew && existing.is_some() {
            return Err(KeyPairError::store_write_error(
                identifier,
                "an entry with this identifier already exists",
                error_codes::STORE_DUPLICATE_ENTRY,
            ));
        }

        let mut material = material.clone();
        if let Some(created_at) = existing {
            material.created_at = created_at;
        }
        entries.insert(identifier.to_string(), material);
        Ok(())
    }

    fn get(&self, identifier: &str) -> KeyPairResult<Option<StoredKeyMaterial>> {
        let entries = self.entries.read().map_err(|_| {
            KeyPairError::store_access_error(identifier, "store lock poisoned", error_codes::STORE_READ_FAILED)
        })?;
        Ok(entries.get(identifier).cloned())
    }

    fn exists(&self, identifier: &str) -> bool {
        match self.entries.read() {
            Ok(entries) => entries.contains_key(identifier),
            Err(_) => {
                log::warn!("Memory store lock poisoned while checking '{}'", identifier);
                false
            }
        }
    }

    fn delete(&self, identifier: &str) -> KeyPairResult<()> {
        let mut entries = self.entries.write().map_err(|_| {
            KeyPairError::store_write_error(identifier, "store lock poisoned", error_codes::STORE_WRITE_FAILED)
        })?;
        entries.remove(identifier);
        Ok(())
    }

    fn list(&self) -> KeyPairResult<Vec<String>> {
        let entries = self.entries.read().map_err(|_| {
            KeyPairError::store_access_error("*", "store lock poisoned", error_codes::STORE_READ_FAILED)
        })?;
        let mut identifiers: Vec<String> = entries.keys().cloned().collect();
        identifiers.sort();
        Ok(identifiers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material(tag: u8) -> StoredKeyMaterial {
        StoredKeyMaterial::new(&[tag; 4], &[tag; 8], 1024)
    }

    #[test]
    fn test_put_get_delete() {
        let store = MemoryStore::new();
        store.put("alice", &material(1)).unwrap();

        assert!(store.exists("alice"));
        let loaded = store.get("alice").unwrap().unwrap();
        assert_eq!(loaded.public_key, vec![1; 4]);
        assert_eq!(*loaded.private_key, vec![1; 8]);

        store.delete("alice").unwrap();
        assert!(!store.exists("alice"));
        assert!(store.get("alice").unwrap().is_none());

        // Deleting again is fine
        store.delete("alice").unwrap();
    }

    #[test]
    fn test_replace_mode_overwrites() {
        let store = MemoryStore::new();
        store.put("alice", &material(1)).unwrap();
        store.put("alice", &material(2)).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("alice").unwrap().unwrap().public_key, vec![2; 4]);
    }

    #[test]
    fn test_replace_keeps_creation_time() {
        let store = MemoryStore::new();
        let first = material(1);
        store.put("alice", &first).unwrap();

        let mut second = material(2);
        second.created_at = first.created_at + chrono::Duration::hours(1);
        store.put("alice", &second).unwrap();

        assert_eq!(store.get("alice").unwrap().unwrap().created_at, first.created_at);
    }

    #[test]
    fn test_create_new_mode_rejects_duplicate() {
        let store = MemoryStore::with_write_mode(WriteMode::CreateNew);
        store.put("alice", &material(1)).unwrap();

        let err = store.put("alice", &material(2)).unwrap_err();
        assert_eq!(err.error_code(), error_codes::STORE_DUPLICATE_ENTRY);
        assert_eq!(store.get("alice").unwrap().unwrap().public_key, vec![1; 4]);
    }

    #[test]
    fn test_list_is_sorted() {
        let store = MemoryStore::new();
        store.put("carol", &material(3)).unwrap();
        store.put("alice", &material(1)).unwrap();
        store.put("bob", &material(2)).unwrap();

        assert_eq!(store.list().unwrap(), vec!["alice", "bob", "carol"]);
    }
}
