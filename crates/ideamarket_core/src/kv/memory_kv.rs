//! In-memory key-value store for tests and throwaway sessions.

use super::{KvResult, KvStore};
use std::collections::BTreeMap;

/// Key-value store that keeps every entry in process memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryKvStore {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes `key`, returning its previous bytes.
    pub fn remove(&mut self, key: &str) -> Option<Vec<u8>> {
        self.entries.remove(key)
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &[u8]) -> KvResult<()> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn put_all(&mut self, entries: &[(&str, &[u8])]) -> KvResult<()> {
        for (key, value) in entries {
            self.entries.insert((*key).to_string(), value.to_vec());
        }
        Ok(())
    }
}
