//! Per-run natural key → remote id map
//!
//! Entries are added on the first successful lookup or create and live until
//! the run ends. There is no eviction: the shop is assumed not to be edited
//! by anyone else while a pass runs.

use std::collections::HashMap;
use std::hash::Hash;

use crate::domain::entities::RemoteId;

#[derive(Debug)]
pub struct IdentityCache<K> {
    entries: HashMap<K, RemoteId>,
}

impl<K: Eq + Hash> IdentityCache<K> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, key: &K) -> Option<&RemoteId> {
        self.entries.get(key)
    }

    /// Record a resolved key. An existing entry is kept, so a key never maps
    /// to two ids within one run.
    pub fn insert(&mut self, key: K, id: RemoteId) -> &RemoteId {
        self.entries.entry(key).or_insert(id)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Eq + Hash> Default for IdentityCache<K> {
    fn default() -> Self {
        Self::new()
    }
}
