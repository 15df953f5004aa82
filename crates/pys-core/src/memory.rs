use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use crate::address::Address;
use crate::ancestor::AncestorRef;
use crate::error::StorageResult;
use crate::traits::Backend;
use crate::types::{Identifier, TypeName};

/// In-memory, HashMap-based backend.
///
/// Intended for tests and embedding. Entries are keyed by their full
/// [`Address`], so parent isolation and cascading deletes behave exactly as
/// in the file backend. Bytes are cloned on read and write.
pub struct InMemoryStorage {
    entries: RwLock<HashMap<Address, Vec<u8>>>,
}

impl InMemoryStorage {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of entries currently stored, across all addresses.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("lock poisoned").is_empty()
    }

    /// Total payload bytes across all entries.
    pub fn total_bytes(&self) -> u64 {
        self.entries
            .read()
            .expect("lock poisoned")
            .values()
            .map(|data| data.len() as u64)
            .sum()
    }

    /// Return a sorted list of every stored address.
    pub fn addresses(&self) -> Vec<Address> {
        let map = self.entries.read().expect("lock poisoned");
        let mut addresses: Vec<Address> = map.keys().cloned().collect();
        addresses.sort();
        addresses
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for InMemoryStorage {
    fn put(
        &self,
        type_name: &TypeName,
        id: &Identifier,
        data: &[u8],
        ancestors: &[AncestorRef<'_>],
    ) -> StorageResult<()> {
        let address = Address::compose(type_name, id, ancestors);
        debug!(%address, len = data.len(), "memory put");
        let mut map = self.entries.write().expect("lock poisoned");
        map.insert(address, data.to_vec());
        Ok(())
    }

    fn get(
        &self,
        type_name: &TypeName,
        id: &Identifier,
        ancestors: &[AncestorRef<'_>],
    ) -> StorageResult<Option<Vec<u8>>> {
        let address = Address::compose(type_name, id, ancestors);
        let map = self.entries.read().expect("lock poisoned");
        Ok(map.get(&address).cloned())
    }

    fn remove(
        &self,
        type_name: &TypeName,
        id: &Identifier,
        ancestors: &[AncestorRef<'_>],
    ) -> StorageResult<()> {
        let address = Address::compose(type_name, id, ancestors);
        let mut map = self.entries.write().expect("lock poisoned");
        let before = map.len();
        map.retain(|key, _| key != &address && !key.is_descendant_of(&address));
        debug!(%address, removed = before - map.len(), "memory remove");
        Ok(())
    }

    fn scan(
        &self,
        type_name: &TypeName,
        ancestors: &[AncestorRef<'_>],
    ) -> StorageResult<Vec<(Identifier, Vec<u8>)>> {
        let listing = Address::listing(type_name, ancestors);
        let map = self.entries.read().expect("lock poisoned");
        let mut found: Vec<(Identifier, Vec<u8>)> = map
            .iter()
            .filter(|(address, _)| address.is_sibling_of(&listing))
            .map(|(address, data)| (address.id().clone(), data.clone()))
            .collect();
        found.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(found)
    }

    fn destroy(self) -> StorageResult<()> {
        self.entries.write().expect("lock poisoned").clear();
        Ok(())
    }

    fn describe(&self) -> String {
        format!("memory(entries={})", self.len())
    }
}

impl std::fmt::Debug for InMemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryStorage")
            .field("entry_count", &count)
            .finish()
    }
}
