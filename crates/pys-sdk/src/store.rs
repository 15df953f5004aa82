use std::path::PathBuf;

use pys_core::{
    AncestorRef, Backend, Envelope, Identifier, InMemoryStorage, Persistent, StorageResult,
};
use pys_file::{FileConfig, FileStorage};
use pys_sqlite::SqliteStorage;
use tracing::debug;

use crate::backend::AnyBackend;
use crate::config::StoreConfig;
use crate::error::SdkResult;

/// Typed record store over a [`Backend`].
///
/// Every operation takes the ancestor chain the record lives under, outermost
/// first; pass `&[]` for top-level records.
pub struct Store<B> {
    backend: B,
}

impl<B: Backend> Store<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Save `record` under `ancestors` and return its identity.
    ///
    /// Saving the same record again, at the same place, overwrites it.
    pub fn save<T: Persistent>(
        &self,
        record: &mut Envelope<T>,
        ancestors: &[AncestorRef<'_>],
    ) -> StorageResult<Identifier> {
        let type_name = T::type_name()?;
        let id = record.resolve_id()?;
        let data = record.encode()?;
        self.backend.put(&type_name, &id, &data, ancestors)?;
        debug!(%type_name, %id, "saved");
        Ok(id)
    }

    /// Load the `T` stored at `id` under `ancestors`.
    pub fn load<T: Persistent>(
        &self,
        id: &Identifier,
        ancestors: &[AncestorRef<'_>],
    ) -> StorageResult<Option<Envelope<T>>> {
        let type_name = T::type_name()?;
        match self.backend.get(&type_name, id, ancestors)? {
            Some(data) => Ok(Some(Envelope::decode(&data, id.clone())?)),
            None => Ok(None),
        }
    }

    /// Delete the `T` stored at `id` under `ancestors`. Deleting a missing
    /// record succeeds.
    pub fn delete<T: Persistent>(
        &self,
        id: &Identifier,
        ancestors: &[AncestorRef<'_>],
    ) -> StorageResult<()> {
        let type_name = T::type_name()?;
        self.backend.remove(&type_name, id, ancestors)?;
        debug!(%type_name, %id, "deleted");
        Ok(())
    }

    /// Every `T` stored directly under `ancestors`.
    pub fn list<T: Persistent>(
        &self,
        ancestors: &[AncestorRef<'_>],
    ) -> StorageResult<Vec<Envelope<T>>> {
        let type_name = T::type_name()?;
        self.backend
            .scan(&type_name, ancestors)?
            .into_iter()
            .map(|(id, data)| Envelope::decode(&data, id))
            .collect()
    }

    /// Remove everything this store holds.
    pub fn destroy(self) -> StorageResult<()> {
        self.backend.destroy()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn describe(&self) -> String {
        self.backend.describe()
    }
}

impl Store<AnyBackend> {
    /// Open the store described by `config`.
    pub fn open(config: &StoreConfig) -> SdkResult<Self> {
        Ok(Self::new(AnyBackend::open(config)?))
    }
}

impl<B: Backend> std::fmt::Debug for Store<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("backend", &self.backend.describe())
            .finish()
    }
}

impl<B: Backend> std::fmt::Display for Store<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.backend.describe())
    }
}

/// File-tree store rooted at `base_path`, blocking on contended locks.
pub fn file_store(base_path: impl Into<PathBuf>) -> Store<FileStorage> {
    Store::new(FileStorage::open(base_path, FileConfig::default()))
}

/// SQLite store in the database at `path`.
pub fn sqlite_store(path: impl Into<PathBuf>) -> StorageResult<Store<SqliteStorage>> {
    Ok(Store::new(SqliteStorage::open(path.into())?))
}

/// Store that lives only as long as the returned value.
pub fn memory_store() -> Store<InMemoryStorage> {
    Store::new(InMemoryStorage::new())
}

/// The default store: SQLite at `path`.
pub fn store(path: impl Into<PathBuf>) -> StorageResult<Store<SqliteStorage>> {
    sqlite_store(path)
}
