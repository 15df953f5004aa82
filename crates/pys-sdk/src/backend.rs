use pys_core::{AncestorRef, Backend, Identifier, InMemoryStorage, StorageResult, TypeName};
use pys_file::FileStorage;
use pys_sqlite::SqliteStorage;
use tracing::info;

use crate::config::{BackendKind, StoreConfig};

/// Any built-in backend, chosen at runtime.
#[derive(Debug)]
pub enum AnyBackend {
    File(FileStorage),
    Sqlite(SqliteStorage),
    Memory(InMemoryStorage),
}

impl AnyBackend {
    /// Open the backend described by `config`.
    pub fn open(config: &StoreConfig) -> StorageResult<Self> {
        let backend = match config.backend {
            BackendKind::File => Self::File(FileStorage::open(&config.path, config.file_config())),
            BackendKind::Sqlite => Self::Sqlite(SqliteStorage::open(&config.path)?),
            BackendKind::Memory => Self::Memory(InMemoryStorage::new()),
        };
        info!(backend = %backend.describe(), "store opened");
        Ok(backend)
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Self::File(_) => BackendKind::File,
            Self::Sqlite(_) => BackendKind::Sqlite,
            Self::Memory(_) => BackendKind::Memory,
        }
    }
}

impl From<FileStorage> for AnyBackend {
    fn from(b: FileStorage) -> Self {
        Self::File(b)
    }
}

impl From<SqliteStorage> for AnyBackend {
    fn from(b: SqliteStorage) -> Self {
        Self::Sqlite(b)
    }
}

impl From<InMemoryStorage> for AnyBackend {
    fn from(b: InMemoryStorage) -> Self {
        Self::Memory(b)
    }
}

macro_rules! dispatch {
    ($self:expr, $b:ident => $body:expr) => {
        match $self {
            AnyBackend::File($b) => $body,
            AnyBackend::Sqlite($b) => $body,
            AnyBackend::Memory($b) => $body,
        }
    };
}

impl Backend for AnyBackend {
    fn put(
        &self,
        type_name: &TypeName,
        id: &Identifier,
        data: &[u8],
        ancestors: &[AncestorRef<'_>],
    ) -> StorageResult<()> {
        dispatch!(self, b => b.put(type_name, id, data, ancestors))
    }

    fn get(
        &self,
        type_name: &TypeName,
        id: &Identifier,
        ancestors: &[AncestorRef<'_>],
    ) -> StorageResult<Option<Vec<u8>>> {
        dispatch!(self, b => b.get(type_name, id, ancestors))
    }

    fn remove(
        &self,
        type_name: &TypeName,
        id: &Identifier,
        ancestors: &[AncestorRef<'_>],
    ) -> StorageResult<()> {
        dispatch!(self, b => b.remove(type_name, id, ancestors))
    }

    fn scan(
        &self,
        type_name: &TypeName,
        ancestors: &[AncestorRef<'_>],
    ) -> StorageResult<Vec<(Identifier, Vec<u8>)>> {
        dispatch!(self, b => b.scan(type_name, ancestors))
    }

    fn destroy(self) -> StorageResult<()> {
        dispatch!(self, b => b.destroy())
    }

    fn describe(&self) -> String {
        dispatch!(self, b => b.describe())
    }
}
