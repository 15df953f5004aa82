use crate::ancestor::AncestorRef;
use crate::error::StorageResult;
use crate::types::{Identifier, TypeName};

/// A storage backend for encoded records.
///
/// All implementations must satisfy these invariants:
/// - For a given (type, parent) ids are unique: `put` on an existing entry
///   replaces its bytes in place.
/// - `get` of a missing entry is `Ok(None)`, never an error.
/// - `remove` of a missing entry succeeds.
/// - `scan` yields each stored id under (type, parent) exactly once.
/// - The backend never interprets the bytes it stores.
/// - All I/O errors are propagated, never silently ignored.
///
/// Which part of the ancestor chain forms the parent is backend-specific:
/// the file and in-memory backends use the full chain, the SQLite backend
/// only the immediate ancestor.
pub trait Backend: Send + Sync {
    /// Store `data` at (type, id) under `ancestors`, replacing any previous
    /// entry.
    fn put(
        &self,
        type_name: &TypeName,
        id: &Identifier,
        data: &[u8],
        ancestors: &[AncestorRef<'_>],
    ) -> StorageResult<()>;

    /// Read the bytes stored at (type, id) under `ancestors`.
    fn get(
        &self,
        type_name: &TypeName,
        id: &Identifier,
        ancestors: &[AncestorRef<'_>],
    ) -> StorageResult<Option<Vec<u8>>>;

    /// Remove the entry at (type, id) under `ancestors`, if present.
    fn remove(
        &self,
        type_name: &TypeName,
        id: &Identifier,
        ancestors: &[AncestorRef<'_>],
    ) -> StorageResult<()>;

    /// Every `(id, bytes)` of `type_name` stored directly under `ancestors`.
    fn scan(
        &self,
        type_name: &TypeName,
        ancestors: &[AncestorRef<'_>],
    ) -> StorageResult<Vec<(Identifier, Vec<u8>)>>;

    /// Remove all stored data. Consumes the backend.
    fn destroy(self) -> StorageResult<()>
    where
        Self: Sized;

    /// Short human-readable description, e.g. `file(base_path=/tmp/x)`.
    fn describe(&self) -> String;
}
