//! High-level API for pys.
//!
//! ```no_run
//! use pys_sdk::{Envelope, Json, Persistent, AncestorRef};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Author { name: String }
//! impl Persistent for Author {
//!     const TYPE_NAME: &'static str = "Author";
//!     type Codec = Json;
//! }
//!
//! #[derive(Serialize, Deserialize)]
//! struct Book { title: String }
//! impl Persistent for Book {
//!     const TYPE_NAME: &'static str = "Book";
//!     type Codec = Json;
//! }
//!
//! # fn main() -> Result<(), pys_sdk::StorageError> {
//! let store = pys_sdk::store("library.db")?;
//! let mut author = Envelope::new(Author { name: "Leo Tolstoy".into() });
//! let mut book = Envelope::new(Book { title: "War and Peace".into() });
//! let book_id = store.save(&mut book, &[AncestorRef::record(&mut author)?])?;
//! let again = store.load::<Book>(&book_id, &[AncestorRef::record(&mut author)?])?;
//! assert!(again.is_some());
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod store;

pub use backend::AnyBackend;
pub use config::{BackendKind, StoreConfig};
pub use error::{SdkError, SdkResult};
pub use store::{file_store, memory_store, sqlite_store, store, Store};

// Re-export key types
pub use pys_core::{
    Address, AncestorRef, Backend, Custom, CustomFormat, Envelope, IdSource, Identifier,
    InMemoryStorage, Json, Persistent, RecordCodec, StorageError, StorageResult, TypeName,
    Validate, Validated,
};
pub use pys_file::{FileConfig, FileStorage};
pub use pys_sqlite::SqliteStorage;
