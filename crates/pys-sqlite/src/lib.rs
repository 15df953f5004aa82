//! SQLite backend for pys.
//!
//! One table per record type, named by its normalized lowercase type name.
//! A record is keyed by its id plus its immediate ancestor, so the same id
//! can exist once at root and once under each distinct parent. When a record
//! is saved under live ancestor records, those ancestors are upserted first,
//! each as its own statement.
//!
//! Unlike the file backend, deletes do not cascade: child rows keep naming
//! their removed parent.

mod schema;
mod storage;

pub use storage::SqliteStorage;
