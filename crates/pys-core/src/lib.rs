//! Core engine for pys, a schema-free object persistence layer.
//!
//! Given an in-memory record, pys stores it in a backend and later loads,
//! lists, or deletes it. Records can be scoped under a chain of owning
//! ancestors ("book belonging to an author"), which makes their addresses
//! hierarchical.
//!
//! # Building Blocks
//!
//! - [`Identifier`] / [`TypeName`] -- validated address segments
//! - [`Persistent`] -- per-type registration: name, adapter, identity source
//! - [`Envelope`] -- a payload plus the identity the engine manages for it
//! - [`RecordCodec`] -- serialization adapters ([`Json`], [`Validated`], [`Custom`])
//! - [`AncestorRef`] -- a live ancestor record or an explicit `(type, id)` key
//! - [`Address`] -- the composed `type/id/.../type/id` location
//!
//! # Storage Backends
//!
//! All backends implement the [`Backend`] trait:
//!
//! - [`InMemoryStorage`] -- `HashMap`-based store for tests and embedding
//! - `pys-file` -- one file per address under a mirrored directory tree
//! - `pys-sqlite` -- one table per record type
//!
//! # Design Rules
//!
//! 1. An identity is never empty and, once resolved, is stable for the
//!    lifetime of its envelope.
//! 2. Re-saving the same (type, id, parent) overwrites in place.
//! 3. A missing record is `Ok(None)`, never an error.
//! 4. Backends never interpret payload bytes.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod address;
pub mod ancestor;
pub mod codec;
pub mod error;
pub mod memory;
pub mod record;
pub mod traits;
pub mod types;

// Re-export primary types at crate root for ergonomic imports.
pub use address::{Address, LIST_MARKER};
pub use ancestor::AncestorRef;
pub use codec::{Custom, CustomFormat, Json, RecordCodec, Validate, Validated};
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryStorage;
pub use record::{EncodePayload, Envelope, IdSource, Persistent};
pub use traits::Backend;
pub use types::{Identifier, TypeName};
