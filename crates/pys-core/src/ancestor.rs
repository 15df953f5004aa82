use std::fmt;

use crate::error::StorageResult;
use crate::record::{EncodePayload, Envelope, Persistent};
use crate::types::{Identifier, TypeName};

/// One link of an ancestor chain: the record (or key) a stored record
/// belongs to.
///
/// Chains are ordered outermost first. Each ancestor contributes exactly its
/// own `(type, id)` segment; callers pass the full chain on every call.
#[derive(Clone)]
pub enum AncestorRef<'a> {
    /// A live record. Its resolved identity is used, and backends that keep
    /// ancestors as rows may persist its payload too.
    ByRecord {
        type_name: TypeName,
        id: Identifier,
        record: &'a dyn EncodePayload,
    },
    /// An explicit `(type, id)` key.
    ByKey { type_name: TypeName, id: Identifier },
}

impl<'a> AncestorRef<'a> {
    /// Reference a live record, resolving (and caching) its identity.
    pub fn record<T: Persistent>(record: &'a mut Envelope<T>) -> StorageResult<Self> {
        let type_name = T::type_name()?;
        let id = record.resolve_id()?;
        let record: &'a Envelope<T> = record;
        Ok(Self::ByRecord {
            type_name,
            id,
            record,
        })
    }

    /// Reference a record of type `T` by id.
    pub fn key<T: Persistent>(id: Identifier) -> StorageResult<Self> {
        Ok(Self::ByKey {
            type_name: T::type_name()?,
            id,
        })
    }

    /// Reference a record by explicit type name and id.
    pub fn named(type_name: TypeName, id: Identifier) -> Self {
        Self::ByKey { type_name, id }
    }

    pub fn type_name(&self) -> &TypeName {
        match self {
            Self::ByRecord { type_name, .. } | Self::ByKey { type_name, .. } => type_name,
        }
    }

    pub fn id(&self) -> &Identifier {
        match self {
            Self::ByRecord { id, .. } | Self::ByKey { id, .. } => id,
        }
    }

    /// The live record, if this ancestor was given as one.
    pub fn record_payload(&self) -> Option<&'a dyn EncodePayload> {
        match self {
            Self::ByRecord { record, .. } => Some(*record),
            Self::ByKey { .. } => None,
        }
    }
}

impl fmt::Debug for AncestorRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::ByRecord { .. } => "ByRecord",
            Self::ByKey { .. } => "ByKey",
        };
        f.debug_struct(kind)
            .field("type_name", self.type_name())
            .field("id", self.id())
            .finish()
    }
}
