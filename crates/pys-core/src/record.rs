//! Records, identity resolution, and the engine-managed envelope.
//!
//! A record type opts into persistence by implementing [`Persistent`]. The
//! implementation is the registration point: it names the type, binds a
//! serialization adapter, and says where the record's identity comes from.
//!
//! Identity resolution (see [`Envelope::resolve_id`]) is the only place the
//! engine mutates application data.

use std::ops::{Deref, DerefMut};

use crate::codec::RecordCodec;
use crate::error::StorageResult;
use crate::types::{Identifier, TypeName};

/// Where a record's identity comes from.
#[derive(Debug)]
pub enum IdSource<'a> {
    /// The record computes its own identity. Always used as-is.
    Custom(String),
    /// A designated identity field. Filled with a generated id when empty.
    Field(&'a mut String),
    /// No identity field: the engine assigns one and keeps it in the
    /// [`Envelope`].
    Assigned,
}

/// A record type the engine can store.
pub trait Persistent: Sized {
    /// Type name used in addresses and table names.
    const TYPE_NAME: &'static str;

    /// Serialization adapter bound to this type.
    type Codec: RecordCodec<Self>;

    /// Where this record's identity comes from. Defaults to
    /// [`IdSource::Assigned`].
    fn id_source(&mut self) -> IdSource<'_> {
        IdSource::Assigned
    }

    /// Generate a fresh identity. Defaults to a random UUID v4.
    fn generate_id() -> Identifier {
        Identifier::random()
    }

    /// The validated type name.
    fn type_name() -> StorageResult<TypeName> {
        TypeName::from_static(Self::TYPE_NAME)
    }
}

/// A record payload together with the identity the engine assigned to it.
///
/// For types with [`IdSource::Assigned`] the envelope is the only holder of
/// the identity: it is never part of the payload, so it is never encoded.
/// Loading a record fills the envelope with the id it was stored under,
/// which keeps a round-tripped record at the same address.
///
/// Equality compares payloads only.
#[derive(Clone, Debug)]
pub struct Envelope<T> {
    assigned_id: Option<Identifier>,
    payload: T,
}

impl<T> Envelope<T> {
    /// Wrap a new payload with no identity assigned yet.
    pub fn new(payload: T) -> Self {
        Self {
            assigned_id: None,
            payload,
        }
    }

    /// Wrap a payload that is known to live at `id`.
    pub fn with_id(id: Identifier, payload: T) -> Self {
        Self {
            assigned_id: Some(id),
            payload,
        }
    }

    /// The identity last assigned or restored, if any.
    pub fn id(&self) -> Option<&Identifier> {
        self.assigned_id.as_ref()
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut T {
        &mut self.payload
    }

    pub fn into_payload(self) -> T {
        self.payload
    }
}

impl<T: Persistent> Envelope<T> {
    /// Resolve the record's identity.
    ///
    /// - [`IdSource::Custom`] is returned unconditionally.
    /// - [`IdSource::Field`] is returned when non-empty; otherwise a new id
    ///   is generated and written back into the field.
    /// - [`IdSource::Assigned`] adopts the envelope's id (restored by a load
    ///   or cached by an earlier call), or generates and caches a new one.
    ///
    /// Fails with `InvalidIdentity` if the result cannot address a record.
    pub fn resolve_id(&mut self) -> StorageResult<Identifier> {
        let resolved = match self.payload.id_source() {
            IdSource::Custom(id) => Identifier::new(id)?,
            IdSource::Field(field) => {
                if field.is_empty() {
                    let id = T::generate_id();
                    *field = id.as_str().to_owned();
                    id
                } else {
                    Identifier::new(field.as_str())?
                }
            }
            IdSource::Assigned => match &self.assigned_id {
                Some(id) => id.clone(),
                None => T::generate_id(),
            },
        };
        self.assigned_id = Some(resolved.clone());
        Ok(resolved)
    }

    /// Encode the payload with the type's adapter.
    pub fn encode(&self) -> StorageResult<Vec<u8>> {
        T::Codec::encode(&self.payload)
    }

    /// Decode a payload stored at `id`, restoring the envelope's identity.
    pub fn decode(bytes: &[u8], id: Identifier) -> StorageResult<Self> {
        let payload = T::Codec::decode(bytes)?;
        Ok(Self::with_id(id, payload))
    }
}

impl<T> From<T> for Envelope<T> {
    fn from(payload: T) -> Self {
        Self::new(payload)
    }
}

impl<T> Deref for Envelope<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.payload
    }
}

impl<T> DerefMut for Envelope<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.payload
    }
}

impl<T: PartialEq> PartialEq for Envelope<T> {
    fn eq(&self, other: &Self) -> bool {
        self.payload == other.payload
    }
}

/// Object-safe view of a record that can render its payload.
///
/// Used by backends that persist live ancestors alongside the record.
pub trait EncodePayload {
    fn encode_payload(&self) -> StorageResult<Vec<u8>>;
}

impl<T: Persistent> EncodePayload for Envelope<T> {
    fn encode_payload(&self) -> StorageResult<Vec<u8>> {
        self.encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Json;
    use crate::error::StorageError;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Author {
        name: String,
    }

    impl Persistent for Author {
        const TYPE_NAME: &'static str = "Author";
        type Codec = Json;
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Bot {
        id: String,
        name: String,
    }

    impl Persistent for Bot {
        const TYPE_NAME: &'static str = "Bot";
        type Codec = Json;

        fn id_source(&mut self) -> IdSource<'_> {
            IdSource::Field(&mut self.id)
        }
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Link {
        url: String,
    }

    impl Persistent for Link {
        const TYPE_NAME: &'static str = "Link";
        type Codec = Json;

        fn id_source(&mut self) -> IdSource<'_> {
            IdSource::Custom(
                self.url
                    .chars()
                    .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                    .collect(),
            )
        }
    }

    struct Counter(u64);

    impl Persistent for Counter {
        const TYPE_NAME: &'static str = "Counter";
        type Codec = crate::codec::Custom;

        fn generate_id() -> Identifier {
            Identifier::new("fixed").unwrap()
        }
    }

    impl crate::codec::CustomFormat for Counter {
        fn to_bytes(&self) -> StorageResult<Vec<u8>> {
            Ok(self.0.to_string().into_bytes())
        }

        fn from_bytes(bytes: &[u8]) -> StorageResult<Self> {
            std::str::from_utf8(bytes)
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Counter)
                .ok_or_else(|| StorageError::Serialization("not a counter".into()))
        }
    }

    // -----------------------------------------------------------------------
    // Identity resolution
    // -----------------------------------------------------------------------

    #[test]
    fn assigned_identity_is_cached() {
        let mut author = Envelope::new(Author {
            name: "Leo Tolstoy".into(),
        });
        assert!(author.id().is_none());
        let first = author.resolve_id().unwrap();
        let second = author.resolve_id().unwrap();
        assert_eq!(first, second);
        assert_eq!(author.id(), Some(&first));
    }

    #[test]
    fn assigned_identity_adopts_restored_id() {
        let id = Identifier::new("restored").unwrap();
        let mut author = Envelope::with_id(id.clone(), Author { name: "A".into() });
        assert_eq!(author.resolve_id().unwrap(), id);
    }

    #[test]
    fn empty_field_is_filled_and_written_back() {
        let mut bot = Envelope::new(Bot {
            id: String::new(),
            name: "A bot".into(),
        });
        let id = bot.resolve_id().unwrap();
        assert_eq!(bot.payload().id, id.as_str());
        assert_eq!(bot.resolve_id().unwrap(), id);
    }

    #[test]
    fn present_field_is_used() {
        let mut bot = Envelope::new(Bot {
            id: "3".into(),
            name: "A bot".into(),
        });
        assert_eq!(bot.resolve_id().unwrap(), "3");
    }

    #[test]
    fn field_follows_mutation() {
        let mut bot = Envelope::new(Bot {
            id: "1".into(),
            name: "A bot".into(),
        });
        bot.resolve_id().unwrap();
        bot.payload_mut().id = "2".into();
        assert_eq!(bot.resolve_id().unwrap(), "2");
    }

    #[test]
    fn custom_identity_wins() {
        let mut link = Envelope::with_id(
            Identifier::new("ignored").unwrap(),
            Link {
                url: "https://example.com/".into(),
            },
        );
        assert_eq!(link.resolve_id().unwrap(), "https___example_com_");
    }

    #[test]
    fn empty_custom_identity_is_fatal() {
        let mut link = Envelope::new(Link { url: String::new() });
        let err = link.resolve_id().unwrap_err();
        assert!(matches!(err, StorageError::InvalidIdentity { .. }));
    }

    #[test]
    fn custom_generator_is_used() {
        let mut counter = Envelope::new(Counter(7));
        assert_eq!(counter.resolve_id().unwrap(), "fixed");
    }

    // -----------------------------------------------------------------------
    // Encoding
    // -----------------------------------------------------------------------

    #[test]
    fn assigned_identity_is_not_encoded() {
        let mut author = Envelope::new(Author { name: "C class".into() });
        author.resolve_id().unwrap();
        assert_eq!(author.encode().unwrap(), br#"{"name":"C class"}"#);
    }

    #[test]
    fn field_identity_is_encoded() {
        let mut bot = Envelope::new(Bot {
            id: "123".into(),
            name: "n".into(),
        });
        bot.resolve_id().unwrap();
        assert_eq!(bot.encode().unwrap(), br#"{"id":"123","name":"n"}"#);
    }

    #[test]
    fn decode_restores_identity() {
        let id = Identifier::new("abc").unwrap();
        let mut author = Envelope::<Author>::decode(br#"{"name":"X"}"#, id.clone()).unwrap();
        assert_eq!(author.resolve_id().unwrap(), id);
        assert_eq!(author.payload().name, "X");
    }

    #[test]
    fn equality_ignores_identity() {
        let a = Envelope::with_id(Identifier::random(), Author { name: "same".into() });
        let b = Envelope::new(Author { name: "same".into() });
        assert_eq!(a, b);
    }

    #[test]
    fn custom_codec_roundtrip() {
        let counter = Envelope::new(Counter(42));
        let bytes = counter.encode_payload().unwrap();
        let back = Envelope::<Counter>::decode(&bytes, Identifier::new("c").unwrap()).unwrap();
        assert_eq!(back.payload().0, 42);
    }
}
