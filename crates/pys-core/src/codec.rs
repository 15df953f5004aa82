//! Serialization adapters.
//!
//! Each record type binds exactly one adapter through
//! [`Persistent::Codec`](crate::Persistent::Codec). The set is closed:
//!
//! - [`Json`] -- declarative serde structs, compact JSON in declaration order
//! - [`Validated`] -- serde structs that check their own contents
//! - [`Custom`] -- records that render their own bytes
//!
//! Adapters only ever see the payload. The engine-assigned identity lives
//! in the [`Envelope`](crate::Envelope) and is never written into the bytes.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{StorageError, StorageResult};

/// Converts a record to and from its canonical stored bytes.
pub trait RecordCodec<T> {
    /// Render the record as canonical bytes.
    fn encode(record: &T) -> StorageResult<Vec<u8>>;

    /// Rebuild a record from bytes produced by [`encode`](Self::encode).
    fn decode(bytes: &[u8]) -> StorageResult<T>;
}

/// Compact JSON via serde, fields in declaration order.
#[derive(Clone, Copy, Debug, Default)]
pub struct Json;

impl<T> RecordCodec<T> for Json
where
    T: Serialize + DeserializeOwned,
{
    fn encode(record: &T) -> StorageResult<Vec<u8>> {
        Ok(serde_json::to_vec(record)?)
    }

    fn decode(bytes: &[u8]) -> StorageResult<T> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Self-validation hook for schema-validated records.
pub trait Validate {
    /// Return `Err(reason)` if the record's contents are not acceptable.
    fn validate(&self) -> Result<(), String>;
}

/// [`Json`] with a [`Validate`] check before every encode and after every
/// decode.
#[derive(Clone, Copy, Debug, Default)]
pub struct Validated;

fn validation_error<T>(reason: String) -> StorageError {
    let full = std::any::type_name::<T>();
    let short = full.rsplit("::").next().unwrap_or(full);
    StorageError::Validation {
        type_name: short.to_string(),
        reason,
    }
}

impl<T> RecordCodec<T> for Validated
where
    T: Serialize + DeserializeOwned + Validate,
{
    fn encode(record: &T) -> StorageResult<Vec<u8>> {
        record.validate().map_err(validation_error::<T>)?;
        <Json as RecordCodec<T>>::encode(record)
    }

    fn decode(bytes: &[u8]) -> StorageResult<T> {
        let record: T = <Json as RecordCodec<T>>::decode(bytes)?;
        record.validate().map_err(validation_error::<T>)?;
        Ok(record)
    }
}

/// A record that provides its own byte representation.
pub trait CustomFormat: Sized {
    fn to_bytes(&self) -> StorageResult<Vec<u8>>;

    fn from_bytes(bytes: &[u8]) -> StorageResult<Self>;
}

/// Delegates to the record's [`CustomFormat`] implementation.
#[derive(Clone, Copy, Debug, Default)]
pub struct Custom;

impl<T: CustomFormat> RecordCodec<T> for Custom {
    fn encode(record: &T) -> StorageResult<Vec<u8>> {
        record.to_bytes()
    }

    fn decode(bytes: &[u8]) -> StorageResult<T> {
        T::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        some_other: String,
        count: u32,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Rating {
        stars: u8,
    }

    impl Validate for Rating {
        fn validate(&self) -> Result<(), String> {
            if self.stars > 5 {
                return Err(format!("{} stars is more than 5", self.stars));
            }
            Ok(())
        }
    }

    #[derive(Debug, PartialEq)]
    struct Csv(Vec<String>);

    impl CustomFormat for Csv {
        fn to_bytes(&self) -> StorageResult<Vec<u8>> {
            Ok(self.0.join(",").into_bytes())
        }

        fn from_bytes(bytes: &[u8]) -> StorageResult<Self> {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            Ok(Self(text.split(',').map(str::to_string).collect()))
        }
    }

    #[test]
    fn json_is_compact_in_declaration_order() {
        let sample = Sample {
            some_other: "xyz".into(),
            count: 2,
        };
        let bytes = Json::encode(&sample).unwrap();
        assert_eq!(bytes, br#"{"some_other":"xyz","count":2}"#);
        let decoded: Sample = Json::decode(&bytes).unwrap();
        assert_eq!(decoded, sample);
    }

    #[test]
    fn json_rejects_malformed_bytes() {
        let err = <Json as RecordCodec<Sample>>::decode(b"{not json").unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[test]
    fn validated_checks_on_encode() {
        let err = Validated::encode(&Rating { stars: 9 }).unwrap_err();
        match err {
            StorageError::Validation { type_name, reason } => {
                assert_eq!(type_name, "Rating");
                assert!(reason.contains("9 stars"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn validated_checks_on_decode() {
        let err = <Validated as RecordCodec<Rating>>::decode(br#"{"stars":6}"#).unwrap_err();
        assert!(matches!(err, StorageError::Validation { .. }));
        let ok: Rating = Validated::decode(br#"{"stars":4}"#).unwrap();
        assert_eq!(ok, Rating { stars: 4 });
    }

    #[test]
    fn custom_delegates_to_record() {
        let csv = Csv(vec!["a".into(), "b".into()]);
        let bytes = Custom::encode(&csv).unwrap();
        assert_eq!(bytes, b"a,b");
        let decoded: Csv = Custom::decode(&bytes).unwrap();
        assert_eq!(decoded, csv);
    }
}
