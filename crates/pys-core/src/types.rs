use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

/// Check that `s` can serve as a single address segment.
///
/// Segments become directory and file names in the file backend and are
/// joined with `/` in the canonical address form, so separators and the
/// relative-path names `.` and `..` are rejected.
fn check_segment(s: &str) -> Result<(), &'static str> {
    if s.is_empty() {
        return Err("must not be empty");
    }
    if s == "." || s == ".." {
        return Err("must not be a relative path name");
    }
    if s.contains(['/', '\\', '\0']) {
        return Err("must not contain '/', '\\' or NUL");
    }
    Ok(())
}

/// The identity of a record within its (type, parent) scope.
///
/// An `Identifier` is never empty and is always usable as one address
/// segment.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(pub(crate) String);

impl Identifier {
    /// Validate and wrap an identity string.
    pub fn new(id: impl Into<String>) -> StorageResult<Self> {
        let id = id.into();
        check_segment(&id).map_err(|reason| StorageError::invalid_identity(&id, reason))?;
        Ok(Self(id))
    }

    /// A fresh random identity: a UUID v4 in canonical hyphenated form.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// The identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the identifier, returning the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identifier {
    type Err = StorageError;

    fn from_str(s: &str) -> StorageResult<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Identifier {
    type Error = StorageError;

    fn try_from(s: String) -> StorageResult<Self> {
        Self::new(s)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// The name of a record type, as used in addresses and table names.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(Cow<'static, str>);

impl TypeName {
    /// Validate a type name known at compile time.
    pub fn from_static(name: &'static str) -> StorageResult<Self> {
        Self::validated(Cow::Borrowed(name))
    }

    /// Validate a type name supplied at runtime.
    pub fn new(name: impl Into<String>) -> StorageResult<Self> {
        Self::validated(Cow::Owned(name.into()))
    }

    fn validated(name: Cow<'static, str>) -> StorageResult<Self> {
        check_segment(&name).map_err(|reason| StorageError::UnsupportedRecordType {
            type_name: name.to_string(),
            reason: format!("type name {reason}"),
        })?;
        Ok(Self(name))
    }

    /// The type name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Normalized lowercase table name: every non-word character becomes `_`.
    pub fn table_name(&self) -> String {
        self.0
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
            .flat_map(char::to_lowercase)
            .collect()
    }
}

impl fmt::Debug for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeName({})", self.0)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TypeName {
    type Err = StorageError;

    fn from_str(s: &str) -> StorageResult<Self> {
        Self::new(s)
    }
}

impl AsRef<str> for TypeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
