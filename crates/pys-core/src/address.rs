//! Hierarchical storage addresses.
//!
//! An address is a non-empty chain of `(type, id)` segments, outermost
//! ancestor first. Its canonical form joins every segment with `/`:
//!
//! ```text
//! Author/leo/Book/war-and-peace
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::ancestor::AncestorRef;
use crate::error::{StorageError, StorageResult};
use crate::types::{Identifier, TypeName};

/// Synthetic id used to compose the container of a listing.
pub const LIST_MARKER: &str = "__list__";

/// A record's location: its own `(type, id)` nested under its ancestors.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    segments: Vec<(TypeName, Identifier)>,
}

impl Address {
    /// Compose `a1.type/a1.id/.../an.type/an.id/type/id`.
    ///
    /// Ancestors are not expanded through their own ancestors.
    pub fn compose(type_name: &TypeName, id: &Identifier, ancestors: &[AncestorRef<'_>]) -> Self {
        let mut segments: Vec<_> = ancestors
            .iter()
            .map(|a| (a.type_name().clone(), a.id().clone()))
            .collect();
        segments.push((type_name.clone(), id.clone()));
        Self { segments }
    }

    /// Address of the listing marker for `type_name` under `ancestors`.
    ///
    /// Every record of that type under that parent is a sibling of it.
    pub fn listing(type_name: &TypeName, ancestors: &[AncestorRef<'_>]) -> Self {
        let marker = Identifier(LIST_MARKER.to_string());
        Self::compose(type_name, &marker, ancestors)
    }

    /// All segments, outermost first.
    pub fn segments(&self) -> &[(TypeName, Identifier)] {
        &self.segments
    }

    /// Type of the addressed record.
    pub fn type_name(&self) -> &TypeName {
        &self.last().0
    }

    /// Identity of the addressed record.
    pub fn id(&self) -> &Identifier {
        &self.last().1
    }

    /// Number of segments, counting the record itself.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Address of the immediate parent record, if any.
    pub fn parent(&self) -> Option<Address> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// `true` if both addresses share type and parent chain.
    pub fn is_sibling_of(&self, other: &Address) -> bool {
        let n = self.segments.len();
        n == other.segments.len()
            && self.segments[..n - 1] == other.segments[..n - 1]
            && self.type_name() == other.type_name()
    }

    /// `true` if `self` lies strictly beneath `ancestor`.
    pub fn is_descendant_of(&self, ancestor: &Address) -> bool {
        self.segments.len() > ancestor.segments.len()
            && self.segments[..ancestor.segments.len()] == ancestor.segments[..]
    }

    /// Relative filesystem path `type/id/.../type/id`.
    pub fn to_path(&self) -> PathBuf {
        self.segments
            .iter()
            .flat_map(|(t, id)| [t.as_str(), id.as_str()])
            .collect()
    }

    fn last(&self) -> &(TypeName, Identifier) {
        // `compose` and `from_str` both guarantee at least one segment.
        &self.segments[self.segments.len() - 1]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (type_name, id)) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{type_name}/{id}")?;
        }
        Ok(())
    }
}

impl FromStr for Address {
    type Err = StorageError;

    /// Parse the canonical `type/id/...` form.
    fn from_str(s: &str) -> StorageResult<Self> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() % 2 != 0 {
            return Err(StorageError::InvalidIdentity {
                id: s.to_string(),
                reason: "address must have an even number of segments".into(),
            });
        }
        let segments = parts
            .chunks(2)
            .map(|pair| Ok((TypeName::new(pair[0])?, Identifier::new(pair[1])?)))
            .collect::<StorageResult<Vec<_>>>()?;
        Ok(Self { segments })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn t(name: &str) -> TypeName {
        TypeName::new(name).unwrap()
    }

    fn i(id: &str) -> Identifier {
        Identifier::new(id).unwrap()
    }

    fn key(type_name: &str, id: &str) -> AncestorRef<'static> {
        AncestorRef::named(t(type_name), i(id))
    }

    #[test]
    fn root_address() {
        let addr = Address::compose(&t("Author"), &i("leo"), &[]);
        assert_eq!(addr.to_string(), "Author/leo");
        assert_eq!(addr.depth(), 1);
        assert!(addr.parent().is_none());
        assert_eq!(addr.to_path(), PathBuf::from("Author").join("leo"));
    }

    #[test]
    fn nested_address() {
        let addr = Address::compose(
            &t("BotResponse"),
            &i("r1"),
            &[key("BotOwner", "o1"), key("Bot", "b1")],
        );
        assert_eq!(addr.to_string(), "BotOwner/o1/Bot/b1/BotResponse/r1");
        assert_eq!(addr.type_name(), &t("BotResponse"));
        assert_eq!(addr.id(), &i("r1"));
        assert_eq!(addr.parent().unwrap().to_string(), "BotOwner/o1/Bot/b1");
    }

    #[test]
    fn ancestor_order_matters() {
        let ab = Address::compose(&t("C"), &i("c"), &[key("A", "a"), key("B", "b")]);
        let ba = Address::compose(&t("C"), &i("c"), &[key("B", "b"), key("A", "a")]);
        assert_ne!(ab, ba);
    }

    #[test]
    fn listing_marker_is_sibling() {
        let under = [key("Author", "leo")];
        let listing = Address::listing(&t("Book"), &under);
        assert_eq!(listing.id().as_str(), LIST_MARKER);
        let book = Address::compose(&t("Book"), &i("b1"), &under);
        assert!(book.is_sibling_of(&listing));
        let elsewhere = Address::compose(&t("Book"), &i("b1"), &[key("Author", "other")]);
        assert!(!elsewhere.is_sibling_of(&listing));
        let root_book = Address::compose(&t("Book"), &i("b1"), &[]);
        assert!(!root_book.is_sibling_of(&listing));
    }

    #[test]
    fn descendants() {
        let author = Address::compose(&t("Author"), &i("leo"), &[]);
        let book = Address::compose(&t("Book"), &i("b1"), &[key("Author", "leo")]);
        assert!(book.is_descendant_of(&author));
        assert!(!author.is_descendant_of(&author));
        assert!(!author.is_descendant_of(&book));
    }

    #[test]
    fn parse_rejects_odd_segments() {
        assert!("Author/leo/Book".parse::<Address>().is_err());
        assert!("".parse::<Address>().is_err());
    }

    proptest! {
        #[test]
        fn display_parse_roundtrip(
            chain in proptest::collection::vec(("[A-Z][a-z]{0,8}", "[a-z0-9-]{1,12}"), 0..4),
            own in ("[A-Z][a-z]{0,8}", "[a-z0-9-]{1,12}"),
        ) {
            let ancestors: Vec<_> = chain.iter().map(|(ty, id)| key(ty, id)).collect();
            let addr = Address::compose(&t(&own.0), &i(&own.1), &ancestors);
            prop_assert_eq!(addr.depth(), chain.len() + 1);
            let parsed: Address = addr.to_string().parse().unwrap();
            prop_assert_eq!(parsed, addr);
        }
    }
}
