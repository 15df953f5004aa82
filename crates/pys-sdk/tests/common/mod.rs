#![allow(dead_code)]

use pys_sdk::{
    AnyBackend, BackendKind, IdSource, Json, Persistent, Store, StoreConfig, Validate, Validated,
};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
}

impl Persistent for Author {
    const TYPE_NAME: &'static str = "Author";
    type Codec = Json;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
}

impl Persistent for Book {
    const TYPE_NAME: &'static str = "Book";
    type Codec = Json;
}

/// Carries its own identity in a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bot {
    pub id: String,
    pub label: String,
}

impl Persistent for Bot {
    const TYPE_NAME: &'static str = "Bot";
    type Codec = Json;

    fn id_source(&mut self) -> IdSource<'_> {
        IdSource::Field(&mut self.id)
    }
}

/// Schema-checked: ratings run from 1 to 5.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub stars: u8,
}

impl Validate for Review {
    fn validate(&self) -> Result<(), String> {
        if (1..=5).contains(&self.stars) {
            Ok(())
        } else {
            Err(format!("stars must be 1..=5, got {}", self.stars))
        }
    }
}

impl Persistent for Review {
    const TYPE_NAME: &'static str = "Review";
    type Codec = Validated;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Day {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

/// Keyed by a calendar date rather than a string field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyNote {
    pub date: Day,
    pub text: String,
}

impl Persistent for DailyNote {
    const TYPE_NAME: &'static str = "DailyNote";
    type Codec = Json;

    fn id_source(&mut self) -> IdSource<'_> {
        let Day { year, month, day } = self.date;
        IdSource::Custom(format!("{year:04}-{month:02}-{day:02}"))
    }
}

/// A fresh store of every built-in kind. Keep the `TempDir` alive for the
/// duration of the test.
pub fn stores() -> Vec<(BackendKind, Store<AnyBackend>, TempDir)> {
    [BackendKind::Memory, BackendKind::File, BackendKind::Sqlite]
        .into_iter()
        .map(|kind| {
            let dir = tempfile::tempdir().unwrap();
            let path = match kind {
                BackendKind::Sqlite => dir.path().join("pys.db"),
                _ => dir.path().join("store"),
            };
            let store = Store::open(&StoreConfig::new(kind, path)).unwrap();
            (kind, store, dir)
        })
        .collect()
}
