//! SQL text for the per-type tables.
//!
//! Every record type gets its own table:
//!
//! ```text
//! id            TEXT NOT NULL
//! data          TEXT            -- payload; BLOB when not valid UTF-8
//! related_id    TEXT            -- immediate ancestor id, NULL at root
//! related_name  TEXT            -- immediate ancestor type, NULL at root
//! ```
//!
//! SQLite treats NULLs as distinct in plain unique constraints, so the key
//! index folds them to `''` to make root records unique as well.

use pys_core::TypeName;

/// Quoted table identifier for `type_name`.
///
/// [`TypeName::table_name`] only yields word characters, so the quoting never
/// needs escaping.
pub(crate) fn table(type_name: &TypeName) -> String {
    format!("\"{}\"", type_name.table_name())
}

pub(crate) fn create_table(type_name: &TypeName) -> String {
    let raw = type_name.table_name();
    format!(
        "CREATE TABLE IF NOT EXISTS \"{raw}\" (
             id TEXT NOT NULL,
             data TEXT,
             related_id TEXT,
             related_name TEXT
         );
         CREATE UNIQUE INDEX IF NOT EXISTS \"{raw}.key\"
             ON \"{raw}\" (id, IFNULL(related_id, ''), IFNULL(related_name, ''));"
    )
}

pub(crate) fn table_exists() -> &'static str {
    "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)"
}

pub(crate) fn upsert(type_name: &TypeName) -> String {
    format!(
        "INSERT INTO {} (id, data, related_id, related_name) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT DO UPDATE SET data = excluded.data",
        table(type_name)
    )
}

// `IS` compares NULL to NULL as equal, which the root filter relies on.

pub(crate) fn select_one(type_name: &TypeName) -> String {
    format!(
        "SELECT data FROM {} WHERE id = ?1 AND related_id IS ?2 AND related_name IS ?3",
        table(type_name)
    )
}

pub(crate) fn delete_one(type_name: &TypeName) -> String {
    format!(
        "DELETE FROM {} WHERE id = ?1 AND related_id IS ?2 AND related_name IS ?3",
        table(type_name)
    )
}

pub(crate) fn select_all(type_name: &TypeName) -> String {
    format!(
        "SELECT DISTINCT id, data FROM {} WHERE related_id IS ?1 AND related_name IS ?2
         ORDER BY id",
        table(type_name)
    )
}
