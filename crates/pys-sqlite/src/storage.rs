use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use pys_core::{AncestorRef, Backend, Identifier, StorageError, StorageResult, TypeName};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::schema;

/// Relational backend on a single SQLite database.
///
/// Records are keyed by `(id, immediate ancestor)`. Deleting a record leaves
/// rows that named it as their parent untouched.
pub struct SqliteStorage {
    path: Option<PathBuf>,
    inner: Mutex<Inner>,
}

struct Inner {
    conn: Connection,
    /// Tables known to exist, so reads skip the catalog lookup.
    tables: HashSet<String>,
}

fn db_err(err: rusqlite::Error) -> StorageError {
    StorageError::database(err)
}

/// `(related_id, related_name)` for a record nested under `ancestors`.
fn parent_of<'a>(ancestors: &'a [AncestorRef<'_>]) -> (Option<&'a str>, Option<&'a str>) {
    match ancestors.last() {
        Some(a) => (Some(a.id().as_str()), Some(a.type_name().as_str())),
        None => (None, None),
    }
}

fn to_column(data: &[u8]) -> Value {
    match std::str::from_utf8(data) {
        Ok(text) => Value::Text(text.to_owned()),
        Err(_) => Value::Blob(data.to_vec()),
    }
}

fn from_column(value: ValueRef<'_>) -> rusqlite::Result<Vec<u8>> {
    match value {
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => Ok(bytes.to_vec()),
        ValueRef::Null => Ok(Vec::new()),
        other => Err(rusqlite::Error::InvalidColumnType(
            0,
            "data".to_string(),
            other.data_type(),
        )),
    }
}

impl Inner {
    fn ensure_table(&mut self, type_name: &TypeName) -> StorageResult<()> {
        let name = type_name.table_name();
        if self.tables.contains(&name) {
            return Ok(());
        }
        self.conn
            .execute_batch(&schema::create_table(type_name))
            .map_err(db_err)?;
        debug!(table = %name, "table ready");
        self.tables.insert(name);
        Ok(())
    }

    fn has_table(&mut self, type_name: &TypeName) -> StorageResult<bool> {
        let name = type_name.table_name();
        if self.tables.contains(&name) {
            return Ok(true);
        }
        let exists: bool = self
            .conn
            .query_row(schema::table_exists(), params![name], |row| row.get(0))
            .map_err(db_err)?;
        if exists {
            self.tables.insert(name);
        }
        Ok(exists)
    }
}

fn upsert(
    conn: &Connection,
    type_name: &TypeName,
    id: &Identifier,
    data: &[u8],
    parent: (Option<&str>, Option<&str>),
) -> StorageResult<()> {
    conn.execute(
        &schema::upsert(type_name),
        params![id.as_str(), to_column(data), parent.0, parent.1],
    )
    .map_err(db_err)?;
    Ok(())
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

impl SqliteStorage {
    /// Open (or create) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(db_err)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(db_err)?;
        debug!(path = %path.display(), "sqlite store opened");
        Ok(Self::from_connection(conn, Some(path.to_path_buf())))
    }

    /// A private in-memory database, discarded on drop.
    pub fn in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Ok(Self::from_connection(conn, None))
    }

    fn from_connection(conn: Connection, path: Option<PathBuf>) -> Self {
        Self {
            path,
            inner: Mutex::new(Inner {
                conn,
                tables: HashSet::new(),
            }),
        }
    }

    /// Database file path, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Names of every record table in the database, sorted.
    pub fn tables(&self) -> StorageResult<Vec<String>> {
        let inner = self.inner.lock().expect("lock poisoned");
        let mut stmt = inner
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .map_err(db_err)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;
        Ok(names)
    }
}

impl Backend for SqliteStorage {
    fn put(
        &self,
        type_name: &TypeName,
        id: &Identifier,
        data: &[u8],
        ancestors: &[AncestorRef<'_>],
    ) -> StorageResult<()> {
        let mut inner = self.inner.lock().expect("lock poisoned");

        // Live ancestors are rows too; each one is keyed under its predecessor.
        // Every row is its own statement, outermost first.
        let mut ancestors_saved = 0;
        for (i, ancestor) in ancestors.iter().enumerate() {
            if let Some(record) = ancestor.record_payload() {
                let payload = record.encode_payload()?;
                inner.ensure_table(ancestor.type_name())?;
                upsert(
                    &inner.conn,
                    ancestor.type_name(),
                    ancestor.id(),
                    &payload,
                    parent_of(&ancestors[..i]),
                )?;
                ancestors_saved += 1;
            }
        }
        inner.ensure_table(type_name)?;
        upsert(&inner.conn, type_name, id, data, parent_of(ancestors))?;

        debug!(
            type_name = %type_name,
            %id,
            len = data.len(),
            ancestors_saved,
            "sqlite put"
        );
        Ok(())
    }

    fn get(
        &self,
        type_name: &TypeName,
        id: &Identifier,
        ancestors: &[AncestorRef<'_>],
    ) -> StorageResult<Option<Vec<u8>>> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        if !inner.has_table(type_name)? {
            return Ok(None);
        }
        let (related_id, related_name) = parent_of(ancestors);
        inner
            .conn
            .query_row(
                &schema::select_one(type_name),
                params![id.as_str(), related_id, related_name],
                |row| from_column(row.get_ref(0)?),
            )
            .optional()
            .map_err(db_err)
    }

    fn remove(
        &self,
        type_name: &TypeName,
        id: &Identifier,
        ancestors: &[AncestorRef<'_>],
    ) -> StorageResult<()> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        if !inner.has_table(type_name)? {
            return Ok(());
        }
        let (related_id, related_name) = parent_of(ancestors);
        let removed = inner
            .conn
            .execute(
                &schema::delete_one(type_name),
                params![id.as_str(), related_id, related_name],
            )
            .map_err(db_err)?;
        debug!(type_name = %type_name, %id, removed, "sqlite remove");
        Ok(())
    }

    fn scan(
        &self,
        type_name: &TypeName,
        ancestors: &[AncestorRef<'_>],
    ) -> StorageResult<Vec<(Identifier, Vec<u8>)>> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        if !inner.has_table(type_name)? {
            return Ok(Vec::new());
        }
        let (related_id, related_name) = parent_of(ancestors);
        let mut stmt = inner
            .conn
            .prepare(&schema::select_all(type_name))
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![related_id, related_name], |row| {
                Ok((row.get::<_, String>(0)?, from_column(row.get_ref(1)?)?))
            })
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;

        rows.into_iter()
            .map(|(id, data)| Ok((Identifier::new(id)?, data)))
            .collect()
    }

    fn destroy(self) -> StorageResult<()> {
        let inner = self.inner.into_inner().unwrap_or_else(PoisonError::into_inner);
        inner.conn.close().map_err(|(_, e)| db_err(e))?;

        if let Some(path) = &self.path {
            remove_if_exists(path)?;
            for suffix in ["-wal", "-shm"] {
                let mut side = path.as_os_str().to_owned();
                side.push(suffix);
                remove_if_exists(Path::new(&side))?;
            }
            debug!(path = %path.display(), "sqlite store destroyed");
        }
        Ok(())
    }

    fn describe(&self) -> String {
        match &self.path {
            Some(path) => format!("sqlite(path={})", path.display()),
            None => "sqlite(path=:memory:)".to_string(),
        }
    }
}

impl std::fmt::Debug for SqliteStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStorage")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
