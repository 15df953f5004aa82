use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use pys_core::{Address, AncestorRef, Backend, Identifier, StorageError, StorageResult, TypeName};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::FileConfig;
use crate::lock;

/// Extension of record payload files.
pub const DATA_EXT: &str = "json";

/// Extension of the sibling lock markers.
pub const LOCK_EXT: &str = "lock";

/// File-tree backend.
///
/// A record at address `A/a/B/b` lives in `<base>/A/a/B/b.json`; records
/// owned by it live beneath the directory `<base>/A/a/B/b/`. Every operation
/// on an address holds that address's lock for its whole duration and never
/// holds a second lock, so operations within one store cannot deadlock.
/// Safe across threads and processes on a local filesystem.
pub struct FileStorage {
    base_path: PathBuf,
    config: FileConfig,
}

/// Append `.ext` to `stem` without touching any dot already in its name.
fn with_ext(stem: &Path, ext: &str) -> PathBuf {
    let mut name: OsString = stem.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Reject addresses whose ids would share a filesystem name with a sibling.
///
/// A record's owned directory `<id>/` must never equal another id's
/// `<id>.json` or `<id>.lock`, so ids carrying either extension are refused.
fn checked(address: Address) -> StorageResult<Address> {
    for (_, id) in address.segments() {
        for ext in [DATA_EXT, LOCK_EXT] {
            let reserved = id
                .as_str()
                .strip_suffix(ext)
                .is_some_and(|rest| rest.ends_with('.'));
            if reserved {
                return Err(StorageError::InvalidIdentity {
                    id: id.to_string(),
                    reason: format!("ids ending in .{ext} are reserved by the file backend"),
                });
            }
        }
    }
    Ok(address)
}

fn ignore_missing(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

impl FileStorage {
    /// Open a store rooted at `base_path`. Nothing is created until the
    /// first save.
    pub fn open(base_path: impl Into<PathBuf>, config: FileConfig) -> Self {
        Self {
            base_path: base_path.into(),
            config,
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn config(&self) -> &FileConfig {
        &self.config
    }

    /// Path of the directory that holds records owned by `address`.
    pub fn stem_path(&self, address: &Address) -> PathBuf {
        self.base_path.join(address.to_path())
    }

    /// Path of the payload file for `address`.
    pub fn data_path(&self, address: &Address) -> PathBuf {
        with_ext(&self.stem_path(address), DATA_EXT)
    }

    /// Path of the lock marker for `address`.
    pub fn lock_path(&self, address: &Address) -> PathBuf {
        with_ext(&self.stem_path(address), LOCK_EXT)
    }

    /// Every address stored anywhere in the tree, sorted.
    pub fn addresses(&self) -> StorageResult<Vec<Address>> {
        if !self.base_path.exists() {
            return Ok(Vec::new());
        }
        let suffix = format!(".{DATA_EXT}");
        let mut found = Vec::new();
        for entry in WalkDir::new(&self.base_path).min_depth(2) {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.base_path) else {
                continue;
            };
            let Some(canonical) = relative
                .to_str()
                .and_then(|s| s.strip_suffix(suffix.as_str()))
                .map(|s| s.replace(std::path::MAIN_SEPARATOR, "/"))
            else {
                continue;
            };
            match canonical.parse::<Address>() {
                Ok(address) => found.push(address),
                Err(e) => warn!(path = %entry.path().display(), error = %e, "skipping stray file"),
            }
        }
        found.sort();
        Ok(found)
    }
}

impl Backend for FileStorage {
    fn put(
        &self,
        type_name: &TypeName,
        id: &Identifier,
        data: &[u8],
        ancestors: &[AncestorRef<'_>],
    ) -> StorageResult<()> {
        let address = checked(Address::compose(type_name, id, ancestors))?;
        let path = self.data_path(&address);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let _guard = lock::acquire(&self.lock_path(&address), &self.config)?;
        fs::write(&path, data)?;
        debug!(%address, len = data.len(), "file put");
        Ok(())
    }

    fn get(
        &self,
        type_name: &TypeName,
        id: &Identifier,
        ancestors: &[AncestorRef<'_>],
    ) -> StorageResult<Option<Vec<u8>>> {
        let address = checked(Address::compose(type_name, id, ancestors))?;
        let path = self.data_path(&address);
        if !path.exists() {
            return Ok(None);
        }

        let _guard = lock::acquire(&self.lock_path(&address), &self.config)?;
        match fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            // Deleted between the existence check and the lock.
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn remove(
        &self,
        type_name: &TypeName,
        id: &Identifier,
        ancestors: &[AncestorRef<'_>],
    ) -> StorageResult<()> {
        let address = checked(Address::compose(type_name, id, ancestors))?;
        let path = self.data_path(&address);
        if !path.parent().is_some_and(Path::exists) {
            return Ok(());
        }

        let _guard = lock::acquire(&self.lock_path(&address), &self.config)?;
        ignore_missing(fs::remove_file(&path))?;
        // Records owned by this one live in the directory named like the
        // data file without its extension.
        ignore_missing(fs::remove_dir_all(self.stem_path(&address)))?;
        debug!(%address, "file remove");
        Ok(())
    }

    fn scan(
        &self,
        type_name: &TypeName,
        ancestors: &[AncestorRef<'_>],
    ) -> StorageResult<Vec<(Identifier, Vec<u8>)>> {
        let listing = checked(Address::listing(type_name, ancestors))?;
        let Some(dir) = self.data_path(&listing).parent().map(Path::to_path_buf) else {
            return Ok(Vec::new());
        };

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let suffix = format!(".{DATA_EXT}");
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(suffix.as_str())) else {
                continue;
            };
            match Identifier::new(stem) {
                Ok(id) => ids.push(id),
                Err(e) => warn!(dir = %dir.display(), error = %e, "skipping stray file"),
            }
        }
        ids.sort();

        // One address lock at a time: each record is read through `get`.
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(data) = self.get(type_name, &id, ancestors)? {
                found.push((id, data));
            }
        }
        debug!(%listing, count = found.len(), "file scan");
        Ok(found)
    }

    fn destroy(self) -> StorageResult<()> {
        ignore_missing(fs::remove_dir_all(&self.base_path))?;
        debug!(base_path = %self.base_path.display(), "file store destroyed");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file(base_path={})", self.base_path.display())
    }
}

impl std::fmt::Debug for FileStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStorage")
            .field("base_path", &self.base_path)
            .field("lock_timeout", &self.config.lock_timeout)
            .finish()
    }
}
