use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use pys_file::FileConfig;
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Which storage backend a [`StoreConfig`] opens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    File,
    #[default]
    Sqlite,
    Memory,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::File => "file",
            Self::Sqlite => "sqlite",
            Self::Memory => "memory",
        })
    }
}

impl FromStr for BackendKind {
    type Err = SdkError;

    fn from_str(s: &str) -> SdkResult<Self> {
        match s {
            "file" => Ok(Self::File),
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(SdkError::Config(format!("unknown backend {other:?}"))),
        }
    }
}

/// Where and how to open a store.
///
/// ```toml
/// backend = "file"
/// path = "data/store"
/// lock_timeout_ms = 2000
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: BackendKind,
    /// Base directory for `file`, database file for `sqlite`. Ignored by
    /// `memory`.
    pub path: PathBuf,
    /// Bound on each file-backend lock wait. Unset waits indefinitely.
    pub lock_timeout_ms: Option<u64>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Sqlite,
            path: PathBuf::from("pys.db"),
            lock_timeout_ms: None,
        }
    }
}

impl StoreConfig {
    pub fn new(backend: BackendKind, path: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            path: path.into(),
            lock_timeout_ms: None,
        }
    }

    pub fn from_toml_str(s: &str) -> SdkResult<Self> {
        toml::from_str(s).map_err(|e| SdkError::Config(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> SdkResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| SdkError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout_ms.map(Duration::from_millis)
    }

    /// File-backend settings derived from this config.
    pub fn file_config(&self) -> FileConfig {
        FileConfig {
            lock_timeout: self.lock_timeout(),
            ..FileConfig::default()
        }
    }
}
