//! Address-scoped advisory locks.
//!
//! Each data file has a sibling `.lock` marker. Holding an exclusive OS
//! advisory lock on the marker grants the holder sole access to the data
//! file. Markers are never removed while the address is live, since a waiter
//! may already hold an open handle to it.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

use fs2::FileExt;
use pys_core::{StorageError, StorageResult};
use tracing::trace;

use crate::config::FileConfig;

/// RAII guard holding an exclusive lock on one marker file.
#[derive(Debug)]
pub(crate) struct AddressLock {
    file: File,
    path: PathBuf,
}

impl Drop for AddressLock {
    fn drop(&mut self) {
        // Releasing can only fail if the handle is already invalid, in which
        // case the OS has dropped the lock anyway.
        let _ = FileExt::unlock(&self.file);
        trace!(path = %self.path.display(), "lock released");
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

/// Acquire an exclusive lock on `lock_path`, creating the marker if needed.
///
/// Without a timeout this blocks until the lock is free. With one, it polls
/// every `config.poll_interval` and fails with `LockTimeout` at the deadline.
pub(crate) fn acquire(lock_path: &Path, config: &FileConfig) -> StorageResult<AddressLock> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path)?;

    match config.lock_timeout {
        None => file.lock_exclusive()?,
        Some(timeout) => {
            let deadline = Instant::now() + timeout;
            loop {
                match file.try_lock_exclusive() {
                    Ok(()) => break,
                    Err(e) if is_contended(&e) => {
                        if Instant::now() >= deadline {
                            return Err(StorageError::LockTimeout {
                                path: lock_path.to_path_buf(),
                                timeout,
                            });
                        }
                        thread::sleep(config.poll_interval);
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }

    trace!(path = %lock_path.display(), "lock acquired");
    Ok(AddressLock {
        file,
        path: lock_path.to_path_buf(),
    })
}
