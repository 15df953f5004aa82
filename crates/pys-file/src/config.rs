use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the file backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    /// Maximum time to wait for an address lock. `None` blocks until the
    /// lock is free.
    pub lock_timeout: Option<Duration>,
    /// Delay between acquisition attempts while a timeout is in effect.
    pub poll_interval: Duration,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            lock_timeout: None,
            poll_interval: Duration::from_millis(10),
        }
    }
}

impl FileConfig {
    /// Block for at most `timeout` on any single lock.
    pub fn with_lock_timeout(timeout: Duration) -> Self {
        Self {
            lock_timeout: Some(timeout),
            ..Default::default()
        }
    }
}
