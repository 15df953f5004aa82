//! File-tree backend for pys.
//!
//! Each record is a JSON file whose path mirrors its address:
//!
//! ```text
//! <base>/
//! ├── BotOwner/
//! │   ├── o1.json          # BotOwner/o1
//! │   ├── o1.lock
//! │   └── o1/
//! │       └── Bot/
//! │           ├── 3.json   # BotOwner/o1/Bot/3
//! │           └── 3.lock
//! ```
//!
//! Deleting a record also deletes its owned subtree.

mod config;
mod lock;
mod storage;

pub use config::FileConfig;
pub use storage::{FileStorage, DATA_EXT, LOCK_EXT};
