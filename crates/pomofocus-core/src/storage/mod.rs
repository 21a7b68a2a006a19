//! Local persistence.
//!
//! Everything the app remembers is a JSON blob under a fixed key in a
//! [`KeyValueStore`]. Writes are last-write-wins; there is no transaction
//! spanning two keys.

mod config;
mod memory;
mod sqlite;

pub use config::{AppConfig, LoggingConfig, StorageConfig};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StorageError};

/// Storage keys.
pub mod keys {
    pub const TIMER_SNAPSHOT: &str = "timer.snapshot";
    pub const SETTINGS: &str = "settings";
    pub const ACTIVE_TASKS: &str = "tasks.active";
    pub const ARCHIVED_TASKS: &str = "tasks.archived";
    pub const CURRENT_TASK: &str = "tasks.current";
    pub const SESSIONS: &str = "sessions";
    pub const ENTITLEMENT: &str = "entitlement";
}

/// Byte-blob key-value storage gateway.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Returns the data directory.
///
/// `POMOFOCUS_DATA_DIR` wins outright. Otherwise `~/.config/pomofocus`, or
/// `~/.config/pomofocus-dev` when `POMOFOCUS_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("POMOFOCUS_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("POMOFOCUS_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pomofocus-dev")
            } else {
                base_dir.join("pomofocus")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Read and decode a JSON blob.
///
/// Missing keys, read failures and corrupt blobs all come back as `None`;
/// the latter two are logged.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let bytes = match store.get(key) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key, error = %e, "storage read failed, using defaults");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "discarding unreadable record");
            None
        }
    }
}

/// Encode and write a JSON blob, propagating failures.
pub fn try_save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let bytes = serde_json::to_vec(value)?;
    store.set(key, &bytes)?;
    Ok(())
}

/// Fire-and-forget write: failures are logged and dropped.
pub fn save_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) {
    if let Err(e) = try_save_json(store, key, value) {
        tracing::warn!(key, error = %e, "storage write failed");
    }
}
