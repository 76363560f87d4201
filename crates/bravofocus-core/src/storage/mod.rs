mod config;
pub mod database;
pub mod keys;
mod memory;
mod preferences;

pub use config::{AudioConfig, Config, TimerConfig};
pub use database::Database;
pub use memory::MemoryStore;
pub use preferences::{Preferences, Theme};

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::StorageError;

/// Returns the data directory, creating it if needed.
///
/// `BRAVOFOCUS_DATA_DIR` overrides the location outright. Otherwise this is
/// `~/.config/bravofocus[-dev]/`, with BRAVOFOCUS_ENV=dev selecting the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("BRAVOFOCUS_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("BRAVOFOCUS_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("bravofocus-dev")
            } else {
                base_dir.join("bravofocus")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// String key/value persistence.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Write every entry or none of them.
    fn set_many(&mut self, entries: &[(String, String)]) -> Result<(), StorageError>;

    /// All entries whose key starts with `prefix`, sorted by key.
    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn set_many(&mut self, entries: &[(String, String)]) -> Result<(), StorageError> {
        (**self).set_many(entries)
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, StorageError> {
        (**self).scan_prefix(prefix)
    }
}

/// Read and parse a value, treating absent, unreadable and unparsable
/// entries alike as missing.
pub(crate) fn read_parsed<S, T>(store: &S, key: &str) -> Option<T>
where
    S: KeyValueStore + ?Sized,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match store.get(key) {
        Ok(Some(raw)) => match raw.trim().parse::<T>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, value = %raw, error = %e, "ignoring corrupt stored value");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read stored value");
            None
        }
    }
}
