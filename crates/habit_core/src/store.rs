use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::{entry::Entry, habit::Habit};

pub const HABITS_KEY: &str = "habits";
pub const ENTRIES_KEY: &str = "habitEntries";
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io failure: {0}")]
    Io(#[from] io::Error),
    #[error("storage encode failure: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Key-value persistence for the tracker collections.
///
/// Each key maps to one JSON document under the data directory, and every
/// save rewrites the complete collection. A missing key reads as empty; an
/// undecodable payload is discarded with a warning instead of aborting
/// startup.
#[derive(Debug, Clone)]
pub struct HabitStore {
    root: PathBuf,
}

impl HabitStore {
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn load(&self) -> StoreResult<(Vec<Habit>, Vec<Entry>)> {
        Ok((self.read_key(HABITS_KEY)?, self.read_key(ENTRIES_KEY)?))
    }

    pub fn save_habits(&self, habits: &[Habit]) -> StoreResult<()> {
        self.write_key(HABITS_KEY, habits)
    }

    pub fn save_entries(&self, entries: &[Entry]) -> StoreResult<()> {
        self.write_key(ENTRIES_KEY, entries)
    }

    pub fn load_theme(&self) -> StoreResult<Option<String>> {
        self.read_key(THEME_KEY)
    }

    pub fn save_theme(&self, theme: &str) -> StoreResult<()> {
        self.write_key(THEME_KEY, theme)
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    fn read_key<T: DeserializeOwned + Default>(&self, key: &str) -> StoreResult<T> {
        let path = self.key_path(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
            Err(err) => return Err(err.into()),
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!(key, %err, "discarding undecodable stored value");
                Ok(T::default())
            }
        }
    }

    fn write_key<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StoreResult<()> {
        let payload = serde_json::to_string_pretty(value)?;
        fs::write(self.key_path(key), payload)?;
        Ok(())
    }
}
