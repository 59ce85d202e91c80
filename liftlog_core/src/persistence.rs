//! Durable storage for the state document.
//!
//! The state lives as one JSON document under a fixed key. Storage is
//! best-effort: loads fall back to defaults and failed writes are logged,
//! never surfaced to the caller.

use crate::defaults::STORAGE_KEY;
use crate::migrate::migrate;
use crate::{AppState, Error, Result};
use fs2::FileExt;
use serde_json::Value;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Key/value slot holding the serialized state
pub trait StateStorage {
    /// Read the stored document, `None` when nothing has been stored
    fn read(&self) -> Result<Option<String>>;

    fn write(&mut self, contents: &str) -> Result<()>;

    /// Remove the stored document
    fn clear(&mut self) -> Result<()>;
}

// ============================================================================
// File storage
// ============================================================================

/// State document stored as a single file with advisory locking
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage for the current schema key inside a data directory
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(file_name_for_key(STORAGE_KEY)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// File name for a storage key (`workout-tracker:v3` -> `workout-tracker-v3.json`)
fn file_name_for_key(key: &str) -> String {
    let stem: String = key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    format!("{}.json", stem)
}

impl StateStorage for FileStorage {
    fn read(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        Ok(Some(contents))
    }

    /// Atomically replace the file: temp file, fsync, rename
    fn write(&mut self, contents: &str) -> Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| Error::Other(format!("state path {:?} has no parent", self.path)))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// In-memory storage
// ============================================================================

/// Storage that lives only as long as the value; used by tests and
/// throwaway stores
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    contents: Option<String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Some(contents.into()),
        }
    }

    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

impl StateStorage for MemoryStorage {
    fn read(&self) -> Result<Option<String>> {
        Ok(self.contents.clone())
    }

    fn write(&mut self, contents: &str) -> Result<()> {
        self.contents = Some(contents.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.contents = None;
        Ok(())
    }
}

// ============================================================================
// Load / save
// ============================================================================

/// Load and migrate the stored state
///
/// A missing document, an unreadable file or corrupt JSON all produce the
/// same result as migrating `null`: the defaults.
pub fn load<S: StateStorage + ?Sized>(storage: &S) -> AppState {
    let contents = match storage.read() {
        Ok(Some(contents)) => contents,
        Ok(None) => {
            tracing::info!("No stored state found, using defaults");
            return migrate(&Value::Null);
        }
        Err(e) => {
            tracing::warn!("Unable to read stored state: {}. Using defaults.", e);
            return migrate(&Value::Null);
        }
    };

    match serde_json::from_str::<Value>(&contents) {
        Ok(raw) => {
            let state = migrate(&raw);
            tracing::debug!(
                "Loaded state: {} exercises, {} days, {} logs",
                state.exercises.len(),
                state.plan.days.len(),
                state.logs.len()
            );
            state
        }
        Err(e) => {
            tracing::warn!("Failed to parse stored state: {}. Using defaults.", e);
            migrate(&Value::Null)
        }
    }
}

/// Serialize and store the state; failures are logged and dropped
pub fn save<S: StateStorage + ?Sized>(storage: &mut S, state: &AppState) {
    let contents = match serde_json::to_string(state) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!("Failed to serialize state: {}", e);
            return;
        }
    };

    match storage.write(&contents) {
        Ok(()) => tracing::debug!("Saved state ({} bytes)", contents.len()),
        Err(e) => tracing::warn!("State save failed: {}", e),
    }
}
