//! Document persistence.
//!
//! The engine treats persistence as a collaborator: it hands a
//! [`DocumentSnapshot`] to a [`DocumentStore`] and reads one back. Two
//! backends ship with the crate: in-memory (always available) and an atomic
//! JSON file.

use std::cell::RefCell;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::record::DocumentSnapshot;

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur during document storage operations.
#[derive(Debug)]
pub enum StoreError {
    /// I/O error during file operations.
    Io(io::Error),
    /// Failed to encode a snapshot.
    Serialization(String),
    /// Stored document is corrupted or in an invalid format.
    Corruption(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "I/O error: {e}"),
            StoreError::Serialization(msg) => write!(f, "serialization error: {msg}"),
            StoreError::Corruption(msg) => write!(f, "document corruption: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            StoreError::Serialization(_) | StoreError::Corruption(_) => None,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        StoreError::Io(e)
    }
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

// ─────────────────────────────────────────────────────────────────────────────
// Store Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Pluggable document storage backend.
///
/// - `load` returns `Ok(None)` when no document exists (first run).
/// - `save` replaces the stored document wholesale and should be atomic.
/// - `clear` removes the stored document.
pub trait DocumentStore {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Load the stored document, if any.
    fn load(&self) -> StoreResult<Option<DocumentSnapshot>>;

    /// Persist a document, replacing any previous one.
    fn save(&self, snapshot: &DocumentSnapshot) -> StoreResult<()>;

    /// Remove the stored document.
    fn clear(&self) -> StoreResult<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory Store (always available)
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory store for testing and ephemeral documents.
#[derive(Default)]
pub struct MemoryStore {
    slot: RefCell<Option<DocumentSnapshot>>,
}

impl MemoryStore {
    /// Create an empty memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory store pre-populated with a document.
    #[must_use]
    pub fn with_snapshot(snapshot: DocumentSnapshot) -> Self {
        Self {
            slot: RefCell::new(Some(snapshot)),
        }
    }
}

impl DocumentStore for MemoryStore {
    fn name(&self) -> &str {
        "MemoryStore"
    }

    fn load(&self) -> StoreResult<Option<DocumentSnapshot>> {
        Ok(self.slot.borrow().clone())
    }

    fn save(&self, snapshot: &DocumentSnapshot) -> StoreResult<()> {
        *self.slot.borrow_mut() = Some(snapshot.clone());
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        *self.slot.borrow_mut() = None;
        Ok(())
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("occupied", &self.slot.borrow().is_some())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// JSON File Store
// ─────────────────────────────────────────────────────────────────────────────

/// JSON file store with atomic write-then-rename saves.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store persisting to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the stored document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl DocumentStore for JsonFileStore {
    fn name(&self) -> &str {
        "JsonFileStore"
    }

    fn load(&self) -> StoreResult<Option<DocumentSnapshot>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snapshot = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Corruption(e.to_string()))?;
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &DocumentSnapshot) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let tmp = self.temp_path();
        fs::write(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
