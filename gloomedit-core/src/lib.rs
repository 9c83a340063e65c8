use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod campaign;
pub mod character;
pub mod chests;
pub mod deck;
pub mod events;
pub mod graph;
pub mod pattern;
pub mod quests;
pub mod records;
pub mod scenario;

pub use graph::Graph;
pub use pattern::Span;
pub use scenario::ScenarioStatus;

#[derive(Debug, Error)]
pub enum EditError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("{0} could not be located in the save data")]
    NotFound(String),
    #[error("unresolved reference while resolving {0}")]
    UnresolvedReference(String),
    #[error("offset {offset} is out of range for a buffer of {len} bytes")]
    OutOfRange { offset: usize, len: usize },
    #[error("{slot} holds {items} items but has room for only {capacity}")]
    CapacityExceeded {
        slot: String,
        items: usize,
        capacity: usize,
    },
}

pub type Result<T> = std::result::Result<T, EditError>;

/// Owns the raw save-file bytes. Every patch operation resolves its own
/// span against the current buffer and replaces it wholesale, so earlier
/// edits that shift offsets are picked up by later ones for free.
pub struct SaveData {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl SaveData {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let bytes = fs::read(&path)?;
        Ok(SaveData { path, bytes })
    }

    /// Builds a store over an in-memory buffer. Used by tests and by
    /// callers that manage file IO themselves.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        SaveData {
            path: PathBuf::new(),
            bytes,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Writes the current buffer back to the file it was loaded from.
    pub fn save(&self) -> Result<()> {
        fs::write(&self.path, &self.bytes)?;
        Ok(())
    }

    /// Copies the current buffer verbatim to `<path>-backup-<timestamp>`.
    /// Called once per session, before the first mutation.
    pub fn write_backup(&self) -> Result<PathBuf> {
        let stamp = Local::now().format("%Y%m%d-%H%M%S");
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "savegame".to_string());
        name.push_str(&format!("-backup-{stamp}"));
        let backup_path = self.path.with_file_name(name);
        fs::write(&backup_path, &self.bytes)?;
        Ok(backup_path)
    }

    /// Replaces `span` with `new_bytes`, leaving every byte outside the
    /// span untouched. No validation of the replacement content happens
    /// here; structural validity is the caller's responsibility.
    pub fn replace_span(&mut self, span: Span, new_bytes: &[u8]) -> Result<()> {
        if span.start > span.end || span.end > self.bytes.len() {
            return Err(EditError::OutOfRange {
                offset: span.end,
                len: self.bytes.len(),
            });
        }
        let mut out = Vec::with_capacity(self.bytes.len() - span.len() + new_bytes.len());
        out.extend_from_slice(&self.bytes[..span.start]);
        out.extend_from_slice(new_bytes);
        out.extend_from_slice(&self.bytes[span.end..]);
        self.bytes = out;
        Ok(())
    }

    /// Overwrites the 4-byte little-endian integer at `offset`.
    pub fn write_u32(&mut self, offset: usize, value: u32) -> Result<()> {
        records::write_u32(&mut self.bytes, offset, value)
    }

    pub fn read_u32(&self, offset: usize) -> Result<u32> {
        records::read_u32(&self.bytes, offset)
    }
}
