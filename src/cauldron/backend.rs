//! Durable storage for the cauldron document.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::util::fs;

/// Where the serialized cauldron document lives.
pub trait StoreBackend: Send {
    /// The stored document, or `None` when nothing was ever saved.
    fn load(&self) -> Result<Option<String>>;

    /// Replace the stored document. Readers never observe a partial write.
    fn save(&self, content: &str) -> Result<()>;

    /// Human-readable location for messages.
    fn describe(&self) -> String;
}

/// A cauldron document in a local JSON file.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileBackend { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StoreBackend for FileBackend {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&self.path).map(Some)
    }

    fn save(&self, content: &str) -> Result<()> {
        fs::write_atomic(&self.path, content)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
