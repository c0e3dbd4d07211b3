//! In-memory mock filesystem for testing collectors.
//!
//! This module provides `MockFs` which simulates control file trees in
//! memory, allowing collector tests to run without a real control-group
//! filesystem.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use crate::collector::traits::FileSystem;

/// In-memory filesystem for testing.
///
/// Stores file contents keyed by path, allowing tests to simulate
/// various control-group states without touching the real filesystem.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    /// Map from path to file contents.
    files: HashMap<PathBuf, String>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        self.files.insert(path.as_ref().to_path_buf(), content.into());
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }
}
