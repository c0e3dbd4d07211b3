//! Abstractions at the collector's outer seams to enable testing and mocking.
//!
//! `FileSystem` lets the collector read control files from the real
//! filesystem or from an in-memory mock. `Accumulator` is the narrow
//! interface of the external record sink.

use std::io;
use std::path::Path;

use crate::model::{FieldMap, TagMap};

/// Abstraction for reading control files.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    ///
    /// # Arguments
    /// * `path` - Path to the file to read
    ///
    /// # Returns
    /// The file contents as a string, or an I/O error if the file cannot be read.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Real filesystem implementation that delegates to `std::fs`.
///
/// Use this in production to read from the actual control-group filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    /// Creates a new `RealFs` instance.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Sink that gathered records are pushed into.
///
/// The collector owns no persistence or transport; everything it
/// produces goes through this one method, one call per record.
pub trait Accumulator {
    /// Accepts one named record.
    fn add_fields(&mut self, measurement: &str, fields: FieldMap, tags: TagMap);
}
