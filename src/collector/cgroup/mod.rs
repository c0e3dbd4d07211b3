//! Rule-driven collection of control-group statistics.
//!
//! A rule pairs directory path patterns with a list of control file
//! names. Every directory matched by a pattern is visited, the declared
//! files are parsed by layout detection and the results are folded into
//! per-file and per-directory records.

use std::io;
use std::path::PathBuf;

mod collector;
mod expand;
mod format;

pub use collector::{CgroupCollector, Rule};

/// Error type for a gather cycle.
///
/// Any error aborts the remaining work of the cycle. Records already
/// pushed into the sink stay pushed; the sink has no transactions.
#[derive(Debug)]
pub enum GatherError {
    /// A rule declares no usable path or field.
    Config(String),
    /// A path pattern could not be compiled as a glob.
    Pattern(glob::PatternError),
    /// A filesystem stat or read failed.
    Io {
        /// Path the operation failed on.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// A control file matched none of the known layouts.
    UnknownFormat(PathBuf),
}

impl std::fmt::Display for GatherError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatherError::Config(msg) => write!(f, "{}", msg),
            GatherError::Pattern(err) => write!(f, "invalid path pattern: {}", err),
            GatherError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            GatherError::UnknownFormat(path) => {
                write!(f, "{}: unknown file format", path.display())
            }
        }
    }
}

impl std::error::Error for GatherError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GatherError::Pattern(err) => Some(err),
            GatherError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
