//! Expansion of declared path patterns into concrete directories.
//!
//! A pattern is joined to its rule's prefix, cleaned lexically and
//! expanded with single-segment glob semantics: `*` matches within one
//! path segment only. Expansion is lazy; the consumer pulls directories
//! one at a time and may stop early, abandoning the rest of the walk.

use std::fs;
use std::path::{Path, PathBuf};

use normalize_path::NormalizePath;
use tracing::debug;

use super::GatherError;

/// Lazy stream of concrete directories matched by one pattern.
///
/// Yields an `Err` item when the walk fails; callers stop at the first
/// error. Matches that exist but are not directories are skipped.
#[derive(Debug)]
pub(super) struct DirIter {
    inner: glob::Paths,
}

/// Starts expanding `pattern` under `prefix`.
///
/// Fails immediately when the joined pattern is not a valid glob.
pub(super) fn expand(prefix: &str, pattern: &str) -> Result<DirIter, GatherError> {
    let joined = join_cleaned(prefix, pattern);
    debug!(pattern = %joined.display(), "expanding path pattern");

    let inner = glob::glob(&joined.to_string_lossy()).map_err(GatherError::Pattern)?;
    Ok(DirIter { inner })
}

/// Joins non-empty path components and collapses `.`, `..` and redundant
/// separators without touching the filesystem.
fn join_cleaned(prefix: &str, pattern: &str) -> PathBuf {
    let joined = if prefix.is_empty() {
        pattern.to_string()
    } else if pattern.is_empty() {
        prefix.to_string()
    } else {
        format!("{}/{}", prefix, pattern)
    };
    Path::new(&joined).normalize()
}

impl Iterator for DirIter {
    type Item = Result<PathBuf, GatherError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(path) => match fs::metadata(&path) {
                    Ok(meta) if meta.is_dir() => return Some(Ok(path)),
                    Ok(_) => continue,
                    Err(source) => return Some(Err(GatherError::Io { path, source })),
                },
                Err(err) => {
                    let path = err.path().to_path_buf();
                    return Some(Err(GatherError::Io {
                        path,
                        source: err.into_error(),
                    }));
                }
            }
        }
    }
}
