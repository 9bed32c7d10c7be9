//! Finds the most recently modified document in a folder.

use log::debug;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// Returns the file directly inside `folder` whose extension matches
/// `extension` and whose modification time is the latest, or `None` if no
/// file matches. The extension comparison is case-insensitive and ignores a
/// leading `.`. Files with equal modification times are ordered by file name;
/// the lexicographically greatest wins. Office lock files (`~$...`) are
/// ignored.
pub fn most_recent(folder: &Path, extension: &str) -> Result<Option<PathBuf>> {
    let extension = extension.trim_start_matches('.');
    let mut best: Option<(SystemTime, PathBuf)> = None;

    for result in WalkDir::new(folder).min_depth(1).max_depth(1) {
        let entry = result?;
        if !entry.file_type().is_file() || !is_candidate(entry.path(), extension) {
            continue;
        }
        let modified = entry.metadata()?.modified().map_err(|err| Error::Io {
            path: entry.path().to_owned(),
            err,
        })?;
        debug!("candidate `{}` modified {:?}", entry.path().display(), modified);

        let newer = match &best {
            None => true,
            Some((time, path)) => {
                (modified, entry.file_name()) > (*time, path.file_name().unwrap_or_default())
            }
        };
        if newer {
            best = Some((modified, entry.into_path()));
        }
    }

    Ok(best.map(|(_, path)| path))
}

fn is_candidate(path: &Path, extension: &str) -> bool {
    let is_lock_file = path
        .file_name()
        .and_then(|name| name.to_str())
        .map_or(false, |name| name.starts_with("~$"));
    !is_lock_file
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case(extension))
}

/// The result of a locate operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error scanning the document folder.
#[derive(Debug)]
pub enum Error {
    /// Returned when the folder can't be walked (e.g., it doesn't exist).
    WalkDir(walkdir::Error),

    /// Returned when a candidate's modification time is unavailable.
    Io { path: PathBuf, err: std::io::Error },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::WalkDir(err) => write!(f, "Scanning document folder: {}", err),
            Error::Io { path, err } => {
                write!(f, "Reading modification time of '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::WalkDir(err) => Some(err),
            Error::Io { path: _, err } => Some(err),
        }
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible directory walks.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}
