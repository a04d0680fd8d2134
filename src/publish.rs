//! Crash-safe file publishing.
//!
//! A published file is never written in place. The final bytes go to a
//! temporary file in the destination's directory, are flushed to disk, and
//! only then renamed over the destination:
//!
//! ```text
//! photo.jpg               ← untouched until the rename
//! .photo.jpg.XXXXXX.tmp   ← staged bytes, removed if never committed
//! ```
//!
//! Staging and committing are separate steps ([`stage`], [`StagedFile::commit`])
//! so an interruption between them can be exercised directly. Dropping an
//! uncommitted [`StagedFile`] deletes the temporary file.
//!
//! Backups for in-place edits live beside the original as
//! `<name>.<ext>.backup` and are created at most once. They go through the
//! same staging: the copy is synced under a temporary name and then linked
//! into place only if no backup exists yet, so a `.backup` file is always a
//! complete copy.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to move staged file into {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Destination has no parent directory: {0}")]
    NoParent(PathBuf),
    #[error("{destination} was already published from {first} in this run")]
    Collision { destination: PathBuf, first: PathBuf },
}

/// Bytes written to a temporary file beside their destination, not yet visible.
#[derive(Debug)]
pub struct StagedFile {
    temp: NamedTempFile,
    destination: PathBuf,
}

impl StagedFile {
    /// Path of the temporary file holding the staged bytes.
    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Atomically rename the staged file over the destination.
    ///
    /// On failure the temporary file is removed and the destination is left
    /// as it was.
    pub fn commit(self) -> Result<PathBuf, PublishError> {
        let Self { temp, destination } = self;
        temp.persist(&destination)
            .map_err(|e| PublishError::Persist {
                path: destination.clone(),
                source: e.error,
            })?;
        Ok(destination)
    }

    /// Move the staged file to the destination only if nothing is there yet.
    ///
    /// Returns `false`, and discards the staged bytes, when the destination
    /// already exists.
    pub fn commit_if_absent(self) -> Result<bool, PublishError> {
        let Self { temp, destination } = self;
        match temp.persist_noclobber(&destination) {
            Ok(_) => Ok(true),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(PublishError::Persist {
                path: destination,
                source: e.error,
            }),
        }
    }
}

/// Empty temporary file in `destination`'s directory, named after it.
fn temp_beside(destination: &Path) -> Result<NamedTempFile, PublishError> {
    let dir = match destination.parent() {
        Some(p) if p.as_os_str().is_empty() => Path::new("."),
        Some(p) => p,
        None => return Err(PublishError::NoParent(destination.to_path_buf())),
    };
    let prefix = format!(
        ".{}.",
        destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    );

    Ok(tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(dir)?)
}

/// Write `bytes` to a temporary file in `destination`'s directory and sync it.
pub fn stage(destination: &Path, bytes: &[u8]) -> Result<StagedFile, PublishError> {
    let mut temp = temp_beside(destination)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;

    Ok(StagedFile {
        temp,
        destination: destination.to_path_buf(),
    })
}

/// Copy the file at `source` into a temporary file beside `destination` and
/// sync it.
pub fn stage_copy(source: &Path, destination: &Path) -> Result<StagedFile, PublishError> {
    let mut original = File::open(source)?;
    let mut temp = temp_beside(destination)?;
    io::copy(&mut original, &mut temp)?;
    temp.as_file().sync_all()?;

    Ok(StagedFile {
        temp,
        destination: destination.to_path_buf(),
    })
}

/// Stage and commit in one step.
pub fn publish(destination: &Path, bytes: &[u8]) -> Result<PathBuf, PublishError> {
    stage(destination, bytes)?.commit()
}

/// Sibling path used to preserve an original: `photo.jpg` → `photo.jpg.backup`.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".backup");
    PathBuf::from(name)
}

/// Whether [`ensure_backup`] made a new copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupStatus {
    Created,
    AlreadyPresent,
}

/// Copy `path` to its backup sibling unless a backup already exists.
///
/// An existing backup is never overwritten, so repeated runs keep the
/// first original. The backup only appears once the full copy is on disk.
pub fn ensure_backup(path: &Path) -> Result<BackupStatus, PublishError> {
    let backup = backup_path(path);
    if backup.exists() {
        return Ok(BackupStatus::AlreadyPresent);
    }
    if stage_copy(path, &backup)?.commit_if_absent()? {
        Ok(BackupStatus::Created)
    } else {
        Ok(BackupStatus::AlreadyPresent)
    }
}
