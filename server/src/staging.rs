//! Two-phase file writes.
//!
//! A [`StagedFile`] is written under a hidden temporary name inside its
//! destination directory and only renamed to its final name by
//! [`StagedFile::commit`]. Dropping an uncommitted stage removes the
//! temporary file, so a failed publish leaves nothing behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};
use thiserror::Error;

/// Name prefix of files that are staged but not yet committed.
pub const STAGING_PREFIX: &str = ".staging-";

#[derive(Error, Debug)]
pub enum StageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to move staged file into place: {0}")]
    Persist(#[from] tempfile::PersistError),
}

#[derive(Debug)]
pub struct StagedFile {
    temp: NamedTempFile,
    dest: PathBuf,
}

impl StagedFile {
    /// Writes `contents` next to `dir/file_name`, creating `dir` if needed.
    pub fn write(dir: &Path, file_name: &str, contents: &[u8]) -> Result<Self, StageError> {
        fs::create_dir_all(dir)?;

        let mut temp = Builder::new().prefix(STAGING_PREFIX).tempfile_in(dir)?;
        temp.write_all(contents)?;
        temp.as_file().sync_all()?;

        Ok(StagedFile {
            temp,
            dest: dir.join(file_name),
        })
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Renames the staged file to its destination, replacing any file there.
    pub fn commit(self) -> Result<PathBuf, StageError> {
        self.temp.persist(&self.dest)?;
        Ok(self.dest)
    }
}

/// Commits every stage in order. If one fails, the files already moved into
/// place by this call are removed again before the error is returned.
pub fn commit_all(stages: Vec<StagedFile>) -> Result<Vec<PathBuf>, StageError> {
    let mut committed = Vec::with_capacity(stages.len());
    for stage in stages {
        match stage.commit() {
            Ok(path) => committed.push(path),
            Err(e) => {
                remove_all(&committed);
                return Err(e);
            }
        }
    }
    Ok(committed)
}

/// Best-effort removal of already committed files.
pub fn remove_all(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = fs::remove_file(path) {
            tracing::warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}

/// Removes staged files a previous process left behind when it stopped
/// between staging and commit. A missing `dir` counts as empty.
pub fn sweep(dir: &Path) -> Result<usize, StageError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut removed = 0;
    for entry in entries {
        let entry = entry?;
        let stale = entry.file_name().to_string_lossy().starts_with(STAGING_PREFIX);
        if stale && entry.file_type()?.is_file() {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}
