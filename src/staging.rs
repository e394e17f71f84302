//! Staging store for uploads awaiting normalization.
//!
//! Each incoming file is written under the staging directory with a unique
//! `temp_<suffix>_<name>` name before the codec reads it. A [`StagedBatch`]
//! owns every staged file of one request and deletes them all when dropped,
//! whichever way the request ends.

use crate::naming::{staged_file_name, unique_suffix};
use crate::types::IncomingFile;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StagingError {
    #[error("cannot create staging directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("cannot write staged file {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// A file written to the staging directory, exclusively owned by one
/// ingestion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub path: PathBuf,
    pub original_name: String,
}

#[derive(Debug, Clone)]
pub struct StagingStore {
    dir: PathBuf,
}

impl StagingStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `file` to a fresh staged path. Never overwrites an existing file.
    pub fn stage(&self, file: &IncomingFile) -> Result<StagedFile, StagingError> {
        fs::create_dir_all(&self.dir).map_err(|source| StagingError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let path = self
            .dir
            .join(staged_file_name(&unique_suffix(), &file.original_name));
        let written = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .and_then(|mut out| out.write_all(&file.bytes));

        if let Err(source) = written {
            // On AlreadyExists the file belongs to someone else
            if source.kind() != io::ErrorKind::AlreadyExists {
                let _ = fs::remove_file(&path);
            }
            return Err(StagingError::Write { path, source });
        }

        tracing::debug!(path = %path.display(), bytes = file.bytes.len(), "staged upload");
        Ok(StagedFile {
            path,
            original_name: file.original_name.clone(),
        })
    }

    /// Delete a staged file. Idempotent; failures are logged, never raised.
    pub fn cleanup(&self, staged: &StagedFile) {
        match fs::remove_file(&staged.path) {
            Ok(()) => tracing::debug!(path = %staged.path.display(), "removed staged file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %staged.path.display(), "staged file already gone");
            }
            Err(e) => {
                tracing::warn!(path = %staged.path.display(), error = %e, "could not remove staged file");
            }
        }
    }

    /// Start a batch that cleans up everything staged through it.
    pub fn batch(&self) -> StagedBatch<'_> {
        StagedBatch {
            store: self,
            files: Vec::new(),
        }
    }
}

/// Staged files of one request, removed on drop.
#[derive(Debug)]
pub struct StagedBatch<'a> {
    store: &'a StagingStore,
    files: Vec<StagedFile>,
}

impl StagedBatch<'_> {
    /// Stage `file` and track it for cleanup.
    pub fn stage(&mut self, file: &IncomingFile) -> Result<&StagedFile, StagingError> {
        let staged = self.store.stage(file)?;
        self.files.push(staged);
        Ok(&self.files[self.files.len() - 1])
    }

    pub fn files(&self) -> &[StagedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl Drop for StagedBatch<'_> {
    fn drop(&mut self) {
        for staged in &self.files {
            self.store.cleanup(staged);
        }
    }
}
