//! Upload validation gate.
//!
//! Runs before anything touches disk. Request-level checks come first, in
//! this order: owner name present, owner name usable as a directory, at least
//! one file, not too many files. Then every file is checked for an accepted
//! extension, an accepted declared media type, and a size within bounds.
//!
//! The gate is all-or-nothing: the first failing check rejects the whole
//! request.

use crate::config::PhotoStandard;
use crate::naming::{file_extension, owner_dir_problem};
use crate::types::{IncomingFile, UploadRequest};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("photographer name is required")]
    MissingOwner,
    #[error("photographer name '{name}' {reason}")]
    InvalidOwner { name: String, reason: &'static str },
    #[error("no photos selected")]
    NoFiles,
    #[error("{count} files sent, at most {max} allowed per request")]
    TooManyFiles { count: usize, max: usize },
    #[error("{filename}: only {} formats are accepted", .accepted.join(", "))]
    UnsupportedFormat {
        filename: String,
        /// Accepted formats, uppercased for display.
        accepted: Vec<String>,
    },
    #[error("{filename}: {size} bytes exceeds the {max} byte limit")]
    FileTooLarge { filename: String, size: u64, max: u64 },
    #[error("{filename}: file is empty")]
    EmptyFile { filename: String },
}

impl ValidationError {
    /// Whether this rejection is about payload size (mapped to 413 over HTTP).
    pub fn is_too_large(&self) -> bool {
        matches!(self, ValidationError::FileTooLarge { .. })
    }
}

/// Checks uploads against a [`PhotoStandard`].
#[derive(Debug, Clone)]
pub struct ValidationGate<'a> {
    standard: &'a PhotoStandard,
}

impl<'a> ValidationGate<'a> {
    pub fn new(standard: &'a PhotoStandard) -> Self {
        Self { standard }
    }

    /// Validate a whole request. Returns the trimmed owner name on success.
    pub fn check_request(&self, request: &UploadRequest) -> Result<String, ValidationError> {
        let owner = self.check_owner(&request.owner_name)?;
        self.check_file_count(request.files.len())?;
        for file in &request.files {
            self.check_file(file)?;
        }
        Ok(owner)
    }

    pub fn check_owner(&self, name: &str) -> Result<String, ValidationError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingOwner);
        }
        if let Some(reason) = owner_dir_problem(trimmed) {
            return Err(ValidationError::InvalidOwner {
                name: trimmed.to_string(),
                reason,
            });
        }
        Ok(trimmed.to_string())
    }

    pub fn check_file_count(&self, count: usize) -> Result<(), ValidationError> {
        if count == 0 {
            return Err(ValidationError::NoFiles);
        }
        let max = self.standard.max_files_per_request;
        if count > max {
            return Err(ValidationError::TooManyFiles { count, max });
        }
        Ok(())
    }

    /// Format check only: extension AND declared media type must both be allowed.
    pub fn check_format(&self, filename: &str, media_type: &str) -> Result<(), ValidationError> {
        let ext_ok = file_extension(filename).is_some_and(|ext| {
            self.standard
                .allowed_extensions
                .iter()
                .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(&ext))
        });
        let media_type = media_type.split(';').next().unwrap_or_default().trim();
        let type_ok = self
            .standard
            .allowed_media_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(media_type));

        if ext_ok && type_ok {
            Ok(())
        } else {
            Err(ValidationError::UnsupportedFormat {
                filename: filename.to_string(),
                accepted: self.accepted_formats(),
            })
        }
    }

    /// Size check against the per-file bound.
    pub fn check_size(&self, filename: &str, size: u64) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile {
                filename: filename.to_string(),
            });
        }
        let max = self.standard.max_file_size;
        if size > max {
            return Err(ValidationError::FileTooLarge {
                filename: filename.to_string(),
                size,
                max,
            });
        }
        Ok(())
    }

    pub fn check_file(&self, file: &IncomingFile) -> Result<(), ValidationError> {
        self.check_format(&file.original_name, &file.media_type)?;
        self.check_size(&file.original_name, file.size())
    }

    fn accepted_formats(&self) -> Vec<String> {
        self.standard
            .allowed_extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_ascii_uppercase())
            .collect()
    }
}

/// Media type implied by a file extension, for callers that have a path but
/// no declared type (the `ingest` CLI command).
pub fn media_type_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}
