//! Photo upload and listing of stored photos.
//!
//! The upload handler reads the multipart body part by part. Format is
//! checked as soon as a file part's headers arrive and size while its chunks
//! stream in, so an oversized or mistyped file is refused before the rest of
//! the body is read. An owner field sent ahead of the files is checked on
//! arrival, before any file part is looked at. The full request then goes through the ingestion
//! pipeline on the blocking pool, which re-validates everything.

use super::blocking;
use crate::ingest::IngestOutcome;
use crate::naming::owner_dir_problem;
use crate::server::error::ApiError;
use crate::server::state::AppState;
use crate::types::{IncomingFile, PhotoRecord, UploadRequest};
use crate::validation::{ValidationError, ValidationGate};
use axum::Json;
use axum::extract::{Multipart, Path, State};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use walkdir::WalkDir;

const OWNER_FIELD: &str = "photographerName";
const OWNER_ID_FIELD: &str = "photographerId";
const FILES_FIELD: &str = "photos";

/// Extensions listed by `/api/uploaded-photos`.
const LISTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    success: bool,
    message: String,
    photos: Vec<PhotoRecord>,
    standard: String,
}

impl From<IngestOutcome> for UploadResponse {
    fn from(outcome: IngestOutcome) -> Self {
        Self {
            success: true,
            message: format!(
                "{} photos uploaded and normalized to {}",
                outcome.photos.len(),
                outcome.standard
            ),
            photos: outcome.photos,
            standard: outcome.standard,
        }
    }
}

async fn read_upload(state: &AppState, mut multipart: Multipart) -> Result<UploadRequest, ApiError> {
    let gate = ValidationGate::new(state.pipeline.standard());
    let max_files = state.pipeline.standard().max_files_per_request;

    let mut owner_name = String::new();
    let mut owner_id = None;
    let mut files = Vec::new();

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            OWNER_FIELD => {
                owner_name = field.text().await?;
                gate.check_owner(&owner_name)?;
            }
            OWNER_ID_FIELD => owner_id = Some(field.text().await?),
            FILES_FIELD => {
                if files.len() == max_files {
                    return Err(ValidationError::TooManyFiles {
                        count: files.len() + 1,
                        max: max_files,
                    }
                    .into());
                }
                let original_name = field.file_name().unwrap_or("upload").to_string();
                let media_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                gate.check_format(&original_name, &media_type)?;

                let mut bytes = Vec::new();
                while let Some(chunk) = field.chunk().await? {
                    bytes.extend_from_slice(&chunk);
                    gate.check_size(&original_name, bytes.len() as u64)?;
                }
                files.push(IncomingFile::new(original_name, media_type, bytes));
            }
            other => tracing::debug!(field = other, "ignoring unknown multipart field"),
        }
    }

    Ok(UploadRequest {
        owner_name,
        owner_id,
        files,
    })
}

/// `POST /api/upload-photos`: multipart `photographerName`, optional
/// `photographerId`, and one or more `photos` parts.
pub async fn upload_photos(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let request = read_upload(&state, multipart).await?;
    tracing::debug!(owner = %request.owner_name, files = request.files.len(), "upload received");

    let pipeline = Arc::clone(&state.pipeline);
    let outcome = blocking(move || Ok(pipeline.ingest(request)?)).await?;
    Ok(Json(outcome.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPhoto {
    pub file_name: String,
    /// Absolute URL built from `server.public_url`.
    pub url: String,
    /// Serving path under the public prefix.
    pub path: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPhotosResponse {
    success: bool,
    count: usize,
    photos: Vec<StoredPhoto>,
    photographer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

/// Image file names directly inside `dir`, sorted.
fn list_images(dir: &std::path::Path) -> Result<Vec<String>, walkdir::Error> {
    let mut names = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let listed = crate::naming::file_extension(&name)
            .is_some_and(|ext| LISTED_EXTENSIONS.contains(&ext.as_str()));
        if listed {
            names.push(name);
        }
    }
    Ok(names)
}

/// `GET /api/uploaded-photos/{photographerName}`: files actually on disk in
/// the owner's directory, whether or not they are cataloged.
pub async fn uploaded_photos(
    State(state): State<AppState>,
    Path(photographer_name): Path<String>,
) -> Result<Json<StoredPhotosResponse>, ApiError> {
    if let Some(reason) = owner_dir_problem(&photographer_name) {
        return Err(ValidationError::InvalidOwner {
            name: photographer_name,
            reason,
        }
        .into());
    }

    let layout = state.pipeline.layout().clone();
    let dir: PathBuf = layout.owner_dir(&photographer_name);
    if !dir.is_dir() {
        return Ok(Json(StoredPhotosResponse {
            success: true,
            count: 0,
            photos: Vec::new(),
            photographer_name,
            message: Some("No uploaded photos found for this photographer"),
        }));
    }

    let names = blocking(move || {
        list_images(&dir).map_err(|e| ApiError::internal("Could not list photos", e))
    })
    .await?;

    let public_url = state.config.server.public_url.trim_end_matches('/');
    let encoded_owner = urlencoding::encode(&photographer_name);
    let photos: Vec<StoredPhoto> = names
        .into_iter()
        .map(|file_name| {
            let prefix = layout.public_prefix.trim_end_matches('/');
            StoredPhoto {
                url: format!("{public_url}{prefix}/{encoded_owner}/{file_name}"),
                path: layout.public_path(&photographer_name, &file_name),
                file_name,
            }
        })
        .collect();

    Ok(Json(StoredPhotosResponse {
        success: true,
        count: photos.len(),
        photos,
        photographer_name,
        message: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn list_images_filters_and_sorts() {
        let tmp = TempDir::new().unwrap();
        for name in ["b.jpeg", "a.PNG", "notes.txt", "c.webp", ".hidden"] {
            fs::write(tmp.path().join(name), b"x").unwrap();
        }
        fs::create_dir(tmp.path().join("sub.jpg")).unwrap();
        fs::write(tmp.path().join("sub.jpg/inner.jpg"), b"x").unwrap();

        let names = list_images(tmp.path()).unwrap();
        assert_eq!(names, vec!["a.PNG", "b.jpeg", "c.webp"]);
    }
}
