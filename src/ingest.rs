//! Photo ingestion pipeline.
//!
//! One call to [`IngestPipeline::ingest`] takes an [`UploadRequest`] through
//! these stages:
//!
//! ```text
//! Validating → StagingFiles → Encoding → Cataloging → CleaningUp → Done
//! ```
//!
//! - **Validating**: the [`ValidationGate`] checks the request and every file.
//!   Nothing is written on failure.
//! - **StagingFiles**: each file is written to the staging directory through a
//!   [`StagedBatch`](crate::staging::StagedBatch).
//! - **Encoding**: every staged file is normalized into
//!   `<uploads_root>/<owner>/foto_<suffix>.<ext>` on the rayon pool. Results
//!   keep input order.
//! - **Cataloging**: one [`PhotoRecord`] per file is appended to the shared
//!   photo-records collection.
//! - **CleaningUp**: the staged batch is dropped, deleting every staged file.
//!
//! The request is all-or-nothing. If any file fails to encode, or the catalog
//! write fails, every output this request produced is deleted and nothing is
//! cataloged. The error reported is the first failure in input order. Staged
//! files are deleted on every path, including panics.
//!
//! The pipeline is synchronous; the HTTP layer runs it under
//! `tokio::task::spawn_blocking`.

use crate::catalog::{CatalogError, Catalogs, JsonCollection};
use crate::config::{PhotoStandard, ServiceConfig};
use crate::imaging::{CodecError, ImageBackend, NormalizedPhoto, RustBackend, normalize_photo};
use crate::naming::{output_stem, record_id, unique_suffix};
use crate::staging::{StagingError, StagingStore};
use crate::types::{CatalogEntry, PhotoRecord, UploadRequest};
use crate::validation::{ValidationError, ValidationGate};
use chrono::Utc;
use rayon::prelude::*;
use serde_json::Map;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Pipeline stage, reported with every failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    StagingFiles,
    Encoding,
    Cataloging,
    CleaningUp,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validating => "validating",
            Stage::StagingFiles => "staging files",
            Stage::Encoding => "encoding",
            Stage::Cataloging => "cataloging",
            Stage::CleaningUp => "cleaning up",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum IngestErrorKind {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{filename}: {source}")]
    Codec { filename: String, source: CodecError },
    #[error(transparent)]
    Staging(#[from] StagingError),
    #[error("cannot prepare output directory {}: {source}", path.display())]
    Output { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Coarse failure class, used for HTTP status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Codec,
    Storage,
}

/// A failed ingestion: where it stopped and why.
#[derive(Error, Debug)]
#[error("ingestion failed while {stage}: {kind}")]
pub struct IngestError {
    pub stage: Stage,
    #[source]
    pub kind: IngestErrorKind,
}

impl IngestError {
    fn at(stage: Stage, kind: impl Into<IngestErrorKind>) -> Self {
        Self {
            stage,
            kind: kind.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self.kind {
            IngestErrorKind::Validation(_) => ErrorCategory::Validation,
            IngestErrorKind::Codec { .. } => ErrorCategory::Codec,
            IngestErrorKind::Staging(_)
            | IngestErrorKind::Output { .. }
            | IngestErrorKind::Catalog(_) => ErrorCategory::Storage,
        }
    }
}

/// Successful ingestion: one record per input file, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOutcome {
    pub photos: Vec<PhotoRecord>,
    /// Geometry tag every photo was normalized to.
    pub standard: String,
}

/// Where normalized photos are stored and served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub uploads_root: PathBuf,
    pub public_prefix: String,
}

impl OutputLayout {
    pub fn owner_dir(&self, owner: &str) -> PathBuf {
        self.uploads_root.join(owner)
    }

    /// Serving path: `<public_prefix>/<owner>/<file_name>`.
    pub fn public_path(&self, owner: &str, file_name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.public_prefix.trim_end_matches('/'),
            owner,
            file_name
        )
    }
}

pub struct IngestPipeline<B: ImageBackend = RustBackend> {
    backend: B,
    standard: PhotoStandard,
    staging: StagingStore,
    layout: OutputLayout,
    catalog: Arc<JsonCollection<CatalogEntry>>,
}

impl IngestPipeline<RustBackend> {
    /// Production pipeline writing into the shared photo-records collection.
    pub fn from_config(config: &ServiceConfig, catalogs: &Catalogs) -> Self {
        Self::new(
            RustBackend::new(),
            config.photo.clone(),
            StagingStore::new(&config.storage.staging_dir),
            OutputLayout {
                uploads_root: config.storage.uploads_root.clone(),
                public_prefix: config.storage.public_prefix.clone(),
            },
            Arc::clone(&catalogs.photo_records),
        )
    }
}

impl<B: ImageBackend> IngestPipeline<B> {
    pub fn new(
        backend: B,
        standard: PhotoStandard,
        staging: StagingStore,
        layout: OutputLayout,
        catalog: Arc<JsonCollection<CatalogEntry>>,
    ) -> Self {
        Self {
            backend,
            standard,
            staging,
            layout,
            catalog,
        }
    }

    pub fn standard(&self) -> &PhotoStandard {
        &self.standard
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Validate, normalize, and catalog every file of `request`.
    pub fn ingest(&self, request: UploadRequest) -> Result<IngestOutcome, IngestError> {
        let owner = ValidationGate::new(&self.standard)
            .check_request(&request)
            .map_err(|e| IngestError::at(Stage::Validating, e))?;
        tracing::info!(owner = %owner, files = request.files.len(), "ingesting upload");

        let mut batch = self.staging.batch();
        for file in &request.files {
            batch
                .stage(file)
                .map_err(|e| IngestError::at(Stage::StagingFiles, e))?;
        }

        let owner_dir = self.layout.owner_dir(&owner);
        fs::create_dir_all(&owner_dir).map_err(|source| {
            IngestError::at(
                Stage::Encoding,
                IngestErrorKind::Output {
                    path: owner_dir.clone(),
                    source,
                },
            )
        })?;

        let config = self.standard.normalize_config();
        let encoded: Vec<Result<(String, NormalizedPhoto), CodecError>> = batch
            .files()
            .par_iter()
            .map(|staged| {
                let suffix = unique_suffix();
                normalize_photo(
                    &self.backend,
                    &staged.path,
                    &owner_dir,
                    &output_stem(&suffix),
                    &config,
                )
                .map(|photo| (suffix, photo))
            })
            .collect();

        let produced: Vec<PathBuf> = encoded
            .iter()
            .filter_map(|r| r.as_ref().ok().map(|(_, photo)| photo.path.clone()))
            .collect();

        let mut photos = Vec::with_capacity(encoded.len());
        for (result, file) in encoded.into_iter().zip(&request.files) {
            match result {
                Ok(done) => photos.push(done),
                Err(source) => {
                    remove_outputs(&produced);
                    tracing::warn!(
                        owner = %owner,
                        file = %file.original_name,
                        error = %source,
                        discarded = produced.len(),
                        "encoding failed, request discarded"
                    );
                    return Err(IngestError::at(
                        Stage::Encoding,
                        IngestErrorKind::Codec {
                            filename: file.original_name.clone(),
                            source,
                        },
                    ));
                }
            }
        }

        let tag = self.standard.tag();
        let records: Vec<PhotoRecord> = photos
            .into_iter()
            .zip(&request.files)
            .map(|((suffix, photo), file)| PhotoRecord {
                id: record_id(&suffix),
                original_name: file.original_name.clone(),
                path: self.layout.public_path(&owner, &photo.file_name),
                full_path: absolute(&photo.path),
                file_name: photo.file_name,
                photographer_name: owner.clone(),
                photographer_id: request.owner_id.clone().filter(|id| !id.is_empty()),
                size: photo.result.byte_size,
                width: photo.result.width,
                height: photo.result.height,
                format: photo.result.format,
                uploaded_at: Utc::now(),
                standard: tag.clone(),
                annotations: Map::new(),
            })
            .collect();

        let entries = records.iter().cloned().map(CatalogEntry::from).collect();
        if let Err(e) = self.catalog.append_and_save(entries) {
            remove_outputs(&produced);
            tracing::error!(owner = %owner, error = %e, "catalog write failed, outputs removed");
            return Err(IngestError::at(Stage::Cataloging, e));
        }

        tracing::debug!(stage = %Stage::CleaningUp, staged = batch.len(), "releasing staged files");
        drop(batch);

        tracing::info!(
            owner = %owner,
            photos = records.len(),
            standard = %tag,
            "upload normalized and cataloged"
        );
        Ok(IngestOutcome {
            photos: records,
            standard: tag,
        })
    }
}

fn remove_outputs(paths: &[PathBuf]) {
    for path in paths {
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "could not remove output"),
        }
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
