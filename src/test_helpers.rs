//! Shared test utilities for the photo-intake test suite.
//!
//! Provides synthetic image encoders and an isolated on-disk environment
//! (config, catalogs, uploads root, staging directory) rooted in a temp dir.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let env = TestEnv::new();
//! let outcome = env.pipeline().ingest(request).unwrap();
//! assert_eq!(env.output_count("Ali"), 1);
//! assert_eq!(env.staged_count(), 0);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::catalog::Catalogs;
use crate::config::ServiceConfig;
use crate::imaging::ImageBackend;
use crate::ingest::IngestPipeline;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};

// =========================================================================
// Synthetic images
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Encode a gradient JPEG of the given size.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut out = Vec::new();
    JpegEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    out
}

/// Encode a gradient PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    out
}

pub fn write_test_jpeg(path: &Path, width: u32, height: u32) {
    std::fs::write(path, jpeg_bytes(width, height)).unwrap();
}

pub fn write_test_png(path: &Path, width: u32, height: u32) {
    std::fs::write(path, png_bytes(width, height)).unwrap();
}

// =========================================================================
// Isolated environment
// =========================================================================

/// A config whose storage paths all point into a fresh temp directory.
pub struct TestEnv {
    pub tmp: TempDir,
    pub config: ServiceConfig,
    pub catalogs: Catalogs,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let mut config = ServiceConfig::default();
        let public = tmp.path().join("public");
        config.storage.uploads_root = public.join("uploads/fotograflar");
        config.storage.staging_dir = public.join("temp");
        config.storage.data_dir = public.join("data");
        let catalogs = Catalogs::open(&config.storage.data_dir);
        Self {
            tmp,
            config,
            catalogs,
        }
    }

    pub fn uploads_root(&self) -> &Path {
        &self.config.storage.uploads_root
    }

    pub fn staging_dir(&self) -> &Path {
        &self.config.storage.staging_dir
    }

    /// Pipeline with the real codec.
    pub fn pipeline(&self) -> IngestPipeline {
        IngestPipeline::from_config(&self.config, &self.catalogs)
    }

    /// Pipeline with a substitute backend (usually the recording mock).
    pub fn pipeline_with<B: ImageBackend>(&self, backend: B) -> IngestPipeline<B> {
        let real = self.pipeline();
        IngestPipeline::new(
            backend,
            self.config.photo.clone(),
            crate::staging::StagingStore::new(self.staging_dir()),
            real.layout().clone(),
            std::sync::Arc::clone(&self.catalogs.photo_records),
        )
    }

    /// Files currently left in the staging directory.
    pub fn staged_count(&self) -> usize {
        count_files(self.staging_dir())
    }

    /// Files in one owner's output directory.
    pub fn output_count(&self, owner: &str) -> usize {
        count_files(&self.uploads_root().join(owner))
    }
}

fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}
