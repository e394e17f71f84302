//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take configuration, compute parameters, and call the backend.

use super::backend::{CodecError, ImageBackend, Normalized};
use super::params::{NormalizeParams, OutputFormat, Quality};
use std::path::{Path, PathBuf};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// Target geometry and encoding for normalized photos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeConfig {
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
    pub format: OutputFormat,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            width: 240,
            height: 320,
            quality: Quality::default(),
            format: OutputFormat::Jpeg,
        }
    }
}

/// A normalized photo written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPhoto {
    pub file_name: String,
    pub path: PathBuf,
    pub result: Normalized,
}

/// Output file name for a normalized photo: `<stem>.<ext>`.
pub fn output_file_name(filename_stem: &str, format: OutputFormat) -> String {
    format!("{}.{}", filename_stem, format.extension())
}

/// Plan a normalize operation without executing it.
///
/// Useful for testing parameter generation.
pub fn plan_normalize(source: &Path, output_path: &Path, config: &NormalizeConfig) -> NormalizeParams {
    NormalizeParams {
        source: source.to_path_buf(),
        output: output_path.to_path_buf(),
        width: config.width,
        height: config.height,
        quality: config.quality,
        format: config.format,
    }
}

/// Normalize `source` into `output_dir/<stem>.<ext>`.
///
/// Cover-crops to the configured geometry and encodes in the configured format.
pub fn normalize_photo(
    backend: &impl ImageBackend,
    source: &Path,
    output_dir: &Path,
    filename_stem: &str,
    config: &NormalizeConfig,
) -> Result<NormalizedPhoto> {
    let file_name = output_file_name(filename_stem, config.format);
    let path = output_dir.join(&file_name);

    let params = plan_normalize(source, &path, config);
    let result = backend.normalize(&params)?;

    Ok(NormalizedPhoto {
        file_name,
        path,
        result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Dimensions;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};

    #[test]
    fn get_dimensions_calls_backend() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 1920,
            height: 1080,
        }]);

        let dims = get_dimensions(&backend, Path::new("/test.jpg")).unwrap();
        assert_eq!(dims, (1920, 1080));
    }

    #[test]
    fn plan_normalize_uses_configured_geometry() {
        let params = plan_normalize(
            Path::new("/staging/temp_1_a.jpg"),
            Path::new("/out/foto_1.jpeg"),
            &NormalizeConfig::default(),
        );

        assert_eq!((params.width, params.height), (240, 320));
        assert_eq!(params.quality.value(), 90);
        assert_eq!(params.format, OutputFormat::Jpeg);
    }

    #[test]
    fn output_file_name_follows_format() {
        assert_eq!(output_file_name("foto_1-2", OutputFormat::Jpeg), "foto_1-2.jpeg");
        assert_eq!(output_file_name("foto_1-2", OutputFormat::Webp), "foto_1-2.webp");
    }

    #[test]
    fn normalize_photo_uses_backend() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = MockBackend::new();
        let config = NormalizeConfig {
            format: OutputFormat::Png,
            quality: Quality::new(70),
            ..NormalizeConfig::default()
        };

        let photo = normalize_photo(
            &backend,
            Path::new("/staging/temp_1_a.jpg"),
            tmp.path(),
            "foto_1",
            &config,
        )
        .unwrap();

        assert_eq!(photo.file_name, "foto_1.png");
        assert_eq!(photo.path, tmp.path().join("foto_1.png"));
        assert_eq!((photo.result.width, photo.result.height), (240, 320));

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            RecordedOp::Normalize { output, quality: 70, format: OutputFormat::Png, .. }
                if output.ends_with("foto_1.png")
        ));
    }

    #[test]
    fn normalize_photo_propagates_codec_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = MockBackend::failing_on("bad");

        let result = normalize_photo(
            &backend,
            Path::new("/staging/temp_1_bad.jpg"),
            tmp.path(),
            "foto_1",
            &NormalizeConfig::default(),
        );
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }
}
