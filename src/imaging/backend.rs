//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the intake pipeline
//! needs from a codec: `identify` and `normalize`.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the pure Rust
//! `image` crate. Tests swap in the recording [`tests::MockBackend`].

use super::params::{NormalizeParams, OutputFormat};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot decode image: {0}")]
    Decode(String),
    #[error("cannot encode image: {0}")]
    Encode(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// What a successful normalize wrote to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalized {
    pub width: u32,
    pub height: u32,
    /// Size of the encoded output file.
    pub byte_size: u64,
    pub format: OutputFormat,
}

/// Trait for image codec backends.
///
/// `Sync` so a single backend can be shared across rayon workers.
pub trait ImageBackend: Sync {
    /// Get image dimensions without decoding pixel data.
    fn identify(&self, path: &Path) -> Result<Dimensions, CodecError>;

    /// Decode `params.source`, cover-crop it to exactly
    /// `params.width x params.height`, and encode it to `params.output`.
    ///
    /// On error no file exists at `params.output`.
    fn normalize(&self, params: &NormalizeParams) -> Result<Normalized, CodecError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::Quality;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Mock backend that records operations instead of touching pixels.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    ///
    /// `normalize` writes a small placeholder file at the output path so
    /// callers can observe (and clean up) outputs. Sources whose file name
    /// contains one of `failing` fail with [`CodecError::Decode`].
    #[derive(Default)]
    pub struct MockBackend {
        pub identify_results: Mutex<Vec<Dimensions>>,
        pub operations: Mutex<Vec<RecordedOp>>,
        pub failing: HashSet<String>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Normalize {
            source: String,
            output: String,
            width: u32,
            height: u32,
            quality: u32,
            format: OutputFormat,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_dimensions(dims: Vec<Dimensions>) -> Self {
            Self {
                identify_results: Mutex::new(dims),
                ..Self::default()
            }
        }

        /// Fail normalization for any source whose name contains `needle`.
        pub fn failing_on(needle: &str) -> Self {
            Self {
                failing: HashSet::from([needle.to_string()]),
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn normalize_count(&self) -> usize {
            self.get_operations()
                .iter()
                .filter(|op| matches!(op, RecordedOp::Normalize { .. }))
                .count()
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<Dimensions, CodecError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(path.to_string_lossy().to_string()));

            self.identify_results
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| CodecError::Decode("No mock dimensions".to_string()))
        }

        fn normalize(&self, params: &NormalizeParams) -> Result<Normalized, CodecError> {
            let source = params.source.to_string_lossy().to_string();
            self.operations.lock().unwrap().push(RecordedOp::Normalize {
                source: source.clone(),
                output: params.output.to_string_lossy().to_string(),
                width: params.width,
                height: params.height,
                quality: params.quality.value(),
                format: params.format,
            });

            if self.failing.iter().any(|needle| source.contains(needle)) {
                return Err(CodecError::Decode(format!("mock failure for {source}")));
            }

            let placeholder = b"mock-image";
            std::fs::write(&params.output, placeholder)?;
            Ok(Normalized {
                width: params.width,
                height: params.height,
                byte_size: placeholder.len() as u64,
                format: params.format,
            })
        }
    }

    fn params(source: &str, output: &Path) -> NormalizeParams {
        NormalizeParams {
            source: source.into(),
            output: output.to_path_buf(),
            width: 240,
            height: 320,
            quality: Quality::new(90),
            format: OutputFormat::Jpeg,
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 800,
            height: 600,
        }]);

        let result = backend.identify(Path::new("/test/image.jpg")).unwrap();
        assert_eq!(result.width, 800);
        assert_eq!(result.height, 600);

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p == "/test/image.jpg"));
    }

    #[test]
    fn mock_records_normalize_and_writes_output() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("foto_1.jpeg");
        let backend = MockBackend::new();

        let result = backend.normalize(&params("/staging/a.jpg", &output)).unwrap();
        assert_eq!((result.width, result.height), (240, 320));
        assert!(output.exists());

        let ops = backend.get_operations();
        assert!(matches!(
            &ops[0],
            RecordedOp::Normalize {
                width: 240,
                height: 320,
                quality: 90,
                format: OutputFormat::Jpeg,
                ..
            }
        ));
    }

    #[test]
    fn mock_failing_source_writes_nothing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("foto_2.jpeg");
        let backend = MockBackend::failing_on("broken");

        let result = backend.normalize(&params("/staging/temp_1_broken.jpg", &output));
        assert!(matches!(result, Err(CodecError::Decode(_))));
        assert!(!output.exists());
        assert_eq!(backend.normalize_count(), 1);
    }
}
