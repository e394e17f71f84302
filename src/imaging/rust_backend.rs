//! Pure Rust codec backend built on the `image` crate.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG, WebP) | `image` crate, format guessed from content |
//! | Center crop (source pixels) | `DynamicImage::crop_imm` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `JpegEncoder::new_with_quality` (RGB8) |
//! | Encode → PNG | `PngEncoder` |
//! | Encode → WebP | `WebPEncoder::new_lossless` |
//!
//! Decoding is bounded by [`MAX_SOURCE_SIDE`] and [`MAX_DECODE_ALLOC`], so a
//! small file declaring huge dimensions is refused before its pixels are
//! allocated.

use super::backend::{CodecError, Dimensions, ImageBackend, Normalized};
use super::calculations::calculate_cover_crop;
use super::params::{NormalizeParams, OutputFormat};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, Limits};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Largest accepted source width or height, in pixels.
pub const MAX_SOURCE_SIDE: u32 = 12_000;

/// Largest buffer the decoder may allocate for one image.
pub const MAX_DECODE_ALLOC: u64 = 256 * 1024 * 1024;

fn decode_limits() -> Limits {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_SOURCE_SIDE);
    limits.max_image_height = Some(MAX_SOURCE_SIDE);
    limits.max_alloc = Some(MAX_DECODE_ALLOC);
    limits
}

/// Load and decode an image from disk, sniffing the format from its bytes.
fn load_image(path: &Path) -> Result<DynamicImage, CodecError> {
    let mut reader = ImageReader::open(path)?.with_guessed_format()?;
    reader.limits(decode_limits());
    let img = reader
        .decode()
        .map_err(|e| CodecError::Decode(format!("{}: {}", path.display(), e)))?;

    if img.width() == 0 || img.height() == 0 {
        return Err(CodecError::Decode(format!(
            "{}: image has zero dimensions",
            path.display()
        )));
    }
    Ok(img)
}

/// Center-crop to the target aspect, then scale to exactly `width x height`.
fn cover_crop(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    let plan = calculate_cover_crop((img.width(), img.height()), (width, height));
    img.crop_imm(plan.x, plan.y, plan.crop_width, plan.crop_height)
        .resize_exact(plan.width, plan.height, FilterType::Lanczos3)
}

fn encode<W: Write>(
    img: &DynamicImage,
    writer: W,
    format: OutputFormat,
    quality: u8,
) -> Result<(), CodecError> {
    let result = match format {
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(writer, quality))
        }
        OutputFormat::Png => img.write_with_encoder(PngEncoder::new(writer)),
        OutputFormat::Webp => {
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            rgba.write_with_encoder(WebPEncoder::new_lossless(writer))
        }
    };
    result.map_err(|e| CodecError::Encode(format!("{format} encode failed: {e}")))
}

/// Hidden sibling used while the output is being written.
fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.partial"))
}

/// Encode into a temporary sibling, then rename into place.
///
/// The temporary file is removed on any failure.
fn save_atomic(
    img: &DynamicImage,
    path: &Path,
    format: OutputFormat,
    quality: u8,
) -> Result<(), CodecError> {
    let tmp = temp_sibling(path);
    let written = (|| {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        encode(img, &mut writer, format, quality)?;
        writer.flush()?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    })();

    if written.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    written
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, CodecError> {
        let (width, height) = ImageReader::open(path)?
            .with_guessed_format()?
            .into_dimensions()
            .map_err(|e| CodecError::Decode(format!("{}: {}", path.display(), e)))?;
        Ok(Dimensions { width, height })
    }

    fn normalize(&self, params: &NormalizeParams) -> Result<Normalized, CodecError> {
        let img = load_image(&params.source)?;
        let cropped = cover_crop(&img, params.width, params.height);

        let quality = params.quality.value() as u8;
        save_atomic(&cropped, &params.output, params.format, quality)?;

        let byte_size = std::fs::metadata(&params.output)?.len();
        Ok(Normalized {
            width: cropped.width(),
            height: cropped.height(),
            byte_size,
            format: params.format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::Quality;
    use crate::test_helpers::{write_test_jpeg, write_test_png};

    fn params(source: PathBuf, output: PathBuf, format: OutputFormat) -> NormalizeParams {
        NormalizeParams {
            source,
            output,
            width: 240,
            height: 320,
            quality: Quality::new(90),
            format,
        }
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        write_test_jpeg(&path, 200, 150);

        let backend = RustBackend::new();
        let dims = backend.identify(&path).unwrap();
        assert_eq!(dims.width, 200);
        assert_eq!(dims.height, 150);
    }

    #[test]
    fn identify_nonexistent_file_errors() {
        let backend = RustBackend::new();
        let result = backend.identify(Path::new("/nonexistent/image.jpg"));
        assert!(matches!(result, Err(CodecError::Io(_))));
    }

    #[test]
    fn identify_ignores_misleading_extension() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("actually_png.jpg");
        write_test_png(&path, 64, 48);

        let dims = RustBackend::new().identify(&path).unwrap();
        assert_eq!((dims.width, dims.height), (64, 48));
    }

    #[test]
    fn normalize_landscape_jpeg_to_print_tile() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        write_test_jpeg(&source, 800, 600);
        let output = tmp.path().join("foto_1.jpeg");

        let backend = RustBackend::new();
        let result = backend
            .normalize(&params(source, output.clone(), OutputFormat::Jpeg))
            .unwrap();

        assert_eq!((result.width, result.height), (240, 320));
        assert_eq!(result.byte_size, std::fs::metadata(&output).unwrap().len());
        assert_eq!(image::image_dimensions(&output).unwrap(), (240, 320));
    }

    #[test]
    fn normalize_portrait_source_is_cropped_not_letterboxed() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("tall.jpg");
        write_test_jpeg(&source, 300, 1000);
        let output = tmp.path().join("foto_2.jpeg");

        RustBackend::new()
            .normalize(&params(source, output.clone(), OutputFormat::Jpeg))
            .unwrap();
        assert_eq!(image::image_dimensions(&output).unwrap(), (240, 320));
    }

    #[test]
    fn normalize_upscales_small_png_source() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("small.png");
        write_test_png(&source, 60, 40);
        let output = tmp.path().join("foto_3.png");

        let result = RustBackend::new()
            .normalize(&params(source, output.clone(), OutputFormat::Png))
            .unwrap();
        assert_eq!(result.format, OutputFormat::Png);
        assert_eq!(image::image_dimensions(&output).unwrap(), (240, 320));
    }

    #[test]
    fn normalize_to_webp() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        write_test_jpeg(&source, 400, 300);
        let output = tmp.path().join("foto_4.webp");

        RustBackend::new()
            .normalize(&params(source, output.clone(), OutputFormat::Webp))
            .unwrap();
        assert_eq!(
            image::ImageFormat::from_path(&output).unwrap(),
            image::ImageFormat::WebP
        );
        assert_eq!(image::image_dimensions(&output).unwrap(), (240, 320));
    }

    // Red bands at both ends of the long axis, blue in the middle 40%.
    fn write_banded_png(path: &Path, width: u32, height: u32) {
        let long = width.max(height);
        image::RgbImage::from_fn(width, height, |x, y| {
            let pos = if height > width { y } else { x };
            if pos < long * 3 / 10 || pos >= long * 7 / 10 {
                image::Rgb([255, 0, 0])
            } else {
                image::Rgb([0, 0, 255])
            }
        })
        .save(path)
        .unwrap();
    }

    fn is_blue(pixel: &image::Rgb<u8>) -> bool {
        pixel[2] > 200 && pixel[0] < 55
    }

    fn assert_edges_blue(output: &Path) {
        let out = image::open(output).unwrap().to_rgb8();
        assert_eq!(out.dimensions(), (240, 320));
        let (w, h) = out.dimensions();
        for x in 0..w {
            assert!(is_blue(out.get_pixel(x, 0)), "top row at x={x}");
            assert!(is_blue(out.get_pixel(x, h - 1)), "bottom row at x={x}");
        }
        for y in 0..h {
            assert!(is_blue(out.get_pixel(0, y)), "left column at y={y}");
            assert!(is_blue(out.get_pixel(w - 1, y)), "right column at y={y}");
        }
    }

    #[test]
    fn portrait_crop_is_taken_from_the_vertical_center() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("tall.png");
        write_banded_png(&source, 300, 1000);
        let output = tmp.path().join("foto_tall.png");

        RustBackend::new()
            .normalize(&params(source, output.clone(), OutputFormat::Png))
            .unwrap();
        assert_edges_blue(&output);
    }

    #[test]
    fn landscape_crop_is_taken_from_the_horizontal_center() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("wide.png");
        write_banded_png(&source, 1000, 300);
        let output = tmp.path().join("foto_wide.png");

        RustBackend::new()
            .normalize(&params(source, output.clone(), OutputFormat::Png))
            .unwrap();
        assert_edges_blue(&output);
    }

    #[test]
    fn normalize_one_pixel_wide_source() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("sliver.png");
        write_test_png(&source, 1, 6000);
        let output = tmp.path().join("foto_sliver.jpeg");

        let plan = calculate_cover_crop((1, 6000), (240, 320));
        assert_eq!((plan.crop_width, plan.crop_height), (1, 1));

        let result = RustBackend::new()
            .normalize(&params(source, output.clone(), OutputFormat::Jpeg))
            .unwrap();
        assert_eq!((result.width, result.height), (240, 320));
        assert_eq!(image::image_dimensions(&output).unwrap(), (240, 320));
    }

    #[test]
    fn source_beyond_size_limit_is_refused() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("too_tall.png");
        write_test_png(&source, 1, MAX_SOURCE_SIDE + 1);
        let output = tmp.path().join("foto_too_tall.jpeg");

        let result = RustBackend::new().normalize(&params(source, output.clone(), OutputFormat::Jpeg));
        assert!(matches!(result, Err(CodecError::Decode(_))));
        assert!(!output.exists());
        assert!(!temp_sibling(&output).exists());
    }

    #[test]
    fn normalize_garbage_input_leaves_no_output() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("garbage.jpg");
        std::fs::write(&source, b"definitely not an image").unwrap();
        let output = tmp.path().join("foto_5.jpeg");

        let result = RustBackend::new().normalize(&params(source, output.clone(), OutputFormat::Jpeg));
        assert!(matches!(result, Err(CodecError::Decode(_))));
        assert!(!output.exists());
        assert!(!temp_sibling(&output).exists());
    }

    #[test]
    fn normalize_into_missing_directory_cleans_temp() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        write_test_jpeg(&source, 100, 100);
        let output = tmp.path().join("missing").join("foto_6.jpeg");

        let result = RustBackend::new().normalize(&params(source, output.clone(), OutputFormat::Jpeg));
        assert!(matches!(result, Err(CodecError::Io(_))));
        assert!(!output.exists());
    }

    #[test]
    fn temp_sibling_is_hidden_in_same_directory() {
        let tmp = temp_sibling(Path::new("/out/Ali/foto_1.jpeg"));
        assert_eq!(tmp, Path::new("/out/Ali/.foto_1.jpeg.partial"));
    }
}
