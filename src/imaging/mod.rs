//! Image normalization: pure Rust, zero external tools.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `ImageReader::into_dimensions` |
//! | **Normalize** | `resize_exact` (Lanczos3) + `crop_imm` center crop |
//! | **Encode** | JPEG (quality), PNG, WebP (lossless) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{CodecError, ImageBackend, Normalized};
pub use rust_backend::RustBackend;
// Re-exported for tests (operations.rs tests use this)
#[cfg(test)]
pub use backend::Dimensions;
pub use operations::{NormalizeConfig, NormalizedPhoto, get_dimensions, normalize_photo};
pub use params::{NormalizeParams, OutputFormat, Quality};
