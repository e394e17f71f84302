//! Service configuration module.
//!
//! Handles loading, validating, and merging `photo-intake.toml`. The file is
//! sparse: stock defaults are serialized to a TOML table and the user file is
//! merged on top, so only the values being overridden need to be written.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [photo]
//! width = 240                       # Output width in pixels
//! height = 320                      # Output height in pixels
//! quality = 90                      # JPEG quality (1-100)
//! format = "jpeg"                   # jpeg | png | webp
//! allowed_extensions = ["jpg", "jpeg", "png"]
//! allowed_media_types = ["image/jpeg", "image/jpg", "image/png"]
//! max_file_size = 10485760          # Bytes per file (10 MiB)
//! max_files_per_request = 50
//!
//! [storage]
//! uploads_root = "public/uploads/fotograflar"
//! public_prefix = "/uploads/fotograflar"
//! staging_dir = "public/temp"
//! data_dir = "public/data"
//!
//! [server]
//! bind = "127.0.0.1:3001"
//! public_url = "http://localhost:3001"
//!
//! [proxy]
//! allowed_host = "trakel.org"
//! site_base = "https://www.trakel.org"
//! timeout_secs = 10
//! user_agent = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36"
//!
//! [processing]
//! max_processes = 4                 # Max parallel encoders (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{NormalizeConfig, OutputFormat, Quality};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "photo-intake.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Service configuration loaded from `photo-intake.toml`.
///
/// All fields have defaults matching the print-tile layout the service was
/// built for. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Output geometry and upload acceptance rules.
    pub photo: PhotoStandard,
    /// On-disk layout for uploads, staging, and JSON collections.
    pub storage: StorageConfig,
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Scrape proxy settings.
    pub proxy: ProxyConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl ServiceConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let photo = &self.photo;
        if photo.width == 0 || photo.height == 0 {
            return Err(ConfigError::Validation(
                "photo.width and photo.height must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&photo.quality) {
            return Err(ConfigError::Validation("photo.quality must be 1-100".into()));
        }
        if photo.allowed_extensions.is_empty() {
            return Err(ConfigError::Validation(
                "photo.allowed_extensions must not be empty".into(),
            ));
        }
        if photo.allowed_media_types.is_empty() {
            return Err(ConfigError::Validation(
                "photo.allowed_media_types must not be empty".into(),
            ));
        }
        if photo.max_file_size == 0 {
            return Err(ConfigError::Validation(
                "photo.max_file_size must be non-zero".into(),
            ));
        }
        if photo.max_files_per_request == 0 {
            return Err(ConfigError::Validation(
                "photo.max_files_per_request must be non-zero".into(),
            ));
        }
        if !self.storage.public_prefix.starts_with('/') {
            return Err(ConfigError::Validation(
                "storage.public_prefix must start with '/'".into(),
            ));
        }
        if self.storage.public_prefix.trim_end_matches('/').is_empty() {
            return Err(ConfigError::Validation(
                "storage.public_prefix must not be the site root".into(),
            ));
        }
        if self.server.bind.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "server.bind is not a socket address: {}",
                self.server.bind
            )));
        }
        if self.proxy.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "proxy.timeout_secs must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// The fixed output geometry every accepted upload is normalized to, plus
/// the acceptance rules applied before any file touches disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhotoStandard {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// JPEG quality (1 = worst, 100 = best). Ignored by the lossless formats.
    pub quality: u32,
    /// Output encoding.
    pub format: OutputFormat,
    /// Accepted file extensions, compared case-insensitively, without the dot.
    pub allowed_extensions: Vec<String>,
    /// Accepted declared media types, compared case-insensitively.
    pub allowed_media_types: Vec<String>,
    /// Maximum size of a single uploaded file in bytes.
    pub max_file_size: u64,
    /// Maximum number of files in one upload request.
    pub max_files_per_request: usize,
}

impl Default for PhotoStandard {
    fn default() -> Self {
        Self {
            width: 240,
            height: 320,
            quality: 90,
            format: OutputFormat::Jpeg,
            allowed_extensions: vec!["jpg".into(), "jpeg".into(), "png".into()],
            allowed_media_types: vec!["image/jpeg".into(), "image/jpg".into(), "image/png".into()],
            max_file_size: 10 * 1024 * 1024,
            max_files_per_request: 50,
        }
    }
}

impl PhotoStandard {
    /// Geometry tag stored on every record, e.g. `"240x320"`.
    pub fn tag(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }

    pub fn normalize_config(&self) -> NormalizeConfig {
        NormalizeConfig {
            width: self.width,
            height: self.height,
            quality: Quality::new(self.quality),
            format: self.format,
        }
    }

    /// Upper bound for a whole multipart body: every file at its maximum
    /// size plus room for the text fields and part headers.
    pub fn max_request_bytes(&self) -> usize {
        usize::try_from(self.max_file_size)
            .unwrap_or(usize::MAX)
            .saturating_mul(self.max_files_per_request)
            .saturating_add(1024 * 1024)
    }
}

/// On-disk layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Root of the normalized outputs; one subdirectory per owner.
    pub uploads_root: PathBuf,
    /// URL prefix the uploads root is served under.
    pub public_prefix: String,
    /// Scratch directory for staged uploads.
    pub staging_dir: PathBuf,
    /// Directory holding the JSON collections.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uploads_root: PathBuf::from("public/uploads/fotograflar"),
            public_prefix: "/uploads/fotograflar".to_string(),
            staging_dir: PathBuf::from("public/temp"),
            data_dir: PathBuf::from("public/data"),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub bind: String,
    /// Externally visible base URL, used to build absolute links.
    pub public_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3001".to_string(),
            public_url: "http://localhost:3001".to_string(),
        }
    }
}

/// Scrape proxy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProxyConfig {
    /// Page URLs must contain this host to be scraped.
    pub allowed_host: String,
    /// Base prepended to relative image sources.
    pub site_base: String,
    /// Timeout for every outbound request.
    pub timeout_secs: u64,
    /// User agent sent upstream.
    pub user_agent: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            allowed_host: "trakel.org".to_string(),
            site_base: "https://www.trakel.org".to_string(),
            timeout_secs: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36"
                .to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image encoding workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ServiceConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ServiceConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ServiceConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file.
///
/// A missing file yields the stock defaults. Otherwise merges user values on
/// top of stock defaults, rejects unknown keys, and validates the result.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `photo-intake.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# photo-intake configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Photo standard
# ---------------------------------------------------------------------------
[photo]
# Every accepted upload is cover-cropped to exactly width x height.
# The defaults fit nine photos (3x3) on the lower half of a portrait A4 sheet.
width = 240
height = 320

# JPEG quality (1 = worst, 100 = best). PNG and WebP output is lossless.
quality = 90

# Output encoding: "jpeg", "png" or "webp".
format = "jpeg"

# An upload is accepted only if BOTH its extension and its declared media
# type appear below (case-insensitive).
allowed_extensions = ["jpg", "jpeg", "png"]
allowed_media_types = ["image/jpeg", "image/jpg", "image/png"]

# Per-file size limit in bytes (10 MiB).
max_file_size = 10485760

# Maximum number of files in one upload request.
max_files_per_request = 50

# ---------------------------------------------------------------------------
# Storage layout
# ---------------------------------------------------------------------------
[storage]
# Normalized photos land in <uploads_root>/<photographer name>/.
uploads_root = "public/uploads/fotograflar"

# URL prefix the uploads root is served under.
public_prefix = "/uploads/fotograflar"

# Scratch directory for uploads waiting to be processed.
staging_dir = "public/temp"

# photographers.json, photo-records.json and print-history.json live here.
data_dir = "public/data"

# ---------------------------------------------------------------------------
# HTTP server
# ---------------------------------------------------------------------------
[server]
bind = "127.0.0.1:3001"

# Externally visible base URL, used for absolute photo and proxy links.
public_url = "http://localhost:3001"

# ---------------------------------------------------------------------------
# Scrape proxy
# ---------------------------------------------------------------------------
[proxy]
# Only page URLs containing this host are scraped.
allowed_host = "trakel.org"

# Relative image sources are resolved against this base.
site_base = "https://www.trakel.org"

# Timeout for every outbound request, in seconds.
timeout_secs = 10

user_agent = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel encoding workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
