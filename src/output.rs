//! CLI output formatting.
//!
//! Output is **photo-centric**: every ingested photo is listed by its
//! position in the request and its original name, with the stored file and
//! serving path as indented context lines.
//!
//! # Output Format
//!
//! ## Ingest
//!
//! ```text
//! Ali (2 photos, 240x320)
//! 001 kelebek.jpg → foto_1717171717171-42.jpeg
//!     Path: /uploads/fotograflar/Ali/foto_1717171717171-42.jpeg
//!     Size: 24.1 KB
//! 002 ari.png → foto_1717171717172-7.jpeg
//!     Path: /uploads/fotograflar/Ali/foto_1717171717172-7.jpeg
//!     Size: 19.8 KB
//!
//! Cataloged 2 photos
//! ```
//!
//! ## Check config
//!
//! ```text
//! Config OK: photo-intake.toml
//!     Standard: 240x320 jpeg q90
//!     Accepts: JPG, JPEG, PNG up to 10.0 MB, 50 per request
//!     Uploads: public/uploads/fotograflar → /uploads/fotograflar
//!     Staging: public/temp
//!     Data: public/data
//!     Listen: 127.0.0.1:3001 (http://localhost:3001)
//!     Proxy: trakel.org, 10s timeout
//! ```
//!
//! # Architecture
//!
//! Each listing has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::config::ServiceConfig;
use crate::ingest::IngestOutcome;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count with one decimal.
fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Ingest
// ============================================================================

pub fn format_ingest_outcome(outcome: &IngestOutcome) -> Vec<String> {
    let mut lines = Vec::new();
    let owner = outcome
        .photos
        .first()
        .map(|p| p.photographer_name.as_str())
        .unwrap_or_default();
    lines.push(format!(
        "{} ({}, {})",
        owner,
        plural(outcome.photos.len(), "photo"),
        outcome.standard
    ));

    for (i, photo) in outcome.photos.iter().enumerate() {
        lines.push(format!(
            "{} {} → {}",
            format_index(i + 1),
            photo.original_name,
            photo.file_name
        ));
        lines.push(format!("{}Path: {}", indent(1), photo.path));
        lines.push(format!("{}Size: {}", indent(1), format_size(photo.size)));
    }

    lines.push(String::new());
    lines.push(format!("Cataloged {}", plural(outcome.photos.len(), "photo")));
    lines
}

pub fn print_ingest_outcome(outcome: &IngestOutcome) {
    for line in format_ingest_outcome(outcome) {
        println!("{}", line);
    }
}

// ============================================================================
// Config check
// ============================================================================

pub fn format_config_check(config: &ServiceConfig, source: &Path) -> Vec<String> {
    let photo = &config.photo;
    let storage = &config.storage;
    let accepted: Vec<String> = photo
        .allowed_extensions
        .iter()
        .map(|ext| ext.to_ascii_uppercase())
        .collect();

    let source_line = if source.exists() {
        format!("Config OK: {}", source.display())
    } else {
        format!("Config OK: stock defaults ({} not found)", source.display())
    };

    vec![
        source_line,
        format!(
            "{}Standard: {} {} q{}",
            indent(1),
            photo.tag(),
            photo.format,
            photo.quality
        ),
        format!(
            "{}Accepts: {} up to {}, {} per request",
            indent(1),
            accepted.join(", "),
            format_size(photo.max_file_size),
            photo.max_files_per_request
        ),
        format!(
            "{}Uploads: {} → {}",
            indent(1),
            storage.uploads_root.display(),
            storage.public_prefix
        ),
        format!("{}Staging: {}", indent(1), storage.staging_dir.display()),
        format!("{}Data: {}", indent(1), storage.data_dir.display()),
        format!(
            "{}Listen: {} ({})",
            indent(1),
            config.server.bind,
            config.server.public_url
        ),
        format!(
            "{}Proxy: {}, {}s timeout",
            indent(1),
            config.proxy.allowed_host,
            config.proxy.timeout_secs
        ),
    ]
}

pub fn print_config_check(config: &ServiceConfig, source: &Path) {
    for line in format_config_check(config, source) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::OutputFormat;
    use crate::types::PhotoRecord;
    use chrono::Utc;
    use serde_json::Map;
    use std::path::PathBuf;

    fn record(original: &str, file: &str, size: u64) -> PhotoRecord {
        PhotoRecord {
            id: "photo_1".into(),
            original_name: original.into(),
            file_name: file.into(),
            photographer_name: "Ali".into(),
            photographer_id: None,
            path: format!("/uploads/fotograflar/Ali/{file}"),
            full_path: PathBuf::from("/srv").join(file),
            size,
            width: 240,
            height: 320,
            format: OutputFormat::Jpeg,
            uploaded_at: Utc::now(),
            standard: "240x320".into(),
            annotations: Map::new(),
        }
    }

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(10 * 1024 * 1024), "10.0 MB");
    }

    #[test]
    fn ingest_outcome_lists_every_photo() {
        let outcome = IngestOutcome {
            photos: vec![
                record("kelebek.jpg", "foto_1-1.jpeg", 2048),
                record("ari.png", "foto_2-2.jpeg", 100),
            ],
            standard: "240x320".into(),
        };
        let lines = format_ingest_outcome(&outcome);
        assert_eq!(lines[0], "Ali (2 photos, 240x320)");
        assert_eq!(lines[1], "001 kelebek.jpg → foto_1-1.jpeg");
        assert_eq!(lines[2], "    Path: /uploads/fotograflar/Ali/foto_1-1.jpeg");
        assert_eq!(lines[3], "    Size: 2.0 KB");
        assert_eq!(lines[4], "002 ari.png → foto_2-2.jpeg");
        assert_eq!(lines.last().unwrap(), "Cataloged 2 photos");
    }

    #[test]
    fn single_photo_is_singular() {
        let outcome = IngestOutcome {
            photos: vec![record("a.jpg", "foto_1-1.jpeg", 1)],
            standard: "240x320".into(),
        };
        let lines = format_ingest_outcome(&outcome);
        assert_eq!(lines[0], "Ali (1 photo, 240x320)");
        assert_eq!(lines.last().unwrap(), "Cataloged 1 photo");
    }

    #[test]
    fn config_check_summarizes_defaults() {
        let lines = format_config_check(
            &ServiceConfig::default(),
            Path::new("/definitely/missing/photo-intake.toml"),
        );
        assert!(lines[0].starts_with("Config OK: stock defaults"));
        assert_eq!(lines[1], "    Standard: 240x320 jpeg q90");
        assert_eq!(lines[2], "    Accepts: JPG, JPEG, PNG up to 10.0 MB, 50 per request");
        assert_eq!(lines[3], "    Uploads: public/uploads/fotograflar → /uploads/fotograflar");
        assert_eq!(lines[6], "    Listen: 127.0.0.1:3001 (http://localhost:3001)");
        assert_eq!(lines[7], "    Proxy: trakel.org, 10s timeout");
    }
}
