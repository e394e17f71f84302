//! Centralized file naming for staged uploads and normalized outputs.
//!
//! Every generated name carries a unique suffix of the form
//! `<unix millis>-<random 0..1e9>`:
//!
//! - staged upload:    `temp_<suffix>_<sanitized original name>`
//! - normalized photo: `foto_<suffix>.<ext>`
//! - catalog id:       `photo_<suffix>`
//!
//! Owner names become directory names under the uploads root, so they are
//! checked here before anything is created on disk.

use chrono::Utc;

/// Collision-resistant suffix shared by one output file and its record id.
pub fn unique_suffix() -> String {
    let millis = Utc::now().timestamp_millis();
    let salt: u32 = rand::random_range(0..1_000_000_000);
    format!("{millis}-{salt}")
}

/// Name of a staged upload inside the staging directory.
pub fn staged_file_name(suffix: &str, original_name: &str) -> String {
    format!("temp_{}_{}", suffix, sanitize_filename(original_name))
}

/// Stem of a normalized output (extension added by the codec layer).
pub fn output_stem(suffix: &str) -> String {
    format!("foto_{suffix}")
}

/// Catalog id of the record describing a normalized output.
pub fn record_id(suffix: &str) -> String {
    format!("photo_{suffix}")
}

/// Reduce a client-supplied filename to a safe single path component.
///
/// Any directory part (either separator style) is dropped, and characters
/// outside `[A-Za-z0-9._-]` become `_`. An empty result becomes `upload`.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Lowercased extension of a client-supplied filename, without the dot.
pub fn file_extension(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let (stem, ext) = base.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Why an owner name cannot be used as a directory name, if it can't.
pub fn owner_dir_problem(name: &str) -> Option<&'static str> {
    if name == "." || name == ".." {
        return Some("is a relative path component");
    }
    if name.contains(['/', '\\']) {
        return Some("contains a path separator");
    }
    if name.contains("..") {
        return Some("contains '..'");
    }
    if name.chars().any(char::is_control) {
        return Some("contains a control character");
    }
    None
}
