//! Shared types used across the intake pipeline, the catalog, and the HTTP layer.
//!
//! Catalog types are serialized with camelCase keys so the JSON collections
//! stay readable by the browser client that also writes to them. Keys this
//! crate does not know about are kept in flattened maps and written back
//! unchanged.

use crate::imaging::OutputFormat;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;

/// One file of an upload, fully received.
#[derive(Clone, PartialEq)]
pub struct IncomingFile {
    /// Filename as sent by the client.
    pub original_name: String,
    /// Declared media type (multipart `Content-Type`).
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl IncomingFile {
    pub fn new(original_name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            original_name: original_name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl fmt::Debug for IncomingFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncomingFile")
            .field("original_name", &self.original_name)
            .field("media_type", &self.media_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// A complete upload: who it belongs to and the files, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub owner_name: String,
    pub owner_id: Option<String>,
    pub files: Vec<IncomingFile>,
}

/// Metadata for one normalized photo, appended to the catalog once and never
/// mutated by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRecord {
    /// `photo_<suffix>`
    pub id: String,
    pub original_name: String,
    /// `foto_<suffix>.<ext>`
    pub file_name: String,
    pub photographer_name: String,
    #[serde(default)]
    pub photographer_id: Option<String>,
    /// Serving path: `<public_prefix>/<owner>/<fileName>`.
    pub path: String,
    /// Storage path of the encoded output.
    pub full_path: PathBuf,
    /// Encoded size in bytes.
    pub size: u64,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub uploaded_at: DateTime<Utc>,
    /// Geometry tag, e.g. `"240x320"`.
    pub standard: String,
    /// Client annotations (`butterflyType`, `imageUrl`, ...).
    #[serde(flatten)]
    pub annotations: Map<String, Value>,
}

/// One element of the photo-records collection.
///
/// The collection is shared with the browser client, which stores its own
/// annotation-only entries next to the records produced by ingestion. Entries
/// that don't have the full record shape are carried as raw JSON objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CatalogEntry {
    Photo(PhotoRecord),
    Annotation(Map<String, Value>),
}

impl CatalogEntry {
    pub fn as_photo(&self) -> Option<&PhotoRecord> {
        match self {
            CatalogEntry::Photo(record) => Some(record),
            CatalogEntry::Annotation(_) => None,
        }
    }

    pub fn photographer_name(&self) -> Option<&str> {
        match self {
            CatalogEntry::Photo(record) => Some(&record.photographer_name),
            CatalogEntry::Annotation(map) => map.get("photographerName").and_then(Value::as_str),
        }
    }

    /// A string-valued field by its JSON key, annotations included.
    pub fn text_field(&self, key: &str) -> Option<&str> {
        match self {
            CatalogEntry::Photo(record) => match key {
                "photographerName" => Some(&record.photographer_name),
                "path" => Some(&record.path),
                "fileName" => Some(&record.file_name),
                "id" => Some(&record.id),
                _ => record.annotations.get(key).and_then(Value::as_str),
            },
            CatalogEntry::Annotation(map) => map.get(key).and_then(Value::as_str),
        }
    }
}

impl From<PhotoRecord> for CatalogEntry {
    fn from(record: PhotoRecord) -> Self {
        CatalogEntry::Photo(record)
    }
}

/// A photographer as imported by the client (typically from a CSV sheet).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photographer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// National identity number.
    #[serde(default, rename = "tcNo", skip_serializing_if = "Option::is_none")]
    pub national_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One certificate print, appended to the print history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintRecord {
    /// Millisecond timestamp of the print, as a string.
    pub id: String,
    pub photographer_id: String,
    pub photographer_name: String,
    pub printed_at: DateTime<Utc>,
}

impl PrintRecord {
    pub fn new(photographer_id: impl Into<String>, photographer_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: now.timestamp_millis().to_string(),
            photographer_id: photographer_id.into(),
            photographer_name: photographer_name.into(),
            printed_at: now,
        }
    }
}
