//! Whole-file JSON collections.
//!
//! Each collection is one pretty-printed JSON array on disk, rewritten in
//! full on every change. Writes go to a temporary sibling that is renamed
//! into place, so readers only ever see a complete old or new file.
//!
//! ## Single writer
//!
//! Every change is a read-modify-write of the whole file. Two unserialized
//! cycles that overlap lose one update (both read the same old array, the
//! second rename wins). [`JsonCollection::update`] therefore holds a mutex
//! across the full cycle, and the process shares one instance per file via
//! [`Catalogs`]. Plain [`JsonCollection::load`] does not take the lock.
//!
//! ## Damaged files
//!
//! A missing file reads as empty. A file that fails to parse is reported as
//! [`CatalogError::Corrupt`] by [`JsonCollection::try_load`]; `load` logs it
//! and reads it as empty. Before an update overwrites a damaged file, the
//! damaged copy is moved aside to `<name>.corrupt-<millis>`.

use crate::types::{CatalogEntry, Photographer, PrintRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

pub const PHOTOGRAPHERS_FILE: &str = "photographers.json";
pub const PHOTO_RECORDS_FILE: &str = "photo-records.json";
pub const PRINT_HISTORY_FILE: &str = "print-history.json";

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("cannot serialize collection: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("{} is not a valid JSON collection: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl CatalogError {
    fn io(path: &Path, source: io::Error) -> Self {
        CatalogError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// File facts reported by `/api/status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStatus {
    pub path: PathBuf,
    pub exists: bool,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub record_count: usize,
}

/// A JSON array of `T` stored in a single file.
#[derive(Debug)]
pub struct JsonCollection<T> {
    path: PathBuf,
    writer: Mutex<()>,
    _items: PhantomData<fn() -> T>,
}

impl<T> JsonCollection<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(()),
            _items: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the parent directory and an empty `[]` file if missing.
    pub fn ensure_exists(&self) -> Result<(), CatalogError> {
        let _guard = self.lock();
        if self.path.exists() {
            return Ok(());
        }
        write_atomic::<T>(&self.path, &[])
    }

    /// Read the collection, surfacing parse failures.
    pub fn try_load(&self) -> Result<Vec<T>, CatalogError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CatalogError::io(&self.path, e)),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|source| CatalogError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Read the collection; a damaged file reads as empty.
    pub fn load(&self) -> Result<Vec<T>, CatalogError> {
        match self.try_load() {
            Err(CatalogError::Corrupt { path, source }) => {
                tracing::warn!(path = %path.display(), error = %source, "damaged collection read as empty");
                Ok(Vec::new())
            }
            other => other,
        }
    }

    /// Run one serialized read-modify-write cycle.
    ///
    /// `f` sees the current items; whatever it leaves is written back.
    pub fn update<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> Result<R, CatalogError> {
        let _guard = self.lock();
        let mut items = match self.try_load() {
            Ok(items) => items,
            Err(CatalogError::Corrupt { path, source }) => {
                let aside = set_aside(&path)?;
                tracing::warn!(
                    path = %path.display(),
                    moved_to = %aside.display(),
                    error = %source,
                    "damaged collection moved aside, starting empty"
                );
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        let result = f(&mut items);
        write_atomic(&self.path, &items)?;
        Ok(result)
    }

    /// Append `new_items` and rewrite the file. Returns the new total.
    pub fn append_and_save(&self, new_items: Vec<T>) -> Result<usize, CatalogError> {
        self.update(|items| {
            items.extend(new_items);
            items.len()
        })
    }

    /// Replace the whole collection. Returns the new total.
    pub fn replace(&self, new_items: Vec<T>) -> Result<usize, CatalogError> {
        self.update(|items| {
            *items = new_items;
            items.len()
        })
    }

    pub fn clear(&self) -> Result<(), CatalogError> {
        self.replace(Vec::new()).map(|_| ())
    }

    pub fn stat(&self) -> Result<CollectionStatus, CatalogError> {
        let meta = fs::metadata(&self.path).map_err(|e| CatalogError::io(&self.path, e))?;
        let last_modified = meta.modified().ok().map(DateTime::<Utc>::from);
        let record_count = self.try_load()?.len();
        Ok(CollectionStatus {
            path: self.path.clone(),
            exists: true,
            size: meta.len(),
            last_modified,
            record_count,
        })
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // The guarded value is (), so a poisoned lock carries no broken state.
        self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Serialize `items` into a temporary sibling, then rename over `path`.
fn write_atomic<T: Serialize>(path: &Path, items: &[T]) -> Result<(), CatalogError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| CatalogError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(items)?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{name}.tmp"));

    let written = fs::write(&tmp, json).and_then(|()| fs::rename(&tmp, path));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(CatalogError::io(path, e));
    }
    Ok(())
}

fn set_aside(path: &Path) -> Result<PathBuf, CatalogError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let aside = path.with_file_name(format!("{name}.corrupt-{}", Utc::now().timestamp_millis()));
    fs::rename(path, &aside).map_err(|e| CatalogError::io(path, e))?;
    Ok(aside)
}

/// The three collections the service keeps under its data directory.
///
/// Cloning shares the same writer locks.
#[derive(Debug, Clone)]
pub struct Catalogs {
    pub photo_records: Arc<JsonCollection<CatalogEntry>>,
    pub photographers: Arc<JsonCollection<Photographer>>,
    pub print_history: Arc<JsonCollection<PrintRecord>>,
}

impl Catalogs {
    pub fn open(data_dir: &Path) -> Self {
        Self {
            photo_records: Arc::new(JsonCollection::open(data_dir.join(PHOTO_RECORDS_FILE))),
            photographers: Arc::new(JsonCollection::open(data_dir.join(PHOTOGRAPHERS_FILE))),
            print_history: Arc::new(JsonCollection::open(data_dir.join(PRINT_HISTORY_FILE))),
        }
    }

    /// Create every collection file that doesn't exist yet.
    pub fn ensure_all(&self) -> Result<(), CatalogError> {
        self.photo_records.ensure_exists()?;
        self.photographers.ensure_exists()?;
        self.print_history.ensure_exists()
    }
}
