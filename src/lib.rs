//! # Photo Intake
//!
//! A photographer registry and photo intake service. Photographers are
//! imported in bulk, their uploaded photos are normalized to one fixed print
//! geometry, and everything is kept in plain JSON files next to the stored
//! images.
//!
//! # Architecture: Ingestion Pipeline
//!
//! Every upload, whether it arrives over HTTP or from the `ingest` command,
//! goes through the same synchronous pipeline:
//!
//! ```text
//! 1. Validate   request   →  owner + files      (nothing touches disk on failure)
//! 2. Stage      files     →  public/temp/       (one scratch file per upload)
//! 3. Encode     staged    →  uploads/<owner>/   (cover-crop to the standard, in parallel)
//! 4. Catalog    outputs   →  photo-records.json (one record per photo, appended)
//! 5. Clean up   staged    →  (deleted on every path)
//! ```
//!
//! A request is all-or-nothing: if any file fails, every output it produced
//! is removed and nothing is cataloged.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`ingest`] | The pipeline: stage ordering, all-or-nothing semantics, error reporting |
//! | [`validation`] | Request and per-file acceptance checks run before any I/O |
//! | [`staging`] | Scratch files for uploads, with guaranteed cleanup |
//! | [`imaging`] | Pure-Rust cover-crop and encode behind the `ImageBackend` trait |
//! | [`catalog`] | JSON collections with serialized read-modify-write and atomic writes |
//! | [`types`] | Records shared by the pipeline, the catalog, and the HTTP layer |
//! | [`naming`] | Unique suffixes, output/record names, owner directory checks |
//! | [`export`] | CSV sheets of photographers and photo records |
//! | [`proxy`] | Reference-site scrape and image relay |
//! | [`server`] | axum router, handlers, and error mapping |
//! | [`config`] | `photo-intake.toml` loading, merging over stock defaults, validation |
//! | [`telemetry`] | tracing subscriber setup |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## One Geometry For Every Photo
//!
//! Certificates print nine photos in a 3x3 grid, so every accepted upload is
//! scaled to cover the standard size and center-cropped to exactly that size.
//! Aspect ratio is never preserved at the expense of the frame.
//!
//! ## Single-Writer Collections
//!
//! Each JSON file is owned by one [`catalog::JsonCollection`], which holds a
//! mutex across the whole read-modify-write cycle and replaces the file by
//! rename. Two concurrent uploads can never drop each other's records, and a
//! crash mid-write leaves the previous file intact.
//!
//! ## Shared Catalog
//!
//! The browser client writes its own annotation entries into
//! `photo-records.json`. Entries without the full record shape are carried
//! through unchanged ([`types::CatalogEntry`]), so the service never destroys
//! client data it does not understand.

pub mod catalog;
pub mod config;
pub mod export;
pub mod imaging;
pub mod ingest;
pub mod naming;
pub mod output;
pub mod proxy;
pub mod server;
pub mod staging;
pub mod telemetry;
pub mod types;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_helpers;
