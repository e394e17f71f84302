//! Shared fixtures for the integration tests: synthetic images and a service
//! configuration rooted in a temp directory.

#![allow(dead_code)]

use axum_test::TestServer;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use photo_intake::catalog::Catalogs;
use photo_intake::config::ServiceConfig;
use photo_intake::server::{AppState, router};
use std::path::Path;
use tempfile::TempDir;

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 200])
    })
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut out = Vec::new();
    JpegEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    out
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    out
}

/// A service config whose storage lives in its own temp directory.
pub struct TestService {
    pub tmp: TempDir,
    pub config: ServiceConfig,
}

impl TestService {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let public = tmp.path().join("public");
        let mut config = ServiceConfig::default();
        config.storage.uploads_root = public.join("uploads/fotograflar");
        config.storage.staging_dir = public.join("temp");
        config.storage.data_dir = public.join("data");
        Self { tmp, config }
    }

    pub fn uploads_root(&self) -> &Path {
        &self.config.storage.uploads_root
    }

    pub fn staging_dir(&self) -> &Path {
        &self.config.storage.staging_dir
    }

    /// Handles on the same files the server writes.
    pub fn catalogs(&self) -> Catalogs {
        Catalogs::open(&self.config.storage.data_dir)
    }

    pub fn server(&self) -> TestServer {
        let state = AppState::new(self.config.clone()).unwrap();
        state.catalogs.ensure_all().unwrap();
        TestServer::new(router(state)).unwrap()
    }

    pub fn files_in(&self, dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }
}
