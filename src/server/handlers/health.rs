use axum::Json;
use serde::Serialize;

pub const ENDPOINTS: &[&str] = &[
    "POST /api/save-photographers",
    "GET /api/photographers",
    "GET /api/status",
    "GET /api/download-csv",
    "GET /api/photographers/download-csv",
    "POST /api/save-photo-records",
    "GET /api/photo-records",
    "GET /api/photo-records/download-csv",
    "POST /api/upload-photos",
    "GET /api/photos/{photographerName}",
    "POST /api/clear-all-data",
    "POST /api/print-certificate",
    "GET /api/print-history",
    "GET /api/print-history/{photographerId}",
    "GET /api/uploaded-photos/{photographerName}",
    "POST /api/extract-image-url",
    "GET /api/image-proxy?url=",
];

#[derive(Debug, Serialize)]
pub struct Health {
    status: &'static str,
    message: &'static str,
    version: &'static str,
    endpoints: &'static [&'static str],
}

pub async fn index() -> Json<Health> {
    Json(Health {
        status: "OK",
        message: "photo-intake is running",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: ENDPOINTS,
    })
}
