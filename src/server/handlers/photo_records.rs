//! The photo-records collection as seen by the browser client.

use super::{SaveBody, Sources, blocking, csv_attachment};
use crate::export::{attachment_name, photo_records_csv};
use crate::server::error::{ApiError, ApiJson};
use crate::server::state::AppState;
use crate::types::CatalogEntry;
use axum::Json;
use axum::extract::{Path, State};
use axum::response::Response;
use chrono::Utc;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    success: bool,
    message: String,
    data: Vec<CatalogEntry>,
    sources: Sources,
}

pub async fn save_photo_records(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SaveBody<CatalogEntry>>,
) -> Result<Json<SaveResponse>, ApiError> {
    let append = body.is_append();
    let data = body.into_data()?;
    let received = data.len();

    let collection = state.catalogs.photo_records.clone();
    let saved = blocking(move || {
        let saved = collection.update(|items| {
            if append {
                items.extend(data);
            } else {
                *items = data;
            }
            items.clone()
        })?;
        Ok(saved)
    })
    .await?;

    tracing::info!(received, total = saved.len(), append, "photo records saved");
    Ok(Json(SaveResponse {
        success: true,
        message: format!("{received} photo records saved"),
        sources: Sources::from_file(saved.len()),
        data: saved,
    }))
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    success: bool,
    records: Vec<CatalogEntry>,
    count: usize,
    sources: Sources,
}

/// Every catalog entry. An unreadable file reads as empty.
pub async fn list_photo_records(State(state): State<AppState>) -> Result<Json<ListResponse>, ApiError> {
    let collection = state.catalogs.photo_records.clone();
    let records = blocking(move || {
        Ok(collection.try_load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "photo records unreadable, returning none");
            Vec::new()
        }))
    })
    .await?;
    Ok(Json(ListResponse {
        success: true,
        count: records.len(),
        sources: Sources::from_file(records.len()),
        records,
    }))
}

pub async fn download_csv(State(state): State<AppState>) -> Result<Response, ApiError> {
    let collection = state.catalogs.photo_records.clone();
    let entries = blocking(move || Ok(collection.load()?)).await?;
    let csv = photo_records_csv(&entries);
    Ok(csv_attachment(
        attachment_name("photo_records", Utc::now().date_naive()),
        csv,
    ))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerPhotosResponse {
    success: bool,
    photographer_name: String,
    count: usize,
    photos: Vec<CatalogEntry>,
}

/// Catalog entries belonging to one photographer.
pub async fn photos_by_owner(
    State(state): State<AppState>,
    Path(photographer_name): Path<String>,
) -> Result<Json<OwnerPhotosResponse>, ApiError> {
    let collection = state.catalogs.photo_records.clone();
    let entries = blocking(move || Ok(collection.load()?)).await?;
    let photos: Vec<CatalogEntry> = entries
        .into_iter()
        .filter(|entry| entry.photographer_name() == Some(photographer_name.as_str()))
        .collect();
    Ok(Json(OwnerPhotosResponse {
        success: true,
        count: photos.len(),
        photographer_name,
        photos,
    }))
}
