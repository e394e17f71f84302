//! Photographer registry: bulk save, listing, file status, CSV export, reset.

use super::{SaveBody, blocking, csv_attachment};
use crate::catalog::CollectionStatus;
use crate::export::{attachment_name, photographers_csv};
use crate::server::error::{ApiError, ApiJson};
use crate::server::state::AppState;
use crate::types::Photographer;
use axum::Json;
use axum::extract::State;
use axum::response::Response;
use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    success: bool,
    message: String,
    total_records: usize,
    file_path: PathBuf,
}

pub async fn save_photographers(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SaveBody<Photographer>>,
) -> Result<Json<SaveResponse>, ApiError> {
    let append = body.is_append();
    let data = body.into_data()?;
    let received = data.len();

    let collection = state.catalogs.photographers.clone();
    let file_path = collection.path().to_path_buf();
    let total = blocking(move || {
        let total = if append {
            collection.append_and_save(data)?
        } else {
            collection.replace(data)?
        };
        Ok(total)
    })
    .await?;

    tracing::info!(received, total, append, "photographers saved");
    Ok(Json(SaveResponse {
        success: true,
        message: format!("{received} records saved"),
        total_records: total,
        file_path,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    success: bool,
    data: Vec<Photographer>,
    total_records: usize,
}

pub async fn list_photographers(
    State(state): State<AppState>,
) -> Result<Json<ListResponse>, ApiError> {
    let collection = state.catalogs.photographers.clone();
    let data = blocking(move || Ok(collection.try_load()?)).await?;
    Ok(Json(ListResponse {
        success: true,
        total_records: data.len(),
        data,
    }))
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum FileReport {
    Found(CollectionStatus),
    Missing {
        path: PathBuf,
        exists: bool,
        error: String,
    },
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    success: bool,
    file: FileReport,
}

/// Photographer file facts. Never fails: a missing or unreadable file is
/// reported with `success: false`.
pub async fn status(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let collection = state.catalogs.photographers.clone();
    let path = collection.path().to_path_buf();
    let stat = blocking(move || Ok(collection.stat())).await?;
    let response = match stat {
        Ok(status) => StatusResponse {
            success: true,
            file: FileReport::Found(status),
        },
        Err(e) => StatusResponse {
            success: false,
            file: FileReport::Missing {
                path,
                exists: false,
                error: e.to_string(),
            },
        },
    };
    Ok(Json(response))
}

async fn export(state: AppState, prefix: &str, with_added_date: bool) -> Result<Response, ApiError> {
    let collection = state.catalogs.photographers.clone();
    let data = blocking(move || Ok(collection.try_load()?)).await?;
    let csv = photographers_csv(&data, with_added_date);
    Ok(csv_attachment(attachment_name(prefix, Utc::now().date_naive()), csv))
}

/// Full sheet including the import date.
pub async fn download_csv(State(state): State<AppState>) -> Result<Response, ApiError> {
    export(state, "photographers", true).await
}

/// Name, national id, and address only.
pub async fn download_details_csv(State(state): State<AppState>) -> Result<Response, ApiError> {
    export(state, "photographer_details", false).await
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    success: bool,
    message: &'static str,
}

/// Reset photographers and photo records. Print history and stored files
/// are kept.
pub async fn clear_all_data(State(state): State<AppState>) -> Result<Json<ClearResponse>, ApiError> {
    let catalogs = state.catalogs.clone();
    blocking(move || {
        catalogs.photographers.clear()?;
        catalogs.photo_records.clear()?;
        Ok(())
    })
    .await?;
    tracing::warn!("photographers and photo records cleared");
    Ok(Json(ClearResponse {
        success: true,
        message: "All data cleared",
    }))
}
