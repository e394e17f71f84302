use super::blocking;
use crate::server::error::{ApiError, ApiJson};
use crate::server::state::AppState;
use crate::types::PrintRecord;
use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintRequest {
    photographer_id: Option<Value>,
    photographer_name: Option<String>,
}

/// Client ids arrive as strings or numbers; both are stored as text.
fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Serialize)]
pub struct PrintResponse {
    success: bool,
    message: &'static str,
    record: PrintRecord,
}

pub async fn print_certificate(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<PrintRequest>,
) -> Result<Json<PrintResponse>, ApiError> {
    let id = body.photographer_id.as_ref().and_then(id_text);
    let name = body
        .photographer_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    let (Some(id), Some(name)) = (id, name) else {
        return Err(ApiError::bad_request(
            "photographerId and photographerName are required",
        ));
    };

    let record = PrintRecord::new(id, name);
    let collection = state.catalogs.print_history.clone();
    let stored = record.clone();
    blocking(move || Ok(collection.append_and_save(vec![stored])?)).await?;

    tracing::info!(photographer = %record.photographer_name, "certificate printed");
    Ok(Json(PrintResponse {
        success: true,
        message: "Print recorded",
        record,
    }))
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    success: bool,
    count: usize,
    history: Vec<PrintRecord>,
}

impl HistoryResponse {
    fn new(history: Vec<PrintRecord>) -> Self {
        Self {
            success: true,
            count: history.len(),
            history,
        }
    }
}

pub async fn full_history(State(state): State<AppState>) -> Result<Json<HistoryResponse>, ApiError> {
    let collection = state.catalogs.print_history.clone();
    let history = blocking(move || Ok(collection.try_load()?)).await?;
    Ok(Json(HistoryResponse::new(history)))
}

pub async fn history_for(
    State(state): State<AppState>,
    Path(photographer_id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let collection = state.catalogs.print_history.clone();
    let history = blocking(move || Ok(collection.try_load()?)).await?;
    let history = history
        .into_iter()
        .filter(|record| record.photographer_id == photographer_id)
        .collect();
    Ok(Json(HistoryResponse::new(history)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn id_text_accepts_strings_and_numbers() {
        assert_eq!(id_text(&json!("17")), Some("17".to_string()));
        assert_eq!(id_text(&json!(17)), Some("17".to_string()));
        assert_eq!(id_text(&json!("  ")), None);
        assert_eq!(id_text(&json!(null)), None);
        assert_eq!(id_text(&json!(true)), None);
    }
}
