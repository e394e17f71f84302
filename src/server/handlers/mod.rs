//! Route handlers, grouped by the collection they work on.

pub mod health;
pub mod photo_records;
pub mod photographers;
pub mod print_history;
pub mod proxy;
pub mod uploads;

use super::error::ApiError;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// Run blocking file work off the async workers.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

/// Body of the bulk save endpoints.
#[derive(Debug, Deserialize)]
pub struct SaveBody<T> {
    pub data: Option<Vec<T>>,
    /// `"append"` appends; anything else (or nothing) replaces.
    pub action: Option<String>,
}

impl<T> SaveBody<T> {
    pub fn is_append(&self) -> bool {
        self.action.as_deref() == Some("append")
    }

    pub fn into_data(self) -> Result<Vec<T>, ApiError> {
        self.data
            .ok_or_else(|| ApiError::bad_request("Invalid data format: `data` must be an array"))
    }
}

/// Record counts by origin. Everything the service returns comes from its
/// own data file, so `local` is always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sources {
    pub total: usize,
    #[serde(rename = "static")]
    pub stored: usize,
    pub local: usize,
}

impl Sources {
    pub fn from_file(count: usize) -> Self {
        Self {
            total: count,
            stored: count,
            local: 0,
        }
    }
}

pub(crate) fn csv_attachment(file_name: String, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={file_name}"),
            ),
        ],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_body_defaults_to_replace() {
        let body: SaveBody<u32> = serde_json::from_str(r#"{"data": [1, 2]}"#).unwrap();
        assert!(!body.is_append());
        let body: SaveBody<u32> =
            serde_json::from_str(r#"{"data": [], "action": "merge"}"#).unwrap();
        assert!(!body.is_append());
        let body: SaveBody<u32> =
            serde_json::from_str(r#"{"data": [], "action": "append"}"#).unwrap();
        assert!(body.is_append());
    }

    #[test]
    fn save_body_without_data_is_rejected() {
        let body: SaveBody<u32> = serde_json::from_str(r#"{"action": "append"}"#).unwrap();
        assert_eq!(body.into_data().unwrap_err().status(), 400);
    }

    #[test]
    fn sources_serialize_with_static_key() {
        let json = serde_json::to_value(Sources::from_file(3)).unwrap();
        assert_eq!(json, serde_json::json!({"total": 3, "static": 3, "local": 0}));
    }
}
