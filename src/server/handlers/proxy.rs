//! Reference-site scrape and image relay.

use crate::proxy::ExtractedImage;
use crate::server::error::{ApiError, ApiJson};
use crate::server::state::AppState;
use axum::Json;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest {
    trakel_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ExtractResponse {
    Found {
        success: bool,
        #[serde(flatten)]
        image: ExtractedImage,
    },
    Failed {
        success: bool,
        message: String,
        #[serde(rename = "originalUrl")]
        original_url: Option<String>,
    },
}

impl ExtractResponse {
    fn failed(message: impl Into<String>, original_url: Option<String>) -> Self {
        ExtractResponse::Failed {
            success: false,
            message: message.into(),
            original_url,
        }
    }
}

/// `POST /api/extract-image-url`. Scrape failures are reported in the body
/// with `success: false`, not as an HTTP error.
pub async fn extract_image_url(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ExtractRequest>,
) -> Result<Json<ExtractResponse>, ApiError> {
    let Some(page_url) = body.trakel_url.filter(|u| !u.trim().is_empty()) else {
        return Ok(Json(ExtractResponse::failed("A page URL is required", None)));
    };

    let response = match state.proxy.extract(&page_url, &state.config.server.public_url).await {
        Ok(image) => ExtractResponse::Found {
            success: true,
            image,
        },
        Err(e) => {
            tracing::warn!(url = %page_url, error = %e, "image extraction failed");
            ExtractResponse::failed(e.to_string(), Some(page_url))
        }
    };
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    url: Option<String>,
}

/// `GET /api/image-proxy?url=`: relay upstream image bytes with permissive
/// CORS and a one-day cache.
pub async fn image_proxy(State(state): State<AppState>, Query(query): Query<ProxyQuery>) -> Response {
    let Some(url) = query.url.filter(|u| !u.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "url parameter is required" })),
        )
            .into_response();
    };

    match state.proxy.fetch_image(&url).await {
        Ok(image) => (
            [
                (header::CONTENT_TYPE, image.content_type),
                (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*".to_string()),
                (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
            ],
            image.bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "image relay failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Image could not be loaded" })),
            )
                .into_response()
        }
    }
}
