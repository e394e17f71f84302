//! HTTP error responses.
//!
//! Handlers return `Result<_, ApiError>`. Every module error converts into an
//! `ApiError` with its status already chosen, and renders as
//! `{ "success": false, "message": ..., "error": ... }`.

use crate::catalog::CatalogError;
use crate::ingest::{ErrorCategory, IngestError, IngestErrorKind};
use crate::validation::ValidationError;
use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use tokio::task::JoinError;

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    error: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            error: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>, cause: impl fmt::Display) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message).with_cause(cause)
    }

    /// Attach the underlying cause, reported in the `error` field.
    pub fn with_cause(mut self, cause: impl fmt::Display) -> Self {
        self.error = Some(cause.to_string());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(cause) => write!(f, "{} ({}): {}", self.message, self.status, cause),
            None => write!(f, "{} ({})", self.message, self.status),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        let status = if err.is_too_large() {
            StatusCode::PAYLOAD_TOO_LARGE
        } else {
            StatusCode::BAD_REQUEST
        };
        Self::new(status, err.to_string())
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match (&err.kind, err.category()) {
            (IngestErrorKind::Validation(validation), _) => validation.clone().into(),
            (_, ErrorCategory::Codec) => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, "Photo could not be processed")
                    .with_cause(&err)
            }
            _ => Self::internal("Photo upload failed", &err),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        Self::internal("Data file error", err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), "Invalid request body").with_cause(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::new(err.status(), "Could not read upload").with_cause(err.body_text())
    }
}

impl From<JoinError> for ApiError {
    fn from(err: JoinError) -> Self {
        Self::internal("Background task failed", err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, message = %self.message, error = ?self.error, "request failed");
        } else {
            tracing::warn!(status = %self.status, message = %self.message, error = ?self.error, "request rejected");
        }
        let body = ErrorBody {
            success: false,
            message: self.message,
            error: self.error,
        };
        (self.status, Json(body)).into_response()
    }
}

/// `Json<T>` whose rejection renders as an [`ApiError`].
#[derive(Debug, Clone, Copy)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::CodecError;
    use crate::ingest::Stage;

    #[test]
    fn oversize_maps_to_413() {
        let err: ApiError = ValidationError::FileTooLarge {
            filename: "a.jpg".into(),
            size: 11,
            max: 10,
        }
        .into();
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn unsupported_format_maps_to_400_with_message() {
        let err: ApiError = ValidationError::UnsupportedFormat {
            filename: "a.gif".into(),
            accepted: vec!["JPG".into(), "JPEG".into(), "PNG".into()],
        }
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "a.gif: only JPG, JPEG, PNG formats are accepted");
    }

    #[test]
    fn ingest_categories_map_to_statuses() {
        let validation = IngestError {
            stage: Stage::Validating,
            kind: IngestErrorKind::Validation(ValidationError::NoFiles),
        };
        assert_eq!(ApiError::from(validation).status(), StatusCode::BAD_REQUEST);

        let codec = IngestError {
            stage: Stage::Encoding,
            kind: IngestErrorKind::Codec {
                filename: "x.jpg".into(),
                source: CodecError::Decode("bad".into()),
            },
        };
        let err = ApiError::from(codec);
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.to_string().contains("x.jpg"));

        let storage = IngestError {
            stage: Stage::Cataloging,
            kind: IngestErrorKind::Output {
                path: "/nowhere".into(),
                source: std::io::Error::other("disk full"),
            },
        };
        assert_eq!(ApiError::from(storage).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
