//! Error handling for the folio HTTP layer

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::{NoContext, Timestamp, Uuid};

/// One entry of the `details` array of a validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub error: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            error: error.into(),
        }
    }

    pub fn required(field: impl Into<String>) -> Self {
        Self::new(field, "required")
    }
}

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {message}")]
    Validation {
        details: Vec<serde_json::Value>,
        code: String,
        message: String,
    },

    #[error("not found: {message}")]
    NotFound { message: String, code: String },

    #[error("bad request: {message}")]
    BadRequest { message: String, code: String },

    #[error("upstream error: {message}")]
    Upstream { message: String, code: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a validation error
    pub fn validation(details: Vec<serde_json::Value>, message: impl Into<String>) -> Self {
        Self::Validation {
            details,
            code: "validation_error".to_string(),
            message: message.into(),
        }
    }

    /// Create a validation error from per-field failures
    pub fn invalid_fields(fields: Vec<FieldError>) -> Self {
        let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
        let message = format!("invalid request fields: {}", names.join(", "));
        let details = fields.iter().map(|f| json!(f)).collect();
        Self::validation(details, message)
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            code: "not_found".to_string(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            code: "bad_request".to_string(),
        }
    }

    /// Create an error for a failed call to a remote service
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
            code: "upstream_error".to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            // Well-formed JSON that does not fit the schema (missing or mistyped fields).
            JsonRejection::JsonDataError(err) => {
                let detail = data_error_detail(&err.body_text());
                Self::validation(
                    vec![json!(detail)],
                    "request body does not match the expected schema",
                )
            }
            other => Self::bad_request(other.body_text()),
        }
    }
}

/// Split axum's `"...target type: <path>: <reason>"` text into a field error.
/// Errors at the document root are reported against `body`.
fn data_error_detail(text: &str) -> FieldError {
    let reason = text
        .split_once("target type: ")
        .map_or(text, |(_, reason)| reason);

    match reason.split_once(": ") {
        Some((path, rest)) if !path.is_empty() && path != "." && !path.contains(char::is_whitespace) => {
            FieldError::new(path, rest)
        }
        _ => FieldError::new("body", reason),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v7(Timestamp::now(NoContext));
        let timestamp = OffsetDateTime::now_utc().to_string();
        let status = self.status();

        let (error_code, message, details) = match self {
            AppError::Validation {
                details,
                code,
                message,
            } => (code, message, Some(details)),
            AppError::NotFound { message, code }
            | AppError::BadRequest { message, code }
            | AppError::Upstream { message, code } => (code, message, None),
            AppError::Internal(e) => ("internal_error".to_string(), format!("{e:#}"), None),
        };

        if status.is_server_error() {
            tracing::error!(
                error_id = %error_id,
                error_code = %error_code,
                status_code = %status.as_u16(),
                error = %message,
                "Request error"
            );
        } else {
            tracing::warn!(
                error_id = %error_id,
                error_code = %error_code,
                status_code = %status.as_u16(),
                "Request rejected"
            );
        }

        // Release builds hide internal error details
        let message = if cfg!(not(debug_assertions)) && status == StatusCode::INTERNAL_SERVER_ERROR
        {
            "An internal server error occurred".to_string()
        } else {
            message
        };

        let error_response = json!({
            "error": {
                "code": error_code,
                "message": message,
                "details": details.unwrap_or_default(),
                "trace_id": error_id.to_string(),
                "timestamp": timestamp
            }
        });

        (status, Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_validation_error() {
        let details = vec![serde_json::json!({"field": "title", "error": "required"})];
        let error = AppError::validation(details.clone(), "Validation failed");

        match error {
            AppError::Validation {
                details: d,
                code,
                message,
            } => {
                assert_eq!(d, details);
                assert_eq!(code, "validation_error");
                assert_eq!(message, "Validation failed");
            }
            _ => panic!("Expected Validation error"),
        }
    }

    #[tokio::test]
    async fn test_invalid_fields_lists_every_field() {
        let error = AppError::invalid_fields(vec![
            FieldError::required("content"),
            FieldError::required("title"),
        ]);
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "validation_error");
        assert_eq!(body["error"]["details"][0]["field"], "content");
        assert_eq!(body["error"]["details"][1]["field"], "title");
        assert_eq!(body["error"]["details"][1]["error"], "required");
    }

    #[test]
    fn test_error_response_mapping() {
        assert_eq!(
            AppError::not_found("Resource not found").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::upstream("cover download failed")
                .into_response()
                .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::bad_request("broken json").into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_internal_error_mapping() {
        let internal_error = anyhow::anyhow!("PDF rendering failed");
        let error = AppError::Internal(internal_error);
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[derive(Debug, serde::Deserialize)]
    #[allow(dead_code)]
    struct Titled {
        title: String,
    }

    async fn json_rejection(body: &'static str) -> JsonRejection {
        use axum::extract::FromRequest;

        let request = axum::http::Request::builder()
            .method("POST")
            .header(axum::http::header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(body))
            .unwrap();
        Json::<Titled>::from_request(request, &()).await.unwrap_err()
    }

    #[tokio::test]
    async fn test_type_errors_name_the_field() {
        let error = AppError::from(json_rejection(r#"{"title": 42}"#).await);
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        let detail = &body["error"]["details"][0];
        assert_eq!(detail["field"], "title");
        assert!(detail["error"].as_str().unwrap().contains("invalid type"));
    }

    #[tokio::test]
    async fn test_root_type_errors_are_reported_against_body() {
        let error = AppError::from(json_rejection("[1, 2]").await);
        let body = body_json(error.into_response()).await;
        assert_eq!(body["error"]["details"][0]["field"], "body");
        assert!(body["error"]["details"][0]["error"].is_string());
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_bad_request() {
        let error = AppError::from(json_rejection(r#"{"title": "#).await);
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_data_error_text_without_a_path() {
        let detail = data_error_detail(
            "Failed to deserialize the JSON body into the target type: missing field `title` at line 1 column 2",
        );
        assert_eq!(detail.field, "body");
        assert!(detail.error.starts_with("missing field"));
    }

    #[tokio::test]
    async fn test_error_response_format() {
        let response = AppError::not_found("Test resource not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        let error = &body["error"];
        assert_eq!(error["code"], "not_found");
        assert_eq!(error["message"], "Test resource not found");
        assert!(error["details"].as_array().unwrap().is_empty());
        assert!(Uuid::parse_str(error["trace_id"].as_str().unwrap()).is_ok());
        assert!(!error["timestamp"].as_str().unwrap().is_empty());
    }
}
