//! Response envelope and error conversion shared by all handlers.
//!
//! Every JSON body follows the same shape:
//! - `success`: whether the request succeeded
//! - `data`: payload on success
//! - `message`: human-readable message
//! - `error`: machine-readable `error_type` plus optional field `details`
//! - `timestamp`: RFC 3339 time the response was produced
//!
//! Service-layer errors are converted with [`service_error_to_http`]; validation
//! errors from `validator` keep their per-field details.

use crate::errors::ServiceError;
use axum::{Json, http::StatusCode};
use serde::{Deserialize, Serialize};

/// Error half of every handler result.
pub type HttpError = (StatusCode, Json<ApiResponse<()>>);

/// Standard API response wrapper for all endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Indicates if the request was successful
    pub success: bool,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Human-readable message
    pub message: String,
    /// Error details (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
    /// Request timestamp
    pub timestamp: String,
}

/// Items of a list endpoint together with the unpaginated total
#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedData<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub skip: i64,
    pub limit: i64,
}

/// Error details for failed requests
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Machine-readable error type identifier
    pub error_type: String,
    /// Field-specific validation errors when applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// Field-specific validation error details
#[derive(Debug, Serialize, Deserialize)]
pub struct FieldError {
    /// Name of the field with validation error
    pub field: String,
    /// Description of the validation failure
    pub message: String,
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create a successful response with default message
    pub fn ok(data: T) -> Self {
        Self::success(data, "Request successful")
    }

    /// Create an error response
    pub fn error(
        message: impl Into<String>,
        error_type: impl Into<String>,
        details: Option<Vec<FieldError>>,
    ) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message: message.into(),
            error: Some(ErrorDetails {
                error_type: error_type.into(),
                details,
            }),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Converts ServiceError to appropriate HTTP response with standard format
pub fn service_error_to_http(error: ServiceError) -> HttpError {
    let (status, error_type, message) = match error {
        ServiceError::Validation { message } => {
            (StatusCode::BAD_REQUEST, "validation_error", message)
        }
        ServiceError::NotFound { entity, identifier } => (
            StatusCode::NOT_FOUND,
            "not_found",
            format!("{} '{}' not found", entity, identifier),
        ),
        error @ ServiceError::AlreadyExists { .. } => {
            (StatusCode::BAD_REQUEST, "already_exists", error.to_string())
        }
        ServiceError::Unauthorized { message } => {
            (StatusCode::UNAUTHORIZED, "unauthorized", message)
        }
        ServiceError::Database { source } => {
            tracing::error!("Database error: {}", source);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "database_error",
                "Internal server error".to_string(),
            )
        }
        ServiceError::InternalError { message } => {
            tracing::error!("Internal error: {}", message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error".to_string(),
            )
        }
    };

    (status, Json(ApiResponse::<()>::error(message, error_type, None)))
}

/// Formats validator::ValidationErrors into field-specific error details
pub fn validation_errors_to_field_errors(errors: validator::ValidationErrors) -> Vec<FieldError> {
    errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| FieldError {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .unwrap_or(&"Invalid value".into())
                    .to_string(),
            })
        })
        .collect()
}

/// Helper to create validation error response
pub fn validation_error_response(errors: validator::ValidationErrors) -> HttpError {
    let field_errors = validation_errors_to_field_errors(errors);
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error(
            "Validation failed",
            "validation_error",
            Some(field_errors),
        )),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Payload {
        #[validate(length(min = 1, message = "Email is required"))]
        email: String,
    }

    #[test]
    fn test_service_error_status_mapping() {
        let cases = [
            (ServiceError::validation("bad"), StatusCode::BAD_REQUEST),
            (ServiceError::not_found("User", "1"), StatusCode::NOT_FOUND),
            (
                ServiceError::already_exists("User", "email"),
                StatusCode::BAD_REQUEST,
            ),
            (ServiceError::unauthorized("no"), StatusCode::UNAUTHORIZED),
            (
                ServiceError::internal_error("boom"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            let (status, Json(body)) = service_error_to_http(error);
            assert_eq!(status, expected);
            assert!(!body.success);
        }
    }

    #[test]
    fn test_duplicate_message() {
        let (_, Json(body)) = service_error_to_http(ServiceError::already_exists("User", "email"));
        assert_eq!(body.message, "User with this email already exists");
        assert_eq!(body.error.unwrap().error_type, "already_exists");
    }

    #[test]
    fn test_internal_details_not_exposed() {
        let (_, Json(body)) =
            service_error_to_http(ServiceError::from(anyhow::anyhow!("disk I/O error at /var")));
        assert_eq!(body.message, "Internal server error");
        assert_eq!(body.error.unwrap().error_type, "database_error");
    }

    #[test]
    fn test_validation_error_response_lists_fields() {
        let errors = Payload {
            email: String::new(),
        }
        .validate()
        .unwrap_err();

        let (status, Json(body)) = validation_error_response(errors);
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let details = body.error.unwrap().details.unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].field, "email");
        assert_eq!(details[0].message, "Email is required");
    }
}
