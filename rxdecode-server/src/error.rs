use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced to HTTP clients as `{"error": "..."}` bodies.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing fields")]
    MissingFields,

    #[error("No image provided")]
    NoImage,

    #[error("Please enter a medicine name")]
    EmptyQuery,

    #[error("Invalid image encoding")]
    InvalidImageEncoding,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("No session")]
    NoSession,

    #[error("Invalid session")]
    InvalidSession,

    #[error("User not found")]
    UserNotFound,

    #[error("Email already in use")]
    EmailInUse,

    #[error("Rate limit reached")]
    RateLimited,

    #[error("Failed to process the prescription")]
    ProcessingFailed,

    /// Extraction ran but identified no medicines; the OCR text is kept so
    /// clients can still show the user what was read from the image.
    #[error("No medicines found in the prescription")]
    NoMedicinesFound { extracted_text: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFields
            | ApiError::NoImage
            | ApiError::EmptyQuery
            | ApiError::InvalidImageEncoding => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials | ApiError::NoSession | ApiError::InvalidSession => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::UserNotFound => StatusCode::NOT_FOUND,
            ApiError::EmailInUse => StatusCode::CONFLICT,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::NoMedicinesFound { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ProcessingFailed => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::NoMedicinesFound { extracted_text } => Json(json!({
                "error": self.to_string(),
                "extractedText": extracted_text,
            })),
            _ => Json(json!({ "error": self.to_string() })),
        };
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_auth_errors_to_documented_status_codes() {
        assert_eq!(ApiError::MissingFields.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::UserNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::EmailInUse.status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::Internal("boom".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn maps_pipeline_notices_to_status_codes() {
        assert_eq!(ApiError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(ApiError::ProcessingFailed.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ApiError::NoMedicinesFound {
                extracted_text: String::new()
            }
            .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[tokio::test]
    async fn no_medicines_body_carries_the_extracted_text() {
        let error = ApiError::NoMedicinesFound {
            extracted_text: "Vitamin schedule\nDr. Smith".to_string(),
        };
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["extractedText"], "Vitamin schedule\nDr. Smith");
        assert_eq!(body["error"], "No medicines found in the prescription");
    }

    #[tokio::test]
    async fn other_errors_keep_the_plain_error_body() {
        let response = ApiError::RateLimited.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Rate limit reached");
        assert!(body.get("extractedText").is_none());
    }
}
