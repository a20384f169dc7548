use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::model::ErrorResponse;
use crate::server::json_response;

pub const DEPLOYMENT_IMAGE_ERROR_MSG: &str = "Deployment image must be provided";
pub const KEY_FILE_ERROR_MSG: &str = "HZN_KEY_FILE environment is not exported";
pub const SIGN_ERROR_MSG: &str = "Error in signing deployment string with private key file";

#[derive(Debug, thiserror::Error)]
pub enum SigningServiceError {
    #[error("{0}")]
    MalformedRequest(String),
    /// The body could not be read, e.g. it exceeds the configured size limit.
    #[error("{message}")]
    UnreadableBody { status: StatusCode, message: String },
    #[error("{}", DEPLOYMENT_IMAGE_ERROR_MSG)]
    MissingImage,
    #[error("{}", KEY_FILE_ERROR_MSG)]
    KeyFileNotConfigured,
    #[error("{} {}", SIGN_ERROR_MSG, .0)]
    Signing(String),
}

impl SigningServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            SigningServiceError::UnreadableBody { status, .. } => *status,
            SigningServiceError::MalformedRequest(_) | SigningServiceError::MissingImage => {
                StatusCode::BAD_REQUEST
            }
            SigningServiceError::KeyFileNotConfigured | SigningServiceError::Signing(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Trait implementation to convert this error into a `{code, message}` JSON response
impl IntoResponse for SigningServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            code: status.as_u16(),
            message: self.to_string(),
        };
        json_response(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_request_returns_400() {
        let error = SigningServiceError::MalformedRequest("expected value".into());
        assert_eq!(error.to_string(), "expected value");
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unreadable_body_keeps_rejection_status() {
        let error = SigningServiceError::UnreadableBody {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: "length limit exceeded".into(),
        };
        assert_eq!(error.to_string(), "length limit exceeded");
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn missing_image_returns_400() {
        let error = SigningServiceError::MissingImage;
        assert_eq!(error.to_string(), "Deployment image must be provided");
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn key_file_not_configured_returns_500() {
        let error = SigningServiceError::KeyFileNotConfigured;
        assert_eq!(error.to_string(), "HZN_KEY_FILE environment is not exported");
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn signing_error_prefixes_cause() {
        let error = SigningServiceError::Signing("no such file".into());
        assert_eq!(
            error.to_string(),
            "Error in signing deployment string with private key file no such file"
        );
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
