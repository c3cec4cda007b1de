//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Every error renders as the `{success: false, message}` envelope.

use axum::{
    Json,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::payments::GatewayError;
use crate::response::Envelope;
use crate::services::auth::{AuthError, TokenError};
use crate::services::catalog::CatalogError;
use crate::services::orders::OrderError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource already exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller lacks the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Payment gateway operation failed.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Gateway(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(
            self,
            Self::Database(_) | Self::Internal(_) | Self::Gateway(_)
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let message = match self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Gateway(_) => "Payment service error".to_string(),
            Self::Validation(m)
            | Self::Conflict(m)
            | Self::NotFound(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m) => m,
        };

        (status, Json(Envelope::failure(message))).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(m) => Self::Validation(m),
            AuthError::InvalidEmail(_) => Self::Validation("Invalid email address".into()),
            AuthError::UserNotFound => Self::NotFound("Email is not registered".into()),
            AuthError::InvalidCredentials => Self::Unauthorized("Invalid password".into()),
            AuthError::UserAlreadyExists => {
                Self::Conflict("Already registered, please login".into())
            }
            AuthError::WrongEmailOrAnswer => Self::NotFound("Wrong Email or Answer".into()),
            AuthError::Repository(RepositoryError::NotFound) => {
                Self::NotFound("User not found".into())
            }
            AuthError::Repository(e) => Self::Database(e),
            AuthError::Token(e) => Self::Internal(e.to_string()),
            AuthError::PasswordHash => Self::Internal("password hashing failed".into()),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation(m) => Self::Validation(m),
            CatalogError::NotFound(what) => Self::NotFound(format!("{what} not found")),
            CatalogError::Conflict(m) => Self::Conflict(m),
            CatalogError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Validation(m) => Self::Validation(m),
            OrderError::UnknownBuyer => Self::Unauthorized("Account no longer exists".into()),
            OrderError::NotFound => Self::NotFound("Order not found".into()),
            OrderError::Gateway(e) => Self::Gateway(e),
            OrderError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        tracing::debug!(error = %err, "Rejected session token");
        Self::Unauthorized("Invalid or expired token".into())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        Self::Validation(err.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Called by the auth extractors to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::Validation("invalid input".to_string());
        assert_eq!(err.to_string(), "Validation error: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::Validation("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Gateway(GatewayError::Status(500))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let body = body_json(AppError::NotFound("Product not found".into()).into_response()).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Product not found");
    }

    #[tokio::test]
    async fn test_internal_details_are_not_echoed() {
        let response = AppError::Internal("connection refused at 10.0.0.3".into()).into_response();
        let body = body_json(response).await;
        assert_eq!(body["message"], "Internal server error");

        let response =
            AppError::Gateway(GatewayError::GraphQL(vec!["merchant suspended".into()])).into_response();
        let body = body_json(response).await;
        assert_eq!(body["message"], "Payment service error");
    }

    #[test]
    fn test_service_errors_map_to_taxonomy() {
        assert!(matches!(
            AppError::from(AuthError::UserAlreadyExists),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(AuthError::UserNotFound),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(AuthError::InvalidCredentials),
            AppError::Unauthorized(_)
        ));
        assert!(matches!(
            AppError::from(AuthError::WrongEmailOrAnswer),
            AppError::NotFound(ref m) if m == "Wrong Email or Answer"
        ));
        assert!(matches!(
            AppError::from(CatalogError::NotFound("Category")),
            AppError::NotFound(ref m) if m == "Category not found"
        ));
        assert!(matches!(
            AppError::from(OrderError::Gateway(GatewayError::Status(503))),
            AppError::Gateway(_)
        ));
        assert!(matches!(
            AppError::from(OrderError::UnknownBuyer),
            AppError::Unauthorized(_)
        ));
    }
}
