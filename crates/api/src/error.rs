//! Unified error handling with Sentry integration.
//!
//! Every route handler returns `Result<T, AppError>`. Server errors are
//! captured to Sentry and logged before the response is built; clients only
//! ever see `{ "success": false, "error": "<message>" }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::db::categories::CategoryWriteError;
use crate::services::auth::{AuthError, TokenError};
use crate::services::orders::OrderError;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Order placement failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Category write failed.
    #[error("Category error: {0}")]
    Category(#[from] CategoryWriteError),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("{0}")]
    Unauthorized(String),

    /// Caller is authenticated but not allowed.
    #[error("{0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// Conflicts with existing data.
    #[error("{0}")]
    Conflict(String),

    /// Rate limited.
    #[error("Too many requests")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status and client-facing message.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Database(err) => repository_response(err),
            Self::Auth(err) => auth_response(err),
            Self::Order(err) => order_response(err),
            Self::Category(err) => match err {
                CategoryWriteError::Tree(e) => (StatusCode::BAD_REQUEST, e.to_string()),
                CategoryWriteError::MissingName | CategoryWriteError::InvalidSlug => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                CategoryWriteError::NotFound => (StatusCode::NOT_FOUND, err.to_string()),
                CategoryWriteError::Repository(e) => repository_response(e),
            },
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::RateLimited => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            Self::Internal(_) => internal(),
        }
    }
}

fn internal() -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_owned())
}

fn repository_response(err: &RepositoryError) -> (StatusCode, String) {
    match err {
        RepositoryError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_owned()),
        RepositoryError::Conflict(what) => (StatusCode::CONFLICT, capitalize(what)),
        RepositoryError::Database(_)
        | RepositoryError::Contention(_)
        | RepositoryError::DataCorruption(_) => internal(),
    }
}

fn auth_response(err: &AuthError) -> (StatusCode, String) {
    match err {
        AuthError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            "Invalid email or password".to_owned(),
        ),
        AuthError::UserNotFound | AuthError::Token(TokenError::Invalid | TokenError::Expired) => (
            StatusCode::UNAUTHORIZED,
            "Invalid or expired token".to_owned(),
        ),
        AuthError::UserAlreadyExists => (
            StatusCode::CONFLICT,
            "An account with this email already exists".to_owned(),
        ),
        AuthError::WeakPassword(msg) => (StatusCode::BAD_REQUEST, capitalize(msg)),
        AuthError::InvalidEmail(_) => (StatusCode::BAD_REQUEST, "Invalid email address".to_owned()),
        AuthError::Repository(e) => repository_response(e),
        AuthError::Token(TokenError::Encode(_)) | AuthError::PasswordHash => internal(),
    }
}

fn order_response(err: &OrderError) -> (StatusCode, String) {
    match err {
        OrderError::AccountNotFound(_) => (StatusCode::UNAUTHORIZED, err.to_string()),
        OrderError::InvalidRequest(_)
        | OrderError::ProductNotFound(_)
        | OrderError::OutOfStock(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        OrderError::Repository(e) => repository_response(e),
        OrderError::Pricing(_) | OrderError::OrderNumberExhausted => internal(),
    }
}

fn capitalize(msg: &str) -> String {
    let mut chars = msg.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the current request.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use http_body_util::BodyExt;
    use serde_json::Value;

    use beauty_shop_core::{OrderRequestError, ProductId, UserId};

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    async fn body(err: AppError) -> Value {
        let bytes = err.into_response().into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(get_status(AppError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(get_status(AppError::Unauthorized("x".into())), StatusCode::UNAUTHORIZED);
        assert_eq!(get_status(AppError::Forbidden("x".into())), StatusCode::FORBIDDEN);
        assert_eq!(get_status(AppError::BadRequest("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(get_status(AppError::Conflict("x".into())), StatusCode::CONFLICT);
        assert_eq!(get_status(AppError::RateLimited), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            get_status(AppError::Internal("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_order_errors_are_client_errors() {
        assert_eq!(
            get_status(OrderError::OutOfStock("Serum".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(OrderError::ProductNotFound(ProductId::generate()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(OrderError::InvalidRequest(OrderRequestError::NoItems).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(OrderError::OrderNumberExhausted.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_errors() {
        assert_eq!(
            get_status(AuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AuthError::UserAlreadyExists.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AuthError::Token(TokenError::Expired).into()),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_repository_conflict_maps_to_409() {
        let err = AppError::Database(RepositoryError::Conflict("category slug already exists".into()));
        assert_eq!(get_status(err), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_body_shape() {
        let json = body(OrderError::InvalidRequest(OrderRequestError::NoItems).into()).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Order must contain at least one item");
    }

    #[tokio::test]
    async fn test_deleted_account_is_unauthorized() {
        let err: AppError = OrderError::AccountNotFound(UserId::generate()).into();
        assert_eq!(err.status_and_message().0, StatusCode::UNAUTHORIZED);

        let json = body(err).await;
        assert_eq!(json["error"], "User not found");
    }

    #[tokio::test]
    async fn test_internal_details_hidden() {
        let json = body(AppError::Internal("connection refused at 10.0.0.3".into())).await;
        assert_eq!(json["error"], INTERNAL_MESSAGE);

        let json = body(AppError::Database(RepositoryError::DataCorruption("bad row".into()))).await;
        assert_eq!(json["error"], INTERNAL_MESSAGE);
    }
}
