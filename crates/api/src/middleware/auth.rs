//! Bearer token extractors.
//!
//! Route handlers take [`RequireAuth`] or [`RequireAdmin`] to obtain the
//! verified caller. Both reject with a JSON `AppError`.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::services::auth::{Identity, TokenError};
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(identity): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", identity.email)
/// }
/// ```
pub struct RequireAuth(pub Identity);

/// Extractor that requires a valid bearer token with the `ADMIN` role.
pub struct RequireAdmin(pub Identity);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_owned()))?;

        let identity = state.tokens().verify(token).map_err(|e| {
            let message = match e {
                TokenError::Expired => "Token expired",
                TokenError::Invalid | TokenError::Encode(_) => "Invalid token",
            };
            AppError::Unauthorized(message.to_owned())
        })?;

        set_sentry_user(&identity.user_id, Some(identity.email.as_str()));
        tracing::Span::current().record("user_id", tracing::field::display(identity.user_id));

        Ok(Self(identity))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(identity) = RequireAuth::from_request_parts(parts, state).await?;

        if !identity.is_admin() {
            return Err(AppError::Forbidden("Admin access required".to_owned()));
        }

        Ok(Self(identity))
    }
}

/// The token from an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
