//! Authentication route handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use super::json_body;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::User;
use crate::services::auth::{AuthService, Session};
use crate::state::AppState;

/// Login form data.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Token plus the account it was issued for.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

impl From<Session> for AuthResponse {
    fn from(session: Session) -> Self {
        Self {
            token: session.token,
            user: session.user,
        }
    }
}

/// Exchange email and password for a bearer token.
#[tracing::instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let form = json_body(payload)?;
    let auth = AuthService::new(state.pool(), state.tokens());

    let session = auth
        .login(&form.email, &form.password)
        .await
        .inspect_err(|e| tracing::debug!(error = %e, "Login failed"))?;

    Ok(Json(session.into()))
}

/// Create a customer account and return its first token.
#[tracing::instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let form = json_body(payload)?;
    let auth = AuthService::new(state.pool(), state.tokens());

    let session = auth
        .register(&form.email, &form.password, form.name.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(session.into())))
}

/// The account behind the bearer token.
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
) -> Result<Json<User>> {
    let auth = AuthService::new(state.pool(), state.tokens());
    Ok(Json(auth.current_user(identity.user_id).await?))
}
