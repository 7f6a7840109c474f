//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness
//! GET  /health/ready                - Readiness (database reachable)
//!
//! # Auth (login/register rate limited)
//! POST /api/auth/login              - Exchange credentials for a token
//! POST /api/auth/register           - Create a customer account
//! GET  /api/auth/me                 - Current account (bearer)
//!
//! # Catalog
//! GET  /api/products                - Product listing (?category, ?featured, ?page, ?limit)
//! GET  /api/products/{slug}         - Product detail
//! GET  /api/categories              - Category listing
//! GET  /api/categories/{slug}       - Category with parent and children
//! GET  /api/settings                - Store settings
//!
//! # Orders (bearer)
//! GET  /api/orders                  - Caller's orders
//! POST /api/orders                  - Place an order
//!
//! # Admin (ADMIN bearer)
//! PUT  /api/admin/settings          - Replace store settings
//! GET  /api/admin/orders            - All orders (?status, ?page, ?limit)
//! GET  /api/admin/customers         - Customers (?search, ?sort, ?page, ?limit)
//! GET  /api/admin/customers/{id}    - Customer with recent orders
//! POST /api/admin/categories        - Create category
//! PUT  /api/admin/categories/{id}   - Update category
//! ```

pub mod admin;
pub mod auth;
pub mod categories;
pub mod orders;
pub mod products;
pub mod settings;

use axum::{
    Json, Router,
    extract::{Request, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::middleware::{auth_rate_limiter, request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// Unwrap a JSON body, turning a parse failure into a 400.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// Create the auth routes router.
///
/// Login and register are throttled per client IP when `rate_limited` is set.
pub fn auth_routes(rate_limited: bool, trust_proxy_headers: bool) -> Router<AppState> {
    let credentials = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register));

    let credentials = if rate_limited {
        credentials.layer(auth_rate_limiter(trust_proxy_headers))
    } else {
        credentials
    };

    credentials.route("/me", get(auth::me))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/{slug}", get(products::show))
        .route("/categories", get(categories::index))
        .route("/categories/{slug}", get(categories::show))
        .route("/settings", get(settings::show))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new().route("/", get(orders::index).post(orders::create))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/settings", put(admin::update_settings))
        .route("/orders", get(admin::list_orders))
        .route("/customers", get(admin::list_customers))
        .route("/customers/{id}", get(admin::show_customer))
        .route("/categories", post(admin::create_category))
        .route("/categories/{id}", put(admin::update_category))
}

/// Build the complete application with its middleware stack.
pub fn router(state: AppState) -> Router {
    let rate_limited = state.config().rate_limit_enabled;
    let trust_proxy_headers = state.config().trust_proxy_headers;

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api/auth", auth_routes(rate_limited, trust_proxy_headers))
        .nest("/api/orders", order_routes())
        .nest("/api/admin", admin_routes())
        .nest("/api", catalog_routes())
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
                user_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use axum::{
        body::Body,
        http::{HeaderValue, header},
    };
    use chrono::{Duration, Utc};
    use http_body_util::BodyExt;
    use secrecy::SecretString;
    use serde_json::{Value, json};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use beauty_shop_core::{Email, Role, UserId};

    use super::*;
    use crate::config::ApiConfig;
    use crate::middleware::REQUEST_ID_HEADER;
    use crate::services::auth::Identity;

    const SECRET: &str = "Zq8!mW2#vR5$kT9&xP3*nB7^cJ4@hL6%";

    /// State whose pool never connects; only paths that stop before the
    /// database are exercised here.
    fn test_state() -> AppState {
        let config = ApiConfig {
            database_url: SecretString::from("postgres://localhost:1/beauty_shop_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
            jwt_secret: SecretString::from(SECRET),
            token_ttl_hours: 24,
            rate_limit_enabled: false,
            trust_proxy_headers: false,
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
        };
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost:1/beauty_shop_test")
            .unwrap();
        AppState::new(config, pool)
    }

    fn token(state: &AppState, role: Role) -> String {
        state
            .tokens()
            .issue(&Identity {
                user_id: UserId::generate(),
                email: Email::parse("jane@example.com").unwrap(),
                role,
            })
            .unwrap()
    }

    fn request(method: &str, uri: &str, bearer: Option<&str>, body: Option<&str>) -> Request {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_owned()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(state: AppState, req: Request) -> (StatusCode, axum::http::HeaderMap, Value) {
        let response = router(state).oneshot(req).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, body)
    }

    #[tokio::test]
    async fn test_health() {
        let response = router(test_state())
            .oneshot(request("GET", "/health", None, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn test_request_id_echoed() {
        let mut req = request("GET", "/health", None, None);
        req.headers_mut()
            .insert(REQUEST_ID_HEADER, HeaderValue::from_static("req-1234"));

        let (_, headers, _) = send(test_state(), req).await;
        assert_eq!(headers[REQUEST_ID_HEADER], "req-1234");
    }

    #[tokio::test]
    async fn test_security_headers() {
        let (_, headers, _) = send(test_state(), request("GET", "/health", None, None)).await;
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
        assert!(!headers.contains_key(header::CACHE_CONTROL));

        let (_, headers, _) = send(
            test_state(),
            request("POST", "/api/auth/login", None, Some("{")),
        )
        .await;
        assert_eq!(headers[header::CACHE_CONTROL], "no-store");
    }

    #[tokio::test]
    async fn test_orders_require_token() {
        let (status, _, body) = send(test_state(), request("GET", "/api/orders", None, None)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let (status, _, _) = send(
            test_state(),
            request("GET", "/api/orders", Some("not.a.token"), None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let state = test_state();
        let expired = state
            .tokens()
            .issue_at(
                &Identity {
                    user_id: UserId::generate(),
                    email: Email::parse("jane@example.com").unwrap(),
                    role: Role::User,
                },
                Utc::now() - Duration::hours(48),
            )
            .unwrap();

        let (status, _, body) = send(
            state,
            request("POST", "/api/orders", Some(&expired), Some("{}")),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Token expired");
    }

    #[tokio::test]
    async fn test_admin_routes_forbid_customers() {
        let state = test_state();
        let user = token(&state, Role::User);

        let (status, _, body) = send(
            state,
            request("GET", "/api/admin/orders", Some(&user), None),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Admin access required");
    }

    #[tokio::test]
    async fn test_empty_cart_rejected_before_storage() {
        let state = test_state();
        let user = token(&state, Role::User);
        let payload = json!({
            "items": [],
            "shippingAddress": { "city": "Nairobi" },
            "paymentMethod": "mpesa",
        })
        .to_string();

        let (status, _, body) = send(
            state,
            request("POST", "/api/orders", Some(&user), Some(&payload)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Order must contain at least one item");
    }

    #[tokio::test]
    async fn test_zero_quantity_rejected() {
        let state = test_state();
        let user = token(&state, Role::User);
        let payload = json!({
            "items": [{ "productId": UserId::generate().to_string(), "quantity": 0 }],
            "shippingAddress": { "city": "Nairobi" },
            "paymentMethod": "mpesa",
        })
        .to_string();

        let (status, _, body) = send(
            state,
            request("POST", "/api/orders", Some(&user), Some(&payload)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Quantity must be at least 1");
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let state = test_state();
        let user = token(&state, Role::User);

        let (status, _, body) = send(
            state,
            request("POST", "/api/orders", Some(&user), Some("{\"items\": [")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_settings_must_be_object() {
        let state = test_state();
        let admin = token(&state, Role::Admin);

        let (status, _, _) = send(
            state,
            request("PUT", "/api/admin/settings", Some(&admin), Some("[1, 2]")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_customer_routes_are_admin_only() {
        let state = test_state();
        let user = token(&state, Role::User);

        for uri in ["/api/admin/customers", "/api/admin/customers/not-a-uuid"] {
            let (status, _, _) = send(state.clone(), request("GET", uri, Some(&user), None)).await;
            assert_eq!(status, StatusCode::FORBIDDEN);
        }
    }

    #[tokio::test]
    async fn test_customer_id_must_be_uuid() {
        let state = test_state();
        let admin = token(&state, Role::Admin);

        let (status, _, body) = send(
            state,
            request("GET", "/api/admin/customers/jane", Some(&admin), None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid customer ID: jane");
    }

    #[tokio::test]
    async fn test_category_id_must_be_uuid() {
        let state = test_state();
        let admin = token(&state, Role::Admin);

        let (status, _, body) = send(
            state,
            request(
                "PUT",
                "/api/admin/categories/skincare",
                Some(&admin),
                Some("{\"name\": \"Skin\"}"),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid category ID: skincare");
    }
}
