//! Integration tests for the Beauty Shop API.
//!
//! # Running Tests
//!
//! ```bash
//! # Apply migrations and start the server
//! cargo run -p beauty-shop-cli -- migrate
//! cargo run -p beauty-shop-api
//!
//! # Run the ignored tests against it
//! cargo test -p beauty-shop-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `SHOP_API_URL` - Server base URL (default `http://localhost:8080`)
//! - `SHOP_DATABASE_URL` (or `DATABASE_URL`) - Same database the server uses;
//!   fixtures are written directly
//! - `JWT_SECRET` - Same secret the server uses; only needed by tests that
//!   mint tokens themselves
//!
//! The server should run with `SHOP_RATE_LIMIT=false`, since the suites log in
//! more often than the auth limiter allows.

use beauty_shop_api::db::UserRepository;
use beauty_shop_api::services::auth::{Identity, TokenService, hash_password};
use beauty_shop_core::{Email, Role, UserId};
use reqwest::Client;
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

/// Password given to every fixture account.
pub const TEST_PASSWORD: &str = "correct horse battery";

/// Shared handles for a test.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub pool: PgPool,
}

impl TestContext {
    /// Connect to the database and build an HTTP client.
    ///
    /// # Panics
    ///
    /// Panics if the database URL is missing or unreachable.
    pub async fn new() -> Self {
        let base_url =
            std::env::var("SHOP_API_URL").unwrap_or_else(|_| "http://localhost:8080".to_owned());
        let database_url = std::env::var("SHOP_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .expect("SHOP_DATABASE_URL must be set");

        let pool = beauty_shop_api::db::create_pool(&SecretString::from(database_url))
            .await
            .expect("Failed to connect to database");

        Self {
            client: Client::new(),
            base_url,
            pool,
        }
    }

    /// Absolute URL for an API path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// A unique address so tests never collide.
    #[must_use]
    pub fn unique_email(prefix: &str) -> String {
        format!("{prefix}-{}@example.com", Uuid::new_v4().simple())
    }

    /// Insert an account with [`TEST_PASSWORD`] and return its email.
    ///
    /// # Panics
    ///
    /// Panics if the insert fails.
    pub async fn create_account(&self, role: Role) -> String {
        let email = Self::unique_email("fixture");
        let hash = hash_password(TEST_PASSWORD).expect("hash");
        UserRepository::new(&self.pool)
            .create(&Email::parse(&email).expect("email"), Some("Fixture"), &hash, role)
            .await
            .expect("Failed to create account");
        email
    }

    /// Log in and return the bearer token.
    ///
    /// # Panics
    ///
    /// Panics if the login is rejected.
    pub async fn login(&self, email: &str) -> String {
        let resp = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": TEST_PASSWORD }))
            .send()
            .await
            .expect("login request");
        assert!(resp.status().is_success(), "login failed: {}", resp.status());

        let body: Value = resp.json().await.expect("login body");
        body.get("token")
            .and_then(Value::as_str)
            .expect("token in login response")
            .to_owned()
    }

    /// Sign a token the server accepts for `user_id`, whether or not the
    /// account exists.
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is unset.
    #[must_use]
    pub fn token_for(user_id: UserId, role: Role) -> String {
        let secret = std::env::var("JWT_SECRET").expect("JWT_SECRET must be set");
        TokenService::new(&SecretString::from(secret), 1)
            .issue(&Identity {
                user_id,
                email: Email::parse("ghost@example.com").expect("email"),
                role,
            })
            .expect("sign token")
    }

    /// Insert a category and a product in it; returns the product id.
    ///
    /// # Panics
    ///
    /// Panics if an insert fails.
    pub async fn create_product(&self, price: i64, stock: i32) -> Uuid {
        let tag = Uuid::new_v4().simple().to_string();

        let category_id: Uuid = sqlx::query_scalar(
            "INSERT INTO shop.categories (name, slug) VALUES ($1, $1) RETURNING id",
        )
        .bind(format!("fixture-{tag}"))
        .fetch_one(&self.pool)
        .await
        .expect("insert category");

        sqlx::query_scalar(
            r"
            INSERT INTO shop.products
                (name, slug, description, price, category_id, in_stock, stock_quantity)
            VALUES ($1, $1, 'fixture', $2, $3, $4 > 0, $4)
            RETURNING id
            ",
        )
        .bind(format!("product-{tag}"))
        .bind(price)
        .bind(category_id)
        .bind(stock)
        .fetch_one(&self.pool)
        .await
        .expect("insert product")
    }

    /// Current `(stock_quantity, in_stock)` of a product.
    ///
    /// # Panics
    ///
    /// Panics if the product does not exist.
    pub async fn stock(&self, product_id: Uuid) -> (i32, bool) {
        sqlx::query_as("SELECT stock_quantity, in_stock FROM shop.products WHERE id = $1")
            .bind(product_id)
            .fetch_one(&self.pool)
            .await
            .expect("select product")
    }

    /// Set pricing to 16 % tax, 500 shipping, free from 5000.
    ///
    /// # Panics
    ///
    /// Panics if the upsert fails.
    pub async fn reset_store_settings(&self) {
        beauty_shop_api::db::settings::set_setting(
            &self.pool,
            beauty_shop_api::db::settings::STORE_SETTINGS_KEY,
            &json!({
                "name": "Beauty Shop",
                "currency": "KES",
                "tax": { "rate": 16 },
                "shipping": { "standardShippingRate": 500, "freeShippingThreshold": 5000 },
            }),
        )
        .await
        .expect("upsert settings");
    }
}

/// A create-order body for the given `(product_id, quantity)` lines.
#[must_use]
pub fn order_body(lines: &[(Uuid, i64)]) -> Value {
    let items: Vec<Value> = lines
        .iter()
        .map(|(id, quantity)| json!({ "productId": id, "quantity": quantity }))
        .collect();

    json!({
        "items": items,
        "shippingAddress": { "street": "Moi Avenue 1", "city": "Nairobi" },
        "paymentMethod": "mpesa",
    })
}
