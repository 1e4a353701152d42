//! Integration tests for the Fast Lanche API.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and apply migrations
//! task db:start
//! cargo run -p fastlanche-cli -- migrate
//!
//! # Create the admin the tests log in as
//! cargo run -p fastlanche-cli -- admin create \
//!     --email admin@fastlanche.test --name Admin --password admin-secret
//!
//! # Start the server with the auth rate limiter off, then run the ignored tests
//! FASTLANCHE_AUTH_RATE_LIMIT_BURST=0 cargo run -p fastlanche-server &
//! cargo test -p fastlanche-integration-tests -- --ignored
//! ```
//!
//! The suite registers and logs in far more often than the default auth
//! limit (5 requests, then one every 6 seconds per IP) allows, so a server
//! started with the limiter on answers `429 Too Many Requests` partway through.
//!
//! Every test registers its own customer with a unique email, so the suite
//! can run repeatedly against the same database.

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL of the running server (configurable via `API_BASE_URL`).
#[must_use]
pub fn base_url() -> String {
    std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Admin credentials created with `fl-cli admin create`.
#[must_use]
pub fn admin_credentials() -> (String, String) {
    let email =
        std::env::var("TEST_ADMIN_EMAIL").unwrap_or_else(|_| "admin@fastlanche.test".to_string());
    let password =
        std::env::var("TEST_ADMIN_PASSWORD").unwrap_or_else(|_| "admin-secret".to_string());
    (email, password)
}

/// HTTP client holding one session cookie.
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// A client with an empty cookie jar.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            base_url: base_url(),
        }
    }

    /// Register a fresh customer and keep its session.
    ///
    /// Returns the created user.
    pub async fn customer() -> (Self, Value) {
        let api = Self::new();
        let email = format!("customer-{}@fastlanche.test", Uuid::new_v4().simple());
        let resp = api
            .post(
                "/api/auth/register",
                &json!({
                    "name": "Test Customer",
                    "email": email,
                    "password": "secret123",
                    "address": "Rua das Flores, 42",
                }),
            )
            .await;
        assert_eq!(
            resp.status(),
            StatusCode::CREATED,
            "registration failed; a 429 means the server's auth rate limiter is on"
        );
        let user = json_body(resp).await;
        (api, user)
    }

    /// Log in as the seeded admin.
    pub async fn admin() -> Self {
        let api = Self::new();
        let (email, password) = admin_credentials();
        let resp = api
            .post(
                "/api/auth/login",
                &json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(
            resp.status(),
            StatusCode::OK,
            "admin login failed; run `fl-cli admin create` first, and start the \
             server with FASTLANCHE_AUTH_RATE_LIMIT_BURST=0"
        );
        api
    }

    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    #[allow(clippy::expect_used)]
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .expect("GET request failed")
    }

    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    #[allow(clippy::expect_used)]
    pub async fn post(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await
            .expect("POST request failed")
    }

    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    #[allow(clippy::expect_used)]
    pub async fn patch(&self, path: &str, body: &Value) -> Response {
        self.client
            .patch(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await
            .expect("PATCH request failed")
    }

    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    #[allow(clippy::expect_used)]
    pub async fn delete(&self, path: &str) -> Response {
        self.client
            .delete(format!("{}{path}", self.base_url))
            .send()
            .await
            .expect("DELETE request failed")
    }

    /// Create a category and one available product in it, as admin.
    ///
    /// Returns the product.
    pub async fn create_product(&self, price: &str) -> Value {
        let resp = self
            .post(
                "/api/categories",
                &json!({ "name": format!("Category {}", Uuid::new_v4().simple()) }),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let category: Value = json_body(resp).await;

        let resp = self
            .post(
                "/api/products",
                &json!({
                    "name": "X-Burger",
                    "price": price,
                    "categoryId": category["id"],
                }),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        json_body(resp).await
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a JSON response body.
///
/// # Panics
///
/// Panics if the body is not valid JSON for `T`.
#[allow(clippy::expect_used)]
pub async fn json_body<T: DeserializeOwned>(resp: Response) -> T {
    resp.json().await.expect("Failed to decode response body")
}

/// Field paths named in a validation error body.
#[must_use]
pub fn error_paths(body: &Value) -> Vec<String> {
    body["errors"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e["path"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
