use crate::cache::memory::InMemoryCache;
use crate::cache::Cache;
use crate::config::AppConfig;
use crate::create_app;
use crate::lookup::{ClientLookup, LookupError, UserLookup};
use crate::models::{ClientDetails, TokenRequest, UserRecord, GRANT_PASSWORD};
use crate::state::AppState;
use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use axum::body::Body;
use axum::Router;
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tower::ServiceExt;
use wiremock::matchers;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

/// Argon2 hash with minimal cost parameters, verified like any other hash
pub(crate) fn test_hash(raw: &str) -> String {
    let params = Params::new(Params::MIN_M_COST, 1, 1, None).expect("valid argon2 params");
    let salt = SaltString::encode_b64(b"fixed-test-salt").expect("valid salt");
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(raw.as_bytes(), &salt)
        .expect("hashing must succeed")
        .to_string()
}

pub(crate) fn user_record(username: &str, password: &str) -> UserRecord {
    UserRecord {
        user_id: format!("id-{username}"),
        username: username.to_string(),
        phone: None,
        tenant_id: None,
        user_type: "member".to_string(),
        password_hash: Some(test_hash(password)),
        authorities: vec!["sys:user:view".to_string(), "sys:user:edit".to_string()],
    }
}

pub(crate) fn client(client_id: &str, secret: Option<&str>, grant_types: &[&str]) -> ClientDetails {
    ClientDetails {
        client_id: client_id.to_string(),
        client_secret: secret.map(test_hash),
        access_token_validity_seconds: None,
        refresh_token_validity_seconds: None,
        authorized_grant_types: grant_types.iter().map(|g| g.to_string()).collect(),
    }
}

pub(crate) fn password_request(account: &str, password: &str) -> TokenRequest {
    TokenRequest {
        grant_type: GRANT_PASSWORD.to_string(),
        account: Some(account.to_string()),
        password: Some(password.to_string()),
        client_id: "web".to_string(),
        ..Default::default()
    }
}

/// In-process user and client directory that counts its lookups
#[derive(Default)]
pub(crate) struct FakeDirectory {
    users: Mutex<Vec<UserRecord>>,
    clients: Mutex<Vec<ClientDetails>>,
    user_calls: AtomicUsize,
    client_calls: AtomicUsize,
}

impl FakeDirectory {
    pub(crate) fn add_user(&self, record: UserRecord) {
        self.users.lock().unwrap().push(record);
    }

    pub(crate) fn add_client(&self, client: ClientDetails) {
        self.clients.lock().unwrap().push(client);
    }

    pub(crate) fn user_calls(&self) -> usize {
        self.user_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn client_calls(&self) -> usize {
        self.client_calls.load(Ordering::SeqCst)
    }

    fn find_user(&self, matches: impl Fn(&UserRecord) -> bool) -> Option<UserRecord> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        self.users.lock().unwrap().iter().find(|u| matches(u)).cloned()
    }
}

#[async_trait::async_trait]
impl UserLookup for FakeDirectory {
    async fn lookup_by_username(
        &self,
        _tenant: Option<&str>,
        username: &str,
    ) -> Result<Option<UserRecord>, LookupError> {
        Ok(self.find_user(|u| u.username == username))
    }

    async fn lookup_by_mobile(
        &self,
        _tenant: Option<&str>,
        phone: &str,
    ) -> Result<Option<UserRecord>, LookupError> {
        Ok(self.find_user(|u| u.phone.as_deref() == Some(phone)))
    }
}

#[async_trait::async_trait]
impl ClientLookup for FakeDirectory {
    async fn lookup_by_client_id(
        &self,
        client_id: &str,
    ) -> Result<Option<ClientDetails>, LookupError> {
        self.client_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .clients
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.client_id == client_id)
            .cloned())
    }
}

/// Test fixture for setting up a complete test environment with a mocked directory.
///
/// The fixture starts a mock upstream directory, configures the application
/// to query it and provides helpers for making requests against the router.
///
/// # Examples
///
/// ```rust
/// #[tokio::test]
/// async fn test_endpoint() {
///     let fixture = TestFixture::new().await;
///     fixture.mount_default_directory().await;
///
///     let token = fixture.login("alice", "correct").await;
///     let bearer = format!("Bearer {token}");
///     let response = fixture
///         .get_with_headers("/oauth2/me", &[("authorization", &bearer)])
///         .await;
///     response.assert_ok();
/// }
/// ```
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// Application state behind the router
    pub state: AppState,
    /// Configuration settings
    pub config: AppConfig,
    /// Mock server for the user and client directory
    pub upstream_mock: MockServer,
}

impl TestFixture {
    /// Creates a new test fixture backed by an in-memory cache and a mock directory
    pub async fn new() -> Self {
        Self::setup_logger(LevelFilter::Debug);

        let upstream_mock = MockServer::start().await;
        let config = AppConfig::for_test_with_mocks(&upstream_mock);
        let cache = Cache::InMemory(
            InMemoryCache::new(config.cache.memory.capacity).expect("Failed to create cache"),
        );
        let state = AppState::new(config.clone(), cache).expect("Failed to create app state");
        let app = create_app(state.clone());

        Self {
            app,
            state,
            config,
            upstream_mock,
        }
    }

    /// Initializes the test logger with the given level.
    ///
    /// Called by `TestFixture::new()`; only the first call in a process has
    /// an effect.
    pub fn setup_logger(level: LevelFilter) {
        let _ = env_logger::builder()
            .filter_level(level)
            .is_test(true)
            .try_init();
    }

    /// Serve `record` from the mock directory under its username and phone
    pub async fn mount_user(&self, record: &UserRecord) {
        Mock::given(matchers::method("GET"))
            .and(matchers::path(format!("/users/username/{}", record.username)))
            .respond_with(ResponseTemplate::new(200).set_body_json(record))
            .mount(&self.upstream_mock)
            .await;
        if let Some(phone) = &record.phone {
            Mock::given(matchers::method("GET"))
                .and(matchers::path(format!("/users/mobile/{phone}")))
                .respond_with(ResponseTemplate::new(200).set_body_json(record))
                .mount(&self.upstream_mock)
                .await;
        }
    }

    pub async fn mount_client(&self, client: &ClientDetails) {
        Mock::given(matchers::method("GET"))
            .and(matchers::path(format!("/clients/{}", client.client_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(client))
            .mount(&self.upstream_mock)
            .await;
    }

    /// Users "alice" and "bob" (password "correct") and the public client "web"
    pub async fn mount_default_directory(&self) {
        self.mount_user(&user_record("alice", "correct")).await;
        self.mount_user(&user_record("bob", "correct")).await;
        self.mount_client(&client("web", None, &[])).await;
    }

    /// Run a password grant for `username` and return the access token
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .post_form(
                "/oauth2/token",
                &[
                    ("grant_type", "password"),
                    ("username", username),
                    ("password", password),
                    ("client_id", "web"),
                ],
            )
            .await;
        response.assert_ok();
        response.json["access_token"]
            .as_str()
            .expect("access_token must be a string")
            .to_string()
    }

    /// Builds a body-less request with the given headers
    pub fn get_request(&self, uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
        Self::with_headers(Request::builder().method(Method::GET).uri(uri), headers)
            .body(Body::empty())
            .expect("Failed to build request")
    }

    fn with_headers(
        mut builder: http::request::Builder,
        headers: &[(&str, &str)],
    ) -> http::request::Builder {
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.get_with_headers(uri, &[]).await
    }

    pub async fn get_with_headers(&self, uri: &str, headers: &[(&str, &str)]) -> TestResponse {
        self.send(self.get_request(uri, headers)).await
    }

    pub async fn delete_with_headers(&self, uri: &str, headers: &[(&str, &str)]) -> TestResponse {
        let request = Self::with_headers(Request::builder().method(Method::DELETE).uri(uri), headers)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    /// Sends a form-encoded POST request
    pub async fn post_form(&self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .expect("Failed to build request");
        self.send(request).await
    }

    /// Sends a POST request with a JSON body and custom headers
    pub async fn post_json_with_headers<T: Serialize>(
        &self,
        uri: &str,
        body: &T,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let json_body = serde_json::to_vec(body).expect("Failed to serialize body to JSON");
        let request = Self::with_headers(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header("Content-Type", "application/json"),
            headers,
        )
        .body(Body::from(json_body))
        .expect("Failed to build request");
        self.send(request).await
    }

    /// Sends a request to the application router
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        self.send_to(&self.app, request).await
    }

    /// Sends a request to any router, e.g. one wrapping a single middleware
    pub async fn send_to(&self, app: &Router, request: Request<Body>) -> TestResponse {
        let response = app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        // Try to parse as JSON, defaulting to empty object if parsing fails or empty body
        let json = if !body.is_empty() {
            serde_json::from_slice(&body).unwrap_or_else(|_| serde_json::json!({}))
        } else {
            serde_json::json!({})
        };

        TestResponse {
            status,
            headers,
            json,
        }
    }
}

/// Response from a test request that provides convenient access to status and JSON body.
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Response body as JSON (if present and valid JSON)
    pub json: Value,
}

impl TestResponse {
    /// Asserts that the response has the expected status code.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match the expected value.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {} but got {} with body: {}",
            expected,
            self.status,
            serde_json::to_string_pretty(&self.json).unwrap_or_default()
        );
        self
    }

    /// Asserts that the response status is OK (200).
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }

    /// Converts the response body to the specified type.
    ///
    /// # Panics
    ///
    /// Panics if deserialization fails.
    pub fn json_as<T: DeserializeOwned>(&self) -> T {
        serde_json::from_value(self.json.clone()).expect("Failed to deserialize response JSON")
    }
}
