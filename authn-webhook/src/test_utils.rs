use crate::config::Settings;
use crate::create_app;
use crate::state::AppState;
use axum::body::Body;
use axum::Router;
use http::header::CONTENT_TYPE;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

/// Test fixture for driving the webhook against a mocked GitHub.
///
/// The fixture starts a `MockServer` standing in for GitHub, points the
/// settings at it and builds the application router with a fresh in-memory
/// cache.
///
/// # Examples
///
/// ```rust
/// #[tokio::test]
/// async fn test_review() {
///     let fixture = TestFixture::new().await;
///     fixture.add_user_mock("alice", 1).await;
///     fixture.add_teams_page(1, &[("acme", "eng")], None, 1).await;
///
///     let response = fixture
///         .post("/webhook", &json!({ "spec": { "token": "user-token" } }))
///         .await;
///
///     response.assert_ok();
///     assert_eq!(response.json["status"]["user"]["username"], "alice");
/// }
/// ```
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// Configuration settings
    pub settings: Settings,
    /// The state behind the router, for calling the review pipeline directly
    pub state: AppState,
    /// Mock server for GitHub
    pub github_mock: MockServer,
}

impl TestFixture {
    /// Creates a new test fixture with default test settings.
    pub async fn new() -> Self {
        Self::with_settings(|_| {}).await
    }

    /// Creates a new test fixture, letting the caller adjust the settings
    /// before the application is built.
    pub async fn with_settings(customize: impl FnOnce(&mut Settings)) -> Self {
        Self::setup_logger(LevelFilter::Debug);

        let github_mock = MockServer::start().await;

        let mut settings = Settings::for_test_with_mocks(&github_mock);
        customize(&mut settings);

        let state = AppState::new(settings.clone())
            .await
            .expect("Failed to create test state");
        let app = create_app(state.clone()).await;

        Self {
            app,
            settings,
            state,
            github_mock,
        }
    }

    /// Initializes the test logger with customized settings.
    pub fn setup_logger(level: LevelFilter) {
        let _ = env_logger::builder()
            .filter_level(level)
            .is_test(true)
            .try_init();
    }

    /// Sends a GET request to the specified URI.
    pub async fn get(&self, uri: impl AsRef<str>) -> TestResponse {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri.as_ref())
            .body(Body::empty())
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a POST request with a JSON body to the specified URI.
    pub async fn post<T: Serialize>(&self, uri: impl AsRef<str>, body: &T) -> TestResponse {
        let json_body = serde_json::to_vec(body).expect("Failed to serialize body to JSON");
        self.post_raw(uri, json_body).await
    }

    /// Sends a POST request with an arbitrary body, e.g. one that is not JSON.
    pub async fn post_raw(&self, uri: impl AsRef<str>, body: impl Into<Body>) -> TestResponse {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri.as_ref())
            .header(CONTENT_TYPE, "application/json")
            .body(body.into())
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a request and returns a TestResponse.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body).into_owned();
        // Try to parse as JSON, defaulting to empty object if parsing fails or empty body
        let json = if !body.is_empty() {
            serde_json::from_slice(&body).unwrap_or_else(|_| json!({}))
        } else {
            json!({})
        };

        TestResponse {
            status,
            content_type,
            json,
            text,
        }
    }

    /// Adds a GitHub GET route answering with a fixed status and body.
    pub async fn add_github_mock(
        &self,
        path: impl Into<String>,
        status_code: u16,
        body: &str,
        expected_calls: u64,
    ) {
        Mock::given(matchers::method("GET"))
            .and(matchers::path(path.into()))
            .respond_with(ResponseTemplate::new(status_code).set_body_string(body))
            .expect(expected_calls)
            .mount(&self.github_mock)
            .await;
    }

    /// Adds a `GET /user` route returning an account with the given login.
    pub async fn add_user_mock(&self, login: &str, expected_calls: u64) {
        Mock::given(matchers::method("GET"))
            .and(matchers::path("/api/v3/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "login": login,
                "id": 1,
                "name": null,
                "email": null
            })))
            .expect(expected_calls)
            .mount(&self.github_mock)
            .await;
    }

    /// Adds one page of `GET /user/teams`, linking to `next` when given.
    pub async fn add_teams_page(
        &self,
        page: u32,
        teams: &[(&str, &str)],
        next: Option<u32>,
        expected_calls: u64,
    ) {
        Mock::given(matchers::method("GET"))
            .and(matchers::path("/api/v3/user/teams"))
            .and(matchers::query_param("per_page", "100"))
            .and(matchers::query_param("page", page.to_string()))
            .respond_with(teams_page(teams, next, &self.github_mock.uri()))
            .expect(expected_calls)
            .mount(&self.github_mock)
            .await;
    }
}

/// A `GET /user/teams` response holding `(organization, team)` pairs
pub fn teams_page(teams: &[(&str, &str)], next: Option<u32>, base_uri: &str) -> ResponseTemplate {
    let body: Vec<Value> = teams
        .iter()
        .map(|(org, name)| {
            json!({
                "name": name,
                "slug": name,
                "organization": { "login": org }
            })
        })
        .collect();

    let template = ResponseTemplate::new(200).set_body_json(body);
    match next {
        Some(next) => template.insert_header(
            "Link",
            format!(
                r#"<{base_uri}/api/v3/user/teams?per_page=100&page={next}>; rel="next""#
            )
            .as_str(),
        ),
        None => template,
    }
}

/// Response from a test request that provides convenient access to status and body.
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header, if any
    pub content_type: Option<String>,
    /// Response body as JSON (if present and valid JSON)
    pub json: Value,
    /// Response body as text
    pub text: String,
}

impl TestResponse {
    /// Asserts that the response has the expected status code.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match the expected value.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "Expected status {} but got {} with body: {}",
            expected, self.status, self.text
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
