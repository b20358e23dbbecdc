//! Common test utilities for in-process API testing.
//!
//! Builds the full router over a temporary database with a mock publisher,
//! so tests drive the server exactly as a client would.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use cadence_core::{
    create_audit_system,
    testing::{MockGenerator, MockPublisher},
    AuditStore, Config, ConfirmationMode, ContentGenerator, DatabaseConfig, DocumentConfig,
    ItemStore, Publisher, ScheduleStore, SqliteAuditStore, SqliteItemStore, SqliteScheduleStore,
};
use cadence_server::state::AppState;

/// Re-export fixtures for test convenience
pub use cadence_core::testing::fixtures;

/// Scheduler runs happen at the start of day 1, before any slot is due.
pub const SCHEDULE_AT: &str = "2020-01-06T00:00:00Z";

/// Sweeps happen weeks later, once every assigned slot has come due.
pub const SWEEP_AT: &str = "2020-02-01T00:00:00Z";

/// Test fixture for API testing with a mock publisher.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_item_creation() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/api/v1/items", json!({
///         "content": "Hello", "category": "c", "kind": "tip"
///     })).await;
///
///     assert_eq!(response.status, 201);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Direct store access for arranging and asserting state
    pub items: Arc<SqliteItemStore>,
    pub schedule: Arc<SqliteScheduleStore>,
    /// Mock publisher - script outcomes, inspect calls
    pub publisher: Arc<MockPublisher>,
    /// Mock generator behind the generate endpoint
    pub generator: Arc<MockGenerator>,
    /// Temporary directory for the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

/// Configuration for test fixture.
#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    /// Require a confirmation per item before publishing
    pub manual_confirmation: bool,
    /// Cap on publish attempts per sweep
    pub max_per_sweep: Option<usize>,
    /// Leave the generate endpoint without a generator
    pub disable_generator: bool,
}

impl TestConfig {
    pub fn with_manual_confirmation() -> Self {
        Self {
            manual_confirmation: true,
            ..Default::default()
        }
    }
}

impl TestFixture {
    /// Create a new test fixture with default settings.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let mut config = Config {
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            document: DocumentConfig {
                path: temp_dir.path().join("content_queue.json"),
            },
            ..Default::default()
        };
        config.schedule.start_date = NaiveDate::from_ymd_opt(2020, 1, 6);
        config.generator.max_batch = 5;
        config.publisher.max_per_sweep = test_config.max_per_sweep;
        if test_config.manual_confirmation {
            config.publisher.confirmation = ConfirmationMode::Manual;
        }

        let items = Arc::new(SqliteItemStore::new(&db_path).expect("Failed to create item store"));
        let schedule = Arc::new(
            SqliteScheduleStore::new(&db_path).expect("Failed to create schedule store"),
        );
        let audit_store: Arc<dyn AuditStore> = Arc::new(
            SqliteAuditStore::new(&db_path).expect("Failed to create audit store"),
        );

        let (audit_handle, audit_writer) = create_audit_system(Arc::clone(&audit_store), 100);
        tokio::spawn(audit_writer.run());

        let publisher = Arc::new(MockPublisher::new());
        let generator = Arc::new(MockGenerator::new());
        let attached_generator = if test_config.disable_generator {
            None
        } else {
            Some(Arc::clone(&generator) as Arc<dyn ContentGenerator>)
        };

        let state = Arc::new(
            AppState::new(
                config,
                Arc::clone(&items) as Arc<dyn ItemStore>,
                Arc::clone(&schedule) as Arc<dyn ScheduleStore>,
                audit_handle,
                audit_store,
                Arc::clone(&publisher) as Arc<dyn Publisher>,
            )
            .with_generator(attached_generator),
        );

        let router = cadence_server::api::create_router(state);

        Self {
            router,
            items,
            schedule,
            publisher,
            generator,
            temp_dir,
        }
    }

    /// Path of the queue document inside the temp directory.
    pub fn document_path(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("content_queue.json")
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Create an item through the API and return its id.
    pub async fn create_item(&self, content: &str) -> String {
        let response = self
            .post(
                "/api/v1/items",
                serde_json::json!({
                    "content": content,
                    "category": "System design concepts",
                    "kind": "insight",
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text);
        response.body["id"]
            .as_str()
            .expect("item id in response")
            .to_string()
    }

    /// Run the scheduler as of [`SCHEDULE_AT`].
    pub async fn run_scheduler(&self) -> TestResponse {
        self.post_empty(&format!("/api/v1/schedule/run?at={}", SCHEDULE_AT))
            .await
    }

    /// Run a publish sweep as of [`SWEEP_AT`].
    pub async fn sweep(&self) -> TestResponse {
        self.post_empty(&format!("/api/v1/publish/sweep?at={}", SWEEP_AT))
            .await
    }

    /// Create and approve an item through the API.
    pub async fn approved_item(&self, content: &str) -> String {
        let id = self.create_item(content).await;
        let response = self
            .post_empty(&format!("/api/v1/items/{}/approve", id))
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.text);
        id
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status, $response.status, $response.text
        );
    };
}
