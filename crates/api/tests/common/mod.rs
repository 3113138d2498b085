//! Common test utilities for integration tests.
//!
//! Tests run against a real PostgreSQL database named by `TEST_DATABASE_URL`
//! and are skipped when it is not set. Company SQL Server databases are
//! replaced by [`FakeGateway`].

// Helpers are shared by several test binaries; not every binary uses all of them.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use attendance_sync_api::app::{create_app, AppState};
use attendance_sync_api::config::Config;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use domain::models::{ExternalSyncRow, NewExternalSyncRow, RequestStatus};
use fake::{faker::name::en::Name, Fake};
use persistence::external::{ExternalConnectionSpec, ExternalDbError, ExternalGateway};
use persistence::repositories::{NewUser, UserRepository};
use serde_json::{json, Value};
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "Attend2024pass";

/// In-memory stand-in for company databases.
#[derive(Default)]
pub struct FakeGateway {
    rows: Mutex<HashMap<i64, ExternalSyncRow>>,
    next_id: AtomicI64,
    unreachable: AtomicBool,
}

impl FakeGateway {
    /// Makes every following call fail as if the server were down.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Simulates the company's sync job writing a result.
    pub fn set_row_status(&self, external_ref: i64, status: &str, remarks: Option<&str>) {
        let mut rows = self.rows.lock().unwrap();
        let row = rows.get_mut(&external_ref).expect("row exists");
        row.status = status.to_string();
        row.remarks = remarks.map(str::to_string);
        row.updated_date = Some(Utc::now().naive_utc());
    }

    pub fn row(&self, external_ref: i64) -> Option<ExternalSyncRow> {
        self.rows.lock().unwrap().get(&external_ref).cloned()
    }

    fn check(&self) -> Result<(), ExternalDbError> {
        if self.unreachable.load(Ordering::SeqCst) {
            Err(ExternalDbError::Connection("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ExternalGateway for FakeGateway {
    async fn ping(&self, _spec: &ExternalConnectionSpec) -> Result<Duration, ExternalDbError> {
        self.check()?;
        Ok(Duration::from_millis(3))
    }

    async fn insert_sync_row(
        &self,
        _spec: &ExternalConnectionSpec,
        row: &NewExternalSyncRow,
    ) -> Result<i64, ExternalDbError> {
        self.check()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.rows.lock().unwrap().insert(
            id,
            ExternalSyncRow {
                id,
                request_id: row.request_id,
                tool_code: row.tool_code.clone(),
                from_date: row.from_date,
                to_date: row.to_date,
                status: row.status.code().to_string(),
                remarks: row.remarks.clone(),
                created_date: Utc::now().naive_utc(),
                updated_date: None,
            },
        );
        Ok(id)
    }

    async fn fetch_sync_row(
        &self,
        _spec: &ExternalConnectionSpec,
        external_ref: i64,
    ) -> Result<Option<ExternalSyncRow>, ExternalDbError> {
        self.check()?;
        Ok(self.row(external_ref))
    }

    async fn update_sync_status(
        &self,
        _spec: &ExternalConnectionSpec,
        external_ref: i64,
        status: RequestStatus,
        remarks: Option<&str>,
    ) -> Result<bool, ExternalDbError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        Ok(match rows.get_mut(&external_ref) {
            Some(row) => {
                row.status = status.code().to_string();
                if let Some(remarks) = remarks {
                    row.remarks = Some(remarks.to_string());
                }
                true
            }
            None => false,
        })
    }
}

/// Application wired to the test database and a fake gateway.
pub struct TestContext {
    pub app: Router,
    pub pool: PgPool,
    pub state: AppState,
    pub gateway: Arc<FakeGateway>,
}

impl TestContext {
    /// `None` when `TEST_DATABASE_URL` is not set.
    pub async fn setup() -> Option<Self> {
        Self::setup_with(&[]).await
    }

    pub async fn setup_with(overrides: &[(&str, &str)]) -> Option<Self> {
        let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
            eprintln!("TEST_DATABASE_URL not set; skipping");
            return None;
        };

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&url)
            .await
            .expect("Failed to connect to test database");
        Some(Self::build(&url, pool, overrides).await)
    }

    /// Like [`TestContext::setup`], but in a fresh schema of its own so the
    /// test sees only the users it creates.
    pub async fn setup_isolated() -> Option<Self> {
        let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
            eprintln!("TEST_DATABASE_URL not set; skipping");
            return None;
        };

        let schema = format!("test_{}", Uuid::new_v4().simple());
        let shared = PgPoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .expect("Failed to connect to test database");
        sqlx::query(&format!("CREATE SCHEMA {}", schema))
            .execute(&shared)
            .await
            .expect("Failed to create test schema");
        shared.close().await;

        let options: PgConnectOptions = url.parse().expect("valid TEST_DATABASE_URL");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options.options([("search_path", schema.as_str())]))
            .await
            .expect("Failed to connect to test schema");
        Some(Self::build(&url, pool, &[]).await)
    }

    async fn build(url: &str, pool: PgPool, overrides: &[(&str, &str)]) -> Self {
        persistence::db::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let mut all = vec![
            ("database.url", url),
            ("security.login_rate_limit_per_minute", "0"),
        ];
        all.extend_from_slice(overrides);
        let config = Config::load_for_test(&all).expect("test config");

        let gateway = Arc::new(FakeGateway::default());
        let state = AppState::new(config, pool.clone(), gateway.clone()).expect("app state");
        let app = create_app(state.clone());

        Self {
            app,
            pool,
            state,
            gateway,
        }
    }

    /// Sends a request and returns the status with the parsed envelope.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    /// Inserts an active user directly and returns their email.
    pub async fn create_user(&self, role: &str) -> (Uuid, String) {
        let email = unique_email();
        let hash = shared::password::hash_password(TEST_PASSWORD).unwrap();
        let display_name: String = Name().fake();
        let user = UserRepository::new(self.pool.clone())
            .create(NewUser {
                email: &email,
                password_hash: &hash,
                display_name: &display_name,
                role,
                is_active: true,
            })
            .await
            .expect("Failed to create test user");
        (user.id, email)
    }

    pub async fn login(&self, email: &str) -> String {
        let (status, body) = self
            .send(json_request(
                Method::POST,
                "/api/v1/auth/login",
                json!({ "email": email, "password": TEST_PASSWORD }),
                None,
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["data"]["token"].as_str().unwrap().to_string()
    }

    /// A fresh admin account and its bearer token.
    pub async fn admin(&self) -> (Uuid, String) {
        let (id, email) = self.create_user("admin").await;
        (id, self.login(&email).await)
    }

    /// A fresh regular account and its bearer token.
    pub async fn user(&self) -> (Uuid, String) {
        let (id, email) = self.create_user("user").await;
        (id, self.login(&email).await)
    }

    /// Creates a company through the admin API and returns its id.
    pub async fn create_company(&self, admin_token: &str) -> Uuid {
        let (status, body) = self
            .send(json_request(
                Method::POST,
                "/api/v1/admin/companies",
                json!({ "code": unique_code("C"), "name": "Test Garments Ltd" }),
                Some(admin_token),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create company: {}", body);
        id_of(&body)
    }

    pub async fn create_tool(&self, admin_token: &str) -> Uuid {
        let (status, body) = self
            .send(json_request(
                Method::POST,
                "/api/v1/admin/tools",
                json!({ "code": unique_code("T"), "name": "ZKTeco Sync" }),
                Some(admin_token),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create tool: {}", body);
        id_of(&body)
    }

    pub async fn create_server_ip(&self, admin_token: &str) -> Uuid {
        let host = format!("sql-{}.test", &Uuid::new_v4().simple().to_string()[..12]);
        let (status, body) = self
            .send(json_request(
                Method::POST,
                "/api/v1/admin/server-ips",
                json!({ "ip_address": host, "port": 1433 }),
                Some(admin_token),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create server ip: {}", body);
        id_of(&body)
    }

    /// Company with an active database assignment, a tool, and a user granted access.
    pub async fn provisioned(&self) -> Provisioned {
        let (_, admin_token) = self.admin().await;
        let company_id = self.create_company(&admin_token).await;
        let tool_id = self.create_tool(&admin_token).await;
        let server_ip_id = self.create_server_ip(&admin_token).await;

        let (status, body) = self
            .send(json_request(
                Method::POST,
                "/api/v1/admin/database-assignments",
                json!({
                    "company_id": company_id,
                    "server_ip_id": server_ip_id,
                    "database_name": "HRM_Attendance",
                    "db_username": "sync_user",
                    "password": "S3cret!pass"
                }),
                Some(&admin_token),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create assignment: {}", body);
        let assignment_id = id_of(&body);

        let (user_id, user_token) = self.user().await;
        let (status, body) = self
            .send(json_request(
                Method::POST,
                "/api/v1/admin/database-access",
                json!({ "user_id": user_id, "company_id": company_id }),
                Some(&admin_token),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "grant access: {}", body);

        Provisioned {
            admin_token,
            user_id,
            user_token,
            company_id,
            tool_id,
            server_ip_id,
            assignment_id,
        }
    }
}

pub struct Provisioned {
    pub admin_token: String,
    pub user_id: Uuid,
    pub user_token: String,
    pub company_id: Uuid,
    pub tool_id: Uuid,
    pub server_ip_id: Uuid,
    pub assignment_id: Uuid,
}

pub fn unique_email() -> String {
    format!("test_{}@example.com", Uuid::new_v4().simple())
}

/// Code within the 20 character limit.
pub fn unique_code(prefix: &str) -> String {
    format!("{}{}", prefix, &Uuid::new_v4().simple().to_string()[..12]).to_uppercase()
}

pub fn id_of(body: &Value) -> Uuid {
    body["data"]["id"]
        .as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("Missing data.id in response: {}", body))
}

/// Build a JSON request, with a bearer token when given.
pub fn json_request(method: Method, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a bodiless request, with a bearer token when given.
pub fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn get(uri: &str, token: &str) -> Request<Body> {
    empty_request(Method::GET, uri, Some(token))
}
