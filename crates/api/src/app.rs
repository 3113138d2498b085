use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use persistence::external::ExternalGateway;
use shared::crypto::{CredentialCipher, CryptoError};
use shared::jwt::{JwtConfig, JwtError};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    login_rate_limit, metrics_handler, metrics_middleware, require_admin, require_auth,
    security_headers_middleware, trace_id, LoginRateLimiter,
};
use crate::routes::{
    admin_companies, admin_database_access, admin_database_assignments, admin_employees,
    admin_requests, admin_server_ips, admin_sync_requests, admin_tools, admin_users, auth,
    company_requests, health, lookups, sync_requests,
};
use crate::services::{
    AccessRequestService, AuthService, CookieHelper, CredentialResolver, SyncRequestService,
};

/// Secrets in the configuration that cannot be turned into keys.
#[derive(Debug, thiserror::Error)]
pub enum StateInitError {
    #[error("JWT configuration: {0}")]
    Jwt(#[from] JwtError),

    #[error("Credential cipher: {0}")]
    Crypto(#[from] CryptoError),
}

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: JwtConfig,
    pub cipher: CredentialCipher,
    pub gateway: Arc<dyn ExternalGateway>,
    pub login_limiter: Option<Arc<LoginRateLimiter>>,
    pub cookies: CookieHelper,
}

impl AppState {
    pub fn new(
        config: Config,
        pool: PgPool,
        gateway: Arc<dyn ExternalGateway>,
    ) -> Result<Self, StateInitError> {
        let jwt = JwtConfig::new(
            &config.jwt.secret,
            config.jwt.token_expiry_secs,
            config.jwt.leeway_secs,
        )?;
        let cipher = CredentialCipher::new(&config.security.credential_secret)?;
        let login_limiter =
            LoginRateLimiter::new(config.security.login_rate_limit_per_minute).map(Arc::new);
        let cookies = CookieHelper::new(config.cookie.clone(), config.jwt.token_expiry_secs);

        Ok(Self {
            pool,
            config: Arc::new(config),
            jwt,
            cipher,
            gateway,
            login_limiter,
            cookies,
        })
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(self.pool.clone(), self.jwt.clone())
    }

    pub fn credentials(&self) -> CredentialResolver {
        CredentialResolver::new(
            self.pool.clone(),
            self.cipher.clone(),
            self.config.external.connection_options(),
        )
    }

    pub fn access_requests(&self) -> AccessRequestService {
        AccessRequestService::new(self.pool.clone(), self.cipher.clone())
    }

    pub fn sync_requests(&self) -> SyncRequestService {
        SyncRequestService::new(
            self.pool.clone(),
            self.credentials(),
            self.gateway.clone(),
            self.config.limits.max_sync_range_days,
        )
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        // Development default
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }
    // Credentialed requests need explicit origins, methods and headers.
    let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderName::from_static("x-request-id"),
        ])
        .allow_credentials(true)
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    // Authenticated user routes
    let user_routes = Router::new()
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/me", get(auth::me))
        .route("/api/v1/auth/change-password", post(auth::change_password))
        .nest("/api/v1", lookups::router())
        .nest("/api/v1/company-requests", company_requests::router())
        .nest("/api/v1/sync-requests", sync_requests::router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Admin routes (role admin)
    let admin_routes = Router::new()
        .nest("/companies", admin_companies::router())
        .nest("/employees", admin_employees::router())
        .nest("/tools", admin_tools::router())
        .nest("/server-ips", admin_server_ips::router())
        .nest("/users", admin_users::router())
        .nest("/database-assignments", admin_database_assignments::router())
        .nest("/database-access", admin_database_access::router())
        .nest("/company-requests", admin_requests::router())
        .nest("/sync-requests", admin_sync_requests::router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/auth/register", post(auth::register))
        .route(
            "/api/v1/auth/login",
            post(auth::login).route_layer(middleware::from_fn_with_state(
                state.clone(),
                login_rate_limit,
            )),
        );

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .nest("/api/v1/admin", admin_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config.security.cors_origins))
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use persistence::external::{SqlServerGateway, DEFAULT_SYNC_TABLE};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    /// State whose pool never connects unless a query runs.
    pub(crate) fn lazy_state(overrides: &[(&str, &str)]) -> AppState {
        let mut all = vec![("database.url", "postgres://localhost/unused")];
        all.extend_from_slice(overrides);
        let config = Config::load_for_test(&all).unwrap();
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let gateway = Arc::new(SqlServerGateway::new(DEFAULT_SYNC_TABLE).unwrap());
        AppState::new(config, pool, gateway).unwrap()
    }

    async fn status_of(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_user_routes_reject_missing_token() {
        let app = create_app(lazy_state(&[]));
        let request = Request::builder()
            .uri("/api/v1/auth/me")
            .body(Body::empty())
            .unwrap();

        let (status, body) = status_of(app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Authentication required");
    }

    #[tokio::test]
    async fn test_admin_routes_reject_non_bearer_scheme() {
        let app = create_app(lazy_state(&[]));
        let request = Request::builder()
            .uri("/api/v1/admin/companies")
            .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap();

        let (status, _) = status_of(app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
