use crate::credentials::{CredentialVerifier, KdfParams, PasswordHasher, PgCredentialStore};
use anyhow::{Context, Result, anyhow};
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{
        HeaderName, HeaderValue, Method, Request,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, options},
};
use handlers::{auth, health, root};
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{sync::Arc, time::Duration};
use tokio::{
    net::TcpListener,
    signal::unix::{SignalKind, signal},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;
use url::Url;
use utoipa_axum::router::OpenApiRouter;

pub(crate) mod handlers;
// OpenAPI router wiring and route registration live in openapi.rs.
mod openapi;

pub use handlers::auth::AuthConfig;
pub use openapi::openapi;

/// Build the API router with all documented routes registered.
#[must_use]
pub fn router() -> OpenApiRouter {
    openapi::api_router()
}

/// Start the server
/// # Errors
/// Return error if the database is unreachable, the configuration is invalid
/// or the listener fails
pub async fn new(port: u16, dsn: String, auth_config: AuthConfig, kdf: KdfParams) -> Result<()> {
    let hasher = PasswordHasher::new(kdf);
    hasher
        .validate()
        .context("Invalid password hashing parameters")?;

    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let store = Arc::new(PgCredentialStore::new(pool.clone()));
    let verifier = CredentialVerifier::new(store, hasher);
    let auth_state = Arc::new(auth::AuthState::new(auth_config, verifier));

    let app = app(pool, auth_state)?;

    // Register signal handlers before accepting connections
    let mut terminate =
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    let mut interrupt =
        signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = terminate.recv() => info!("Received SIGTERM"),
                _ = interrupt.recv() => info!("Received SIGINT"),
            }
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

/// Assemble the full application: documented routes, `/`, preflight-only
/// `OPTIONS /health`, request ids, tracing, CORS and shared state.
///
/// # Errors
/// Returns an error if the configured frontend URL cannot be turned into an origin.
pub(crate) fn app(pool: PgPool, auth_state: Arc<auth::AuthState>) -> Result<Router> {
    let frontend_origin = frontend_origin(auth_state.config().frontend_base_url())?;
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_origin(AllowOrigin::exact(frontend_origin))
        .allow_credentials(true);

    let (router, _openapi) = router().split_for_parts();
    let app = router
        .route("/", get(root::root))
        .route("/health", options(health::health))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(auth_state))
                .layer(Extension(pool)),
        );

    Ok(app)
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn frontend_origin(frontend_base_url: &str) -> Result<HeaderValue> {
    let parsed = Url::parse(frontend_base_url)
        .with_context(|| format!("Invalid frontend base URL: {frontend_base_url}"))?;
    let host = parsed.host_str().ok_or_else(|| {
        anyhow!("Frontend base URL must include a valid host: {frontend_base_url}")
    })?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build frontend origin header")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn lazy_pool() -> Result<PgPool> {
        Ok(PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://clinic@127.0.0.1:1/clinic")?)
    }

    #[test]
    fn frontend_origin_strips_path() -> Result<()> {
        let origin = frontend_origin("https://clinic.example.com/app/")?;
        assert_eq!(origin, "https://clinic.example.com");
        Ok(())
    }

    #[test]
    fn frontend_origin_keeps_port() -> Result<()> {
        let origin = frontend_origin("http://localhost:3000")?;
        assert_eq!(origin, "http://localhost:3000");
        Ok(())
    }

    #[test]
    fn frontend_origin_rejects_garbage() {
        assert!(frontend_origin("not a url").is_err());
        assert!(frontend_origin("mailto:someone@example.com").is_err());
    }

    #[tokio::test]
    async fn root_reports_name_and_version() -> Result<()> {
        let app = app(lazy_pool()?, Arc::new(auth::test_support::auth_state()))?;
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await?.to_bytes();
        let text = String::from_utf8(body.to_vec())?;
        assert!(text.starts_with(env!("CARGO_PKG_NAME")));
        assert!(text.contains(env!("CARGO_PKG_VERSION")));
        Ok(())
    }

    #[tokio::test]
    async fn responses_carry_request_id() -> Result<()> {
        let app = app(lazy_pool()?, Arc::new(auth::test_support::auth_state()))?;
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("x-request-id", "req-123")
                    .body(Body::empty())?,
            )
            .await?;
        assert_eq!(
            response
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok()),
            Some("req-123")
        );
        Ok(())
    }

    #[tokio::test]
    async fn health_reports_unreachable_database() -> Result<()> {
        let app = app(lazy_pool()?, Arc::new(auth::test_support::auth_state()))?;
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers().contains_key("X-App"));
        let body = response.into_body().collect().await?.to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body)?;
        assert_eq!(json["database"], "error");
        Ok(())
    }

    #[tokio::test]
    async fn cors_preflight_allows_frontend_origin() -> Result<()> {
        let app = app(lazy_pool()?, Arc::new(auth::test_support::auth_state()))?;
        let origin = auth::test_support::auth_config().frontend_base_url().to_string();
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/v1/patients")
                    .header("origin", origin.trim_end_matches('/'))
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())?,
            )
            .await?;
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some(origin.trim_end_matches('/'))
        );
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-credentials")
                .and_then(|v| v.to_str().ok()),
            Some("true")
        );
        Ok(())
    }
}
