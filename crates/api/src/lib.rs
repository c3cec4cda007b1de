//! Bazaar shop API library.
//!
//! This crate provides the REST backend as a library, allowing the router
//! to be tested and the binary to stay thin.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod payments;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;

use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, Response, StatusCode},
    routing::get,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use state::AppState;

/// Build the full application router with middleware applied.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .layer(CorsLayer::permissive())
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &Response<Body>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
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
/// Verifies database connectivity before returning OK.
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{ApiConfig, BraintreeConfig, BraintreeEnvironment};

    fn test_app() -> Router {
        let config = ApiConfig {
            database_url: SecretString::from("postgres://localhost/bazaar_unreachable"),
            host: "127.0.0.1".parse().unwrap(),
            port: 8080,
            jwt_secret: SecretString::from("app-level-test-signing-key-4c7e9a1b"),
            session_ttl_days: 7,
            braintree: BraintreeConfig {
                environment: BraintreeEnvironment::Sandbox,
                merchant_id: "merchant".into(),
                public_key: "public".into(),
                private_key: SecretString::from("private"),
            },
            sentry_dsn: None,
            sentry_environment: None,
        };
        let pool = crate::db::create_lazy_pool(&config.database_url).unwrap();
        app(AppState::new(&config, pool).unwrap())
    }

    #[tokio::test]
    async fn test_health_is_ok_and_tagged() {
        let response = test_app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .headers()
                .contains_key(middleware::request_id::REQUEST_ID_HEADER)
        );
    }

    #[tokio::test]
    async fn test_cors_preflight_is_answered() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/v1/category/get-category")
            .header("origin", "http://localhost:3000")
            .header("access-control-request-method", "GET")
            .body(Body::empty())
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();

        assert!(response.status().is_success());
        assert!(
            response
                .headers()
                .contains_key("access-control-allow-origin")
        );
    }
}
