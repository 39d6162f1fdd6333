use std::net::SocketAddr;

use axum::{routing::get, Json, Router};
use serde::Serialize;
use time::OffsetDateTime;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::auth;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub message: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "Server is running.",
        timestamp: OffsetDateTime::now_utc(),
    })
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(auth::router())
                .route("/health", get(health)),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);
    info!("endpoints:");
    info!("  POST /api/auth/register");
    info!("  POST /api/auth/login");
    info!("  GET  /api/auth/check");
    info!("  GET  /api/health");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("received Ctrl+C, shutting down"),
                    _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                ctrl_c.await.ok();
                info!("received Ctrl+C, shutting down");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("received Ctrl+C, shutting down");
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.clone().oneshot(req).await.expect("infallible");
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.expect("body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn check(token: Option<&str>) -> Request<Body> {
        let mut req = Request::builder().uri("/api/auth/check");
        if let Some(value) = token {
            req = req.header(header::AUTHORIZATION, value);
        }
        req.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn full_session_scenario() {
        let app = build_app(AppState::fake());
        let alice = json!({"username": "alice", "password": "secret1"});

        let (status, body) = send(&app, post_json("/api/auth/register", alice.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["username"], "alice");
        assert_eq!(body["user"]["id"], 1);
        assert!(body["user"]["createdAt"].is_string());
        assert!(body["user"].get("passwordHash").is_none());
        assert!(!body["token"].as_str().unwrap().is_empty());

        let (status, body) = send(&app, post_json("/api/auth/register", alice.clone())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "Username already exists.");

        let wrong = json!({"username": "alice", "password": "wrong"});
        let (status, body) = send(&app, post_json("/api/auth/login", wrong)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid username or password.");

        let (status, body) = send(&app, post_json("/api/auth/login", alice)).await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();

        let (status, body) = send(&app, check(Some(&format!("Bearer {token}")))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Authentication verified.");
        assert_eq!(body["user"]["username"], "alice");
        assert_eq!(body["user"]["id"], 1);
    }

    #[tokio::test]
    async fn unknown_user_and_wrong_password_share_response() {
        let app = build_app(AppState::fake());
        send(
            &app,
            post_json("/api/auth/register", json!({"username": "bob", "password": "pw"})),
        )
        .await;

        let a = send(
            &app,
            post_json("/api/auth/login", json!({"username": "bob", "password": "nope"})),
        )
        .await;
        let b = send(
            &app,
            post_json("/api/auth/login", json!({"username": "ghost", "password": "pw"})),
        )
        .await;
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn missing_or_empty_fields_are_bad_request() {
        let app = build_app(AppState::fake());
        let bodies = [
            json!({}),
            json!({"username": "alice"}),
            json!({"password": "pw"}),
            json!({"username": "", "password": "pw"}),
            json!({"username": "alice", "password": null}),
        ];
        for uri in ["/api/auth/register", "/api/auth/login"] {
            for b in &bodies {
                let (status, body) = send(&app, post_json(uri, b.clone())).await;
                assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} {b}");
                assert_eq!(body["message"], "Username and password are both required.");
            }
        }
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let app = build_app(AppState::fake());
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid request body.");
    }

    #[tokio::test]
    async fn check_without_token_is_unauthorized() {
        let app = build_app(AppState::fake());
        for value in [None, Some("Bearer"), Some("Bearer  a.b.c")] {
            let (status, body) = send(&app, check(value)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["message"], "Access token is required.");
        }
    }

    #[tokio::test]
    async fn check_with_bad_token_is_forbidden() {
        let app = build_app(AppState::fake());
        for value in ["Bearer not-a-token", "Bearer a.b.c", "Bearer a.b.c.d", "Basic abc"] {
            let (status, body) = send(&app, check(Some(value))).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{value}");
            assert_eq!(body["message"], "Invalid token.");
        }
    }

    #[tokio::test]
    async fn check_rejects_token_from_other_secret() {
        let issuer = AppState::fake();
        let mut other = (*issuer.config).clone();
        other.jwt.secret = "another-secret".into();
        let verifier = AppState::from_parts(std::sync::Arc::new(other), issuer.users.clone());

        let (_, body) = send(
            &build_app(issuer),
            post_json("/api/auth/register", json!({"username": "alice", "password": "pw"})),
        )
        .await;
        let token = body["token"].as_str().unwrap().to_string();

        let (status, _) = send(&build_app(verifier), check(Some(&format!("Bearer {token}")))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn check_for_vanished_user_is_not_found() {
        let issuer = AppState::fake();
        let (_, body) = send(
            &build_app(issuer.clone()),
            post_json("/api/auth/register", json!({"username": "alice", "password": "pw"})),
        )
        .await;
        let token = body["token"].as_str().unwrap().to_string();

        // same secret, empty store
        let fresh = AppState::from_parts(issuer.config.clone(), AppState::fake().users);
        let (status, body) = send(&build_app(fresh), check(Some(&format!("Bearer {token}")))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "User not found.");
    }

    #[tokio::test]
    async fn health_reports_timestamp() {
        let app = build_app(AppState::fake());
        let req = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Server is running.");
        let ts = body["timestamp"].as_str().unwrap();
        assert!(OffsetDateTime::parse(ts, &time::format_description::well_known::Rfc3339).is_ok());
    }
}
