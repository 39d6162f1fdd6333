use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, CheckResponse, LoginRequest, RegisterRequest},
        extractors::AuthUser,
        jwt::JwtKeys,
        services::{self, require_credentials},
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/check", get(check))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(v)| v).map_err(|e| {
        warn!(error = %e.body_text(), "rejected request body");
        ApiError::Validation("Invalid request body.".into())
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let req = body(payload)?;
    let creds = require_credentials(req.username, req.password)?;

    let keys = JwtKeys::from_ref(&state);
    let session = services::register(state.users.as_ref(), &keys, creds).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "Registration completed successfully.",
            user: session.user.into(),
            token: session.token,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let req = body(payload)?;
    let creds = require_credentials(req.username, req.password)?;

    let keys = JwtKeys::from_ref(&state);
    let session = services::login(state.users.as_ref(), &keys, creds).await?;

    Ok(Json(AuthResponse {
        message: "Login successful.",
        user: session.user.into(),
        token: session.token,
    }))
}

#[instrument(skip_all, fields(user_id = claims.id))]
pub async fn check(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<CheckResponse>, ApiError> {
    let user = services::current_user(state.users.as_ref(), &claims).await?;
    Ok(Json(CheckResponse {
        message: "Authentication verified.",
        user: user.into(),
    }))
}
