use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use super::{claims::Claims, jwt::JwtKeys};
use crate::error::ApiError;

/// Verified claims of the bearer token on the request.
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(ApiError::MissingToken)?
            .to_str()
            .map_err(|_| ApiError::InvalidToken)?;

        let token = bearer_token(header)?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(error = %e, "token verification failed");
            ApiError::InvalidToken
        })?;

        Ok(AuthUser(claims))
    }
}

/// Splits `Bearer <token>` on single spaces. An empty second segment (no
/// token, or a doubled space) counts as missing; any scheme other than
/// Bearer is rejected.
fn bearer_token(header: &str) -> Result<&str, ApiError> {
    let mut parts = header.split(' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts
        .next()
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::MissingToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") || parts.any(|p| !p.is_empty()) {
        return Err(ApiError::InvalidToken);
    }
    Ok(token)
}
