use crate::state::AppState;
use axum::Router;

mod claims;
mod dto;
pub(crate) mod extractors;
pub mod handlers;
mod jwt;
mod password;
pub mod repo;
mod repo_types;
mod services;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}
