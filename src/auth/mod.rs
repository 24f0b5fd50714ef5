use crate::state::AppState;
use axum::Router;

pub mod credentials;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod validation;
pub mod verification;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}

pub fn verify_router() -> Router<AppState> {
    handlers::verify_routes()
}
