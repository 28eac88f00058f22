use crate::state::AppState;
use axum::Router;

mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod services;

pub use extractors::AuthUser;
pub use jwt::TokenService;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::user_routes())
}
