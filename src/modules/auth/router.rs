use axum::{
    Router,
    routing::{get, post},
};

use super::controller::{login, logout, me, refresh, validate};
use crate::state::AppState;

pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/validate", post(validate))
        .route("/logout", post(logout))
        .route("/me", get(me))
}
