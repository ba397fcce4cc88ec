use axum::{
    Router,
    routing::{get, post},
};

use super::controller::{forgot_password, reset_password, validate_reset_token};
use crate::state::AppState;

/// Mounted under `/api/auth` next to the login routes.
pub fn init_password_reset_router() -> Router<AppState> {
    Router::new()
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route("/reset-password/validate", get(validate_reset_token))
}
