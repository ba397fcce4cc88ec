use axum::{Router, routing::post};

use super::controller::{send_email_verification, verify_email_code};
use crate::state::AppState;

pub fn init_account_router() -> Router<AppState> {
    Router::new()
        .route("/email/verification", post(send_email_verification))
        .route("/email/verify", post(verify_email_code))
}
