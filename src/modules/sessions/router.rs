use axum::{
    Router,
    routing::{delete, get, post},
};

use super::controller::{list_sessions, revoke_all_sessions, revoke_other_sessions, revoke_session};
use crate::state::AppState;

pub fn init_sessions_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sessions))
        .route("/{id}", delete(revoke_session))
        .route("/revoke-others", post(revoke_other_sessions))
        .route("/revoke-all", post(revoke_all_sessions))
}
