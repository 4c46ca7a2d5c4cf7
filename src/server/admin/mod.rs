mod sessions;
mod tokens;
mod users;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::server::AppState;

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        // User routes
        .route("/users", post(users::create_user))
        .route("/users", get(users::list_users))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}/capabilities", put(users::set_capabilities))
        .route("/users/{id}/tokens", get(tokens::list_user_tokens))
        .route("/users/{id}/tokens", post(tokens::create_user_token))
        // Token routes
        .route("/tokens/{id}", get(tokens::get_token))
        .route("/tokens/{id}", delete(tokens::delete_token))
        // Payment session reconciliation
        .route(
            "/sessions/{external_id}/status",
            put(sessions::reconcile_session),
        )
}
