use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{RequireAdmin, hash_password};
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{
    CreateUserRequest, SetCapabilitiesRequest, UserResponse, parse_capabilities,
};
use crate::server::response::{
    ApiError, ApiResponse, PageParams, StoreOptionExt, StoreResultExt, USER_PAGE,
};
use crate::server::validation::{normalize_email, validate_password};
use crate::types::User;

pub async fn create_user(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> impl IntoResponse {
    let email = normalize_email(&req.email)?;
    let capabilities = parse_capabilities(&req.capabilities)?;

    let password_hash = match req.password.as_deref() {
        Some(password) => {
            validate_password(password, None)?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        email,
        first_name: req.first_name,
        last_name: req.last_name,
        phone: None,
        city: None,
        password_hash,
        capabilities,
        is_active: true,
        last_login_at: None,
        created_at: now,
        updated_at: now,
    };

    state.store.create_user(&user).map_err(|e| match e {
        Error::AlreadyExists => ApiError::conflict("A user with this email already exists"),
        other => ApiError::from(other),
    })?;

    tracing::info!(user = %user.id, "user created by admin");
    Ok::<_, ApiError>((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserResponse::from(user))),
    ))
}

pub async fn list_users(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> impl IntoResponse {
    let page = params.resolve(USER_PAGE);

    let users = state
        .store
        .list_users(page.offset(), page.fetch_limit())
        .api_err("Failed to list users")?;

    Ok::<_, ApiError>(Json(page.respond(users, UserResponse::from)))
}

pub async fn get_user(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let user = state
        .store
        .get_user(&id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(UserResponse::from(user))))
}

/// Replaces the user's capability set.
pub async fn set_capabilities(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SetCapabilitiesRequest>,
) -> impl IntoResponse {
    let capabilities = parse_capabilities(&req.capabilities)?;

    let mut user = state
        .store
        .get_user(&id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    user.capabilities = capabilities;
    user.updated_at = Utc::now();

    state
        .store
        .update_user(&user)
        .api_err("Failed to update user")?;

    tracing::info!(user = %user.id, capabilities = ?user.capabilities.to_strings(), "capabilities updated");
    Ok::<_, ApiError>(Json(ApiResponse::success(UserResponse::from(user))))
}
