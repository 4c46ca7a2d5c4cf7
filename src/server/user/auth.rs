use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::auth::{RequireUser, hash_password, issue_token, verify_password};
use crate::server::AppState;
use crate::server::dto::{AuthResponse, LoginRequest, RegisterRequest, UserResponse};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::{normalize_email, validate_password};
use crate::types::{Capability, User};

/// Tokens issued by password login expire after this many days.
const LOGIN_TOKEN_DAYS: i64 = 30;

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    let email = normalize_email(&req.email)?;
    validate_password(&req.password, Some(&req.password_confirm))?;

    if state
        .store
        .get_user_by_email(&email)
        .api_err("Failed to check existing user")?
        .is_some()
    {
        return Err(ApiError::conflict("A user with this email already exists"));
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        email,
        first_name: blank_to_none(req.first_name),
        last_name: blank_to_none(req.last_name),
        phone: blank_to_none(req.phone),
        city: blank_to_none(req.city),
        password_hash: Some(hash_password(&req.password)?),
        capabilities: Capability::default(),
        is_active: true,
        last_login_at: Some(now),
        created_at: now,
        updated_at: now,
    };

    state.store.create_user(&user).map_err(|e| match e {
        crate::error::Error::AlreadyExists => {
            ApiError::conflict("A user with this email already exists")
        }
        other => ApiError::from(other),
    })?;

    let (_, token) = issue_token(
        state.store.as_ref(),
        false,
        Some(user.id.clone()),
        Some(Duration::days(LOGIN_TOKEN_DAYS)),
    )?;

    tracing::info!(user = %user.id, "user registered");
    Ok::<_, ApiError>((
        StatusCode::CREATED,
        Json(ApiResponse::success(AuthResponse { token, user })),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let invalid = || ApiError::unauthorized("Invalid email or password");

    let email = req.email.trim().to_lowercase();
    let user = state
        .store
        .get_user_by_email(&email)
        .api_err("Failed to look up user")?
        .ok_or_else(invalid)?;

    let hash = user.password_hash.as_deref().ok_or_else(invalid)?;
    if !verify_password(&req.password, hash)? {
        return Err(invalid());
    }

    if !user.is_active {
        return Err(ApiError::unauthorized("Account is inactive"));
    }

    let now = Utc::now();
    state
        .store
        .record_login(&user.id, now)
        .api_err("Failed to record login")?;

    let (_, token) = issue_token(
        state.store.as_ref(),
        false,
        Some(user.id.clone()),
        Some(Duration::days(LOGIN_TOKEN_DAYS)),
    )?;

    let user = User {
        last_login_at: Some(now),
        ..user
    };
    Ok::<_, ApiError>(Json(ApiResponse::success(AuthResponse { token, user })))
}

pub async fn me(auth: RequireUser) -> impl IntoResponse {
    Json(ApiResponse::success(UserResponse::from(auth.user)))
}
