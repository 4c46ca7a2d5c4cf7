use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Duration;

use crate::auth::{RequireAdmin, issue_token};
use crate::server::AppState;
use crate::server::dto::{CreateTokenResponse, CreateUserTokenRequest};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};

pub async fn list_user_tokens(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state
        .store
        .get_user(&id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    let tokens = state
        .store
        .list_user_tokens(&id)
        .api_err("Failed to list tokens")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(tokens)))
}

pub async fn create_user_token(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CreateUserTokenRequest>,
) -> impl IntoResponse {
    let user = state
        .store
        .get_user(&id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    let expires_in = match req.expires_in_seconds {
        Some(secs) if secs <= 0 => {
            return Err(ApiError::bad_request("expires_in_seconds must be positive"));
        }
        Some(secs) => Some(Duration::seconds(secs)),
        None => None,
    };

    let (metadata, token) = issue_token(state.store.as_ref(), false, Some(user.id), expires_in)?;

    Ok::<_, ApiError>((
        StatusCode::CREATED,
        Json(ApiResponse::success(CreateTokenResponse { token, metadata })),
    ))
}

pub async fn get_token(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let token = state
        .store
        .get_token_by_id(&id)
        .api_err("Failed to get token")?
        .or_not_found("Token not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(token)))
}

pub async fn delete_token(
    admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let token = state
        .store
        .get_token_by_id(&id)
        .api_err("Failed to get token")?
        .or_not_found("Token not found")?;

    if token.id == admin.0.id {
        return Err(ApiError::bad_request("Cannot delete current token"));
    }

    state
        .store
        .delete_token(&token.id)
        .api_err("Failed to delete token")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
