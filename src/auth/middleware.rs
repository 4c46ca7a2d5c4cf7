use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;

use super::helpers::{TokenValidationError, extract_token_from_header, validate_token};
use crate::server::AppState;
use crate::types::{Token, User};

/// Admin token; only valid on `/api/v1/admin` routes.
pub struct RequireAdmin(pub Token);

/// Active user behind a user token. Extracting this stamps the user's
/// `last_login_at`, which the inactivity sweep reads.
pub struct RequireUser {
    pub token: Token,
    pub user: User,
}

#[derive(Debug)]
pub enum AuthError {
    MissingAuth,
    InvalidScheme,
    InvalidToken,
    TokenExpired,
    InactiveUser,
    NotAdmin,
    NotUser,
    InternalError,
}

impl AuthError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotAdmin | Self::NotUser => StatusCode::FORBIDDEN,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Self::MissingAuth => "Authentication required",
            Self::InvalidScheme => "Invalid authorization scheme",
            Self::InvalidToken => "Invalid token",
            Self::TokenExpired => "Token expired",
            Self::InactiveUser => "Account is inactive",
            Self::NotAdmin => "Admin access required",
            Self::NotUser => "User token required for this operation",
            Self::InternalError => "Internal server error",
        }
    }
}

impl From<TokenValidationError> for AuthError {
    fn from(e: TokenValidationError) -> Self {
        match e {
            TokenValidationError::InvalidScheme => Self::InvalidScheme,
            TokenValidationError::InvalidToken => Self::InvalidToken,
            TokenValidationError::TokenExpired => Self::TokenExpired,
            TokenValidationError::InternalError => Self::InternalError,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response =
            (status, Json(json!({ "data": null, "error": self.message() }))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer realm=\"coursework\""),
            );
        }
        response
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(parts, state)? {
            token if token.is_admin => Ok(Self(token)),
            _ => Err(AuthError::NotAdmin),
        }
    }
}

impl FromRequestParts<Arc<AppState>> for RequireUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts, state)?;
        let user = token_owner(state, &token)?;

        if let Err(e) = state.store.record_login(&user.id, Utc::now()) {
            tracing::warn!(user_id = %user.id, "failed to record activity: {e}");
        }

        Ok(Self { token, user })
    }
}

fn token_owner(state: &AppState, token: &Token) -> Result<User, AuthError> {
    let user_id = match (&token.user_id, token.is_admin) {
        (Some(id), false) => id,
        _ => return Err(AuthError::NotUser),
    };
    let user = state
        .store
        .get_user(user_id)
        .map_err(|_| AuthError::InternalError)?
        .ok_or(AuthError::NotUser)?;
    if user.is_active {
        Ok(user)
    } else {
        Err(AuthError::InactiveUser)
    }
}

fn bearer_token(parts: &Parts, state: &Arc<AppState>) -> Result<Token, AuthError> {
    let authorization = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());
    let raw = extract_token_from_header(authorization)?.ok_or(AuthError::MissingAuth)?;
    Ok(validate_token(state, &raw)?)
}
