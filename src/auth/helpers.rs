use std::sync::Arc;

use chrono::Utc;

use super::{RawToken, TokenHasher};
use crate::server::AppState;
use crate::types::Token;

#[derive(Debug)]
pub enum TokenValidationError {
    InvalidScheme,
    InvalidToken,
    TokenExpired,
    InternalError,
}

/// Extracts a token string from a Basic auth header.
/// Expects format: Basic base64(x-token:actual_token)
pub fn extract_basic_auth_token(header: &str) -> Option<String> {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    let encoded = header.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;

    let (username, password) = credentials.split_once(':')?;

    if username != "x-token" {
        return None;
    }

    Some(password.to_string())
}

/// Validates a raw token string against the store and stamps its last use.
pub fn validate_token(
    state: &Arc<AppState>,
    raw_token: &str,
) -> Result<Token, TokenValidationError> {
    let parsed: RawToken = raw_token
        .parse()
        .map_err(|_| TokenValidationError::InvalidToken)?;

    let token = state
        .store
        .get_token_by_lookup(&parsed.lookup)
        .map_err(|_| TokenValidationError::InternalError)?
        .ok_or(TokenValidationError::InvalidToken)?;

    let hasher = TokenHasher::new().map_err(|_| TokenValidationError::InternalError)?;
    if !hasher
        .matches(raw_token, &token.token_hash)
        .map_err(|_| TokenValidationError::InternalError)?
    {
        return Err(TokenValidationError::InvalidToken);
    }

    if let Some(expires_at) = &token.expires_at {
        if expires_at < &Utc::now() {
            return Err(TokenValidationError::TokenExpired);
        }
    }

    if let Err(e) = state.store.update_token_last_used(&token.id) {
        tracing::warn!("Failed to update token last_used_at: {e}");
    }

    Ok(token)
}

/// Extracts token from Authorization header (Bearer or Basic).
/// Returns None if no auth header is present.
/// Returns Err if the auth scheme is unsupported.
pub fn extract_token_from_header(
    auth_header: Option<&str>,
) -> Result<Option<String>, TokenValidationError> {
    let Some(header) = auth_header else {
        return Ok(None);
    };

    if let Some(token) = header.strip_prefix("Bearer ") {
        return Ok(Some(token.trim().to_string()));
    }

    if header.starts_with("Basic ") {
        return extract_basic_auth_token(header)
            .ok_or(TokenValidationError::InvalidToken)
            .map(Some);
    }

    Err(TokenValidationError::InvalidScheme)
}
