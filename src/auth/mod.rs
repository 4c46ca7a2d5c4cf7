mod helpers;
mod middleware;
mod password;
mod token;

pub use middleware::{AuthError, RequireAdmin, RequireUser};
pub use password::{MIN_PASSWORD_LENGTH, hash_password, verify_password};
pub use token::{MintedToken, RawToken, TokenHasher};

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::Token;

const MAX_LOOKUP_RETRIES: u32 = 3;

/// Mints a token record and its raw value. Only the hash is ever stored.
fn mint_token(
    hasher: &TokenHasher,
    is_admin: bool,
    user_id: Option<String>,
    expires_in: Option<Duration>,
) -> Result<(Token, String)> {
    let MintedToken { raw, lookup, hash } = hasher.mint()?;
    let now = Utc::now();
    let token = Token {
        id: Uuid::new_v4().to_string(),
        token_hash: hash,
        token_lookup: lookup,
        is_admin,
        user_id,
        created_at: now,
        expires_at: expires_in.map(|d| now + d),
        last_used_at: None,
    };
    Ok((token, raw))
}

/// Mints and stores a token, retrying when the random lookup collides with
/// an existing one. Returns the stored record and the raw token.
pub fn issue_token(
    store: &dyn Store,
    is_admin: bool,
    user_id: Option<String>,
    expires_in: Option<Duration>,
) -> Result<(Token, String)> {
    let hasher = TokenHasher::new()?;

    for _ in 0..MAX_LOOKUP_RETRIES {
        let (token, raw_token) = mint_token(&hasher, is_admin, user_id.clone(), expires_in)?;
        match store.create_token(&token) {
            Ok(()) => return Ok((token, raw_token)),
            Err(Error::TokenLookupCollision) => {
                tracing::debug!("token lookup collision, retrying");
            }
            Err(e) => return Err(e),
        }
    }

    Err(Error::TokenLookupCollision)
}
