//! Bearer token format and hashing.
//!
//! A token reads `cw_<lookup>_<secret>`. The lookup half is stored in clear
//! and indexed so a request can find its row in one query; the full token is
//! only ever stored as an Argon2id hash.

use std::fmt;
use std::str::FromStr;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::error::{Error, Result};

const TOKEN_PREFIX: &str = "cw";
const LOOKUP_LEN: usize = 8;
const SECRET_LEN: usize = 24;

// Tokens carry 24 random hex chars, so a light parameter set is enough.
const HASH_MEMORY_KIB: u32 = 64 * 1024;
const HASH_PASSES: u32 = 1;
const HASH_LANES: u32 = 4;
const HASH_LEN: usize = 32;

/// A parsed, not yet verified, bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawToken {
    pub lookup: String,
    secret: String,
}

impl RawToken {
    fn random() -> Self {
        let mut rng = rand::thread_rng();
        let lookup: String = (&mut rng)
            .sample_iter(&Alphanumeric)
            .take(LOOKUP_LEN)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect();
        let mut bytes = [0u8; SECRET_LEN / 2];
        rng.fill(&mut bytes);
        Self {
            lookup,
            secret: hex::encode(bytes),
        }
    }
}

impl fmt::Display for RawToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{TOKEN_PREFIX}_{}_{}", self.lookup, self.secret)
    }
}

impl FromStr for RawToken {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split('_');
        let (Some(TOKEN_PREFIX), Some(lookup), Some(secret), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::InvalidTokenFormat);
        };
        if lookup.len() != LOOKUP_LEN || secret.len() != SECRET_LEN {
            return Err(Error::InvalidTokenFormat);
        }
        Ok(Self {
            lookup: lookup.to_string(),
            secret: secret.to_string(),
        })
    }
}

/// A freshly minted token: the value handed to the caller once, and the
/// pieces that get persisted.
pub struct MintedToken {
    pub raw: String,
    pub lookup: String,
    pub hash: String,
}

pub struct TokenHasher {
    argon2: Argon2<'static>,
}

impl TokenHasher {
    pub fn new() -> Result<Self> {
        let params = Params::new(HASH_MEMORY_KIB, HASH_PASSES, HASH_LANES, Some(HASH_LEN))
            .map_err(|e| Error::Config(format!("argon2 params: {e}")))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub fn mint(&self) -> Result<MintedToken> {
        let token = RawToken::random();
        let raw = token.to_string();
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(raw.as_bytes(), &salt)
            .map_err(|e| Error::Config(format!("failed to hash token: {e}")))?
            .to_string();
        Ok(MintedToken {
            raw,
            lookup: token.lookup,
            hash,
        })
    }

    /// Returns false on mismatch; errors only when `stored` is not a PHC string.
    pub fn matches(&self, raw: &str, stored: &str) -> Result<bool> {
        let stored = PasswordHash::new(stored)
            .map_err(|e| Error::Config(format!("invalid hash format: {e}")))?;
        match self.argon2.verify_password(raw.as_bytes(), &stored) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::Config(format!("failed to verify token: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minted_token_shape() {
        let minted = TokenHasher::new().unwrap().mint().unwrap();

        let parsed: RawToken = minted.raw.parse().unwrap();
        assert_eq!(parsed.lookup, minted.lookup);
        assert!(minted.raw.starts_with("cw_"));
        assert_eq!(minted.raw.len(), 3 + LOOKUP_LEN + 1 + SECRET_LEN);
        assert!(minted.hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_matches_only_the_minted_value() {
        let hasher = TokenHasher::new().unwrap();
        let minted = hasher.mint().unwrap();
        let other = hasher.mint().unwrap();

        assert!(hasher.matches(&minted.raw, &minted.hash).unwrap());
        assert!(!hasher.matches(&other.raw, &minted.hash).unwrap());
        assert!(hasher.matches(&minted.raw, "garbage").is_err());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in [
            "",
            "cw_12345678",
            "cw_12345678_abc",
            "xx_12345678_123456789012345678901234",
            "cw_1234567_1234567890123456789012345",
            "cw_12345678_123456789012345678901234_extra",
        ] {
            assert!(bad.parse::<RawToken>().is_err(), "accepted {bad:?}");
        }
        let ok: RawToken = "cw_abcd1234_123456789012345678901234".parse().unwrap();
        assert_eq!(ok.lookup, "abcd1234");
    }
}
