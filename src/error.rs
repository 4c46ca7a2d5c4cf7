use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("already exists")]
    AlreadyExists,

    #[error("token lookup collision")]
    TokenLookupCollision,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    #[error("invalid token format")]
    InvalidTokenFormat,

    #[error("token expired")]
    TokenExpired,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("cannot subscribe to your own course")]
    SelfSubscription,

    #[error("not subscribed to this course")]
    NotSubscribed,

    #[error("an offering already exists for this course")]
    DuplicateOffering,

    #[error("offering has no active price")]
    NoActivePrice,

    #[error("payment status cannot change from {from} to {to}")]
    IllegalStatusTransition { from: String, to: String },

    #[error("payment gateway error: {0}")]
    Gateway(String),

    #[error("mail delivery failed: {0}")]
    Mail(String),

    #[error("invalid capability: {0}")]
    InvalidCapability(String),
}

pub type Result<T> = std::result::Result<T, Error>;
