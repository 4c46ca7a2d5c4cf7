use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::Error;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }
}

/// Paginated response for list endpoints
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    pub data: Vec<T>,
    pub page: i64,
    pub page_size: i64,
    pub has_more: bool,
}

/// Default and maximum page size for one kind of list.
#[derive(Debug, Clone, Copy)]
pub struct PageSize {
    pub default: i64,
    pub max: i64,
}

pub const COURSE_PAGE: PageSize = PageSize { default: 10, max: 50 };
pub const LESSON_PAGE: PageSize = PageSize { default: 15, max: 100 };
pub const SUBSCRIPTION_PAGE: PageSize = PageSize { default: 20, max: 100 };
pub const PAYMENT_PAGE: PageSize = PageSize { default: 20, max: 100 };
pub const CATALOG_PAGE: PageSize = PageSize { default: 20, max: 100 };
pub const USER_PAGE: PageSize = PageSize { default: 50, max: 200 };

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub page_size: Option<i64>,
}

/// A resolved 1-based page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: i64,
    pub size: i64,
}

impl Page {
    pub fn resolve(page: Option<i64>, page_size: Option<i64>, sizes: PageSize) -> Self {
        Self {
            number: page.unwrap_or(1).max(1),
            size: page_size.unwrap_or(sizes.default).clamp(1, sizes.max),
        }
    }

    /// Saturates, since `number` comes straight from the query string.
    pub fn offset(&self) -> i64 {
        (self.number - 1).saturating_mul(self.size)
    }

    /// One row more than a page, to learn whether another page exists.
    pub fn fetch_limit(&self) -> i64 {
        self.size + 1
    }

    pub fn respond<T, U: Serialize>(
        &self,
        items: Vec<T>,
        map: impl FnMut(T) -> U,
    ) -> PaginatedResponse<U> {
        let has_more = items.len() as i64 > self.size;
        let data = items
            .into_iter()
            .take(self.size as usize)
            .map(map)
            .collect();
        PaginatedResponse {
            data,
            page: self.number,
            page_size: self.size,
            has_more,
        }
    }
}

impl PageParams {
    pub fn resolve(&self, sizes: PageSize) -> Page {
        Page::resolve(self.page, self.page_size, sizes)
    }
}

/// API error that converts to a proper HTTP response
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound(what) => Self::not_found(format!("{} not found", capitalize(what))),
            Error::AlreadyExists => Self::conflict("Already exists"),
            Error::Unauthorized | Error::InvalidTokenFormat | Error::TokenExpired => {
                Self::unauthorized(err.to_string())
            }
            Error::Forbidden(message) => Self::forbidden(message),
            Error::Validation(message) => Self::bad_request(message),
            Error::Gateway(message) => Self::bad_request(message),
            Error::SelfSubscription
            | Error::NotSubscribed
            | Error::DuplicateOffering
            | Error::NoActivePrice
            | Error::IllegalStatusTransition { .. }
            | Error::InvalidCapability(_) => Self::bad_request(err.to_string()),
            Error::Database(_)
            | Error::Io(_)
            | Error::Config(_)
            | Error::Mail(_)
            | Error::TokenLookupCollision => {
                tracing::error!("request failed: {err}");
                Self::internal("Internal server error")
            }
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "data": null, "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

/// Extension trait for converting store results to API errors with a custom message.
pub trait StoreResultExt<T> {
    fn api_err(self, message: &'static str) -> Result<T, ApiError>;
}

impl<T> StoreResultExt<T> for crate::error::Result<T> {
    fn api_err(self, message: &'static str) -> Result<T, ApiError> {
        self.map_err(|e| {
            tracing::error!("{message}: {e}");
            ApiError::internal(message)
        })
    }
}

/// Extension for Option types from store operations.
pub trait StoreOptionExt<T> {
    fn or_not_found(self, message: &'static str) -> Result<T, ApiError>;
}

impl<T> StoreOptionExt<T> for Option<T> {
    fn or_not_found(self, message: &'static str) -> Result<T, ApiError> {
        self.ok_or_else(|| ApiError::not_found(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_resolution_clamps() {
        let page = Page::resolve(None, None, COURSE_PAGE);
        assert_eq!(page, Page { number: 1, size: 10 });

        let page = Page::resolve(Some(0), Some(500), COURSE_PAGE);
        assert_eq!(page, Page { number: 1, size: 50 });

        let page = Page::resolve(Some(3), Some(15), LESSON_PAGE);
        assert_eq!(page.offset(), 30);
        assert_eq!(page.fetch_limit(), 16);
    }

    #[test]
    fn test_huge_page_number_saturates() {
        let page = Page::resolve(Some(i64::MAX), None, COURSE_PAGE);
        assert_eq!(page.offset(), i64::MAX);

        let page = Page::resolve(Some(i64::MAX), Some(i64::MAX), USER_PAGE);
        assert_eq!(page.offset(), i64::MAX);
    }

    #[test]
    fn test_respond_trims_extra_row() {
        let page = Page { number: 1, size: 2 };
        let response = page.respond(vec![1, 2, 3], |n| n * 10);
        assert_eq!(response.data, vec![10, 20]);
        assert!(response.has_more);

        let response = page.respond(vec![1], |n| n);
        assert!(!response.has_more);
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            ApiError::from(Error::NotFound("course")).status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(Error::SelfSubscription).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(Error::Gateway("card declined".into())).message,
            "card declined"
        );
        assert_eq!(
            ApiError::from(Error::Forbidden("nope")).status,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(Error::Config("x".into())).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
