use reqwest::Url;

use crate::auth::MIN_PASSWORD_LENGTH;
use crate::server::response::ApiError;

const MAX_TITLE_LEN: usize = 200;
const MAX_EMAIL_LEN: usize = 254;

/// Hosts accepted for lesson videos, compared exactly after lowercasing.
const ALLOWED_VIDEO_HOSTS: &[&str] = &["youtube.com", "www.youtube.com", "youtu.be"];

pub fn validate_title(title: &str, entity: &str) -> Result<(), ApiError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ApiError::bad_request(format!("{entity} title cannot be empty")));
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(ApiError::bad_request(format!(
            "{entity} title cannot exceed {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_video_url(raw: &str) -> Result<(), ApiError> {
    let url = Url::parse(raw.trim())
        .map_err(|_| ApiError::bad_request("video_url must be a valid URL"))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::bad_request("video_url must use http or https"));
    }

    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    if !ALLOWED_VIDEO_HOSTS.contains(&host.as_str()) {
        return Err(ApiError::bad_request(
            "Only YouTube links are allowed (youtube.com, www.youtube.com, youtu.be)",
        ));
    }
    Ok(())
}

/// Trims and lowercases an email, rejecting obviously malformed input.
pub fn normalize_email(email: &str) -> Result<String, ApiError> {
    let email = email.trim().to_lowercase();
    let valid = email.len() <= MAX_EMAIL_LEN
        && !email.contains(char::is_whitespace)
        && email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.'));

    if !valid {
        return Err(ApiError::bad_request("Enter a valid email address"));
    }
    Ok(email)
}

pub fn validate_password(password: &str, confirm: Option<&str>) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if confirm.is_some_and(|c| c != password) {
        return Err(ApiError::bad_request("Passwords do not match"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_url_allow_list() {
        for ok in [
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://YouTube.com/watch?v=x",
        ] {
            assert!(validate_video_url(ok).is_ok(), "{ok}");
        }

        for bad in [
            "https://vimeo.com/123456789",
            "https://sub.youtube.com/watch?v=x",
            "https://youtube.com.evil.com/x",
            "ftp://youtube.com/x",
            "not a url",
        ] {
            assert!(validate_video_url(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_title() {
        assert!(validate_title("Rust 101", "Course").is_ok());
        assert!(validate_title("   ", "Course").is_err());
        assert!(validate_title(&"x".repeat(201), "Lesson").is_err());
    }

    #[test]
    fn test_email_normalization() {
        assert_eq!(
            normalize_email("  Alice@Example.COM ").unwrap(),
            "alice@example.com"
        );
        assert!(normalize_email("alice").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("alice@localhost").is_err());
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("longenough", Some("longenough")).is_ok());
        assert!(validate_password("short", None).is_err());
        assert!(validate_password("longenough", Some("different")).is_err());
    }
}
