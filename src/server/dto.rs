use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    Capability, Course, Currency, LessonSummary, PaidItem, Payment, PaymentMethod, Token,
    User,
};

// Auth

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    #[serde(flatten)]
    pub user: User,
    pub capability_names: Vec<&'static str>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            capability_names: user.capabilities.to_strings(),
            user,
        }
    }
}

// Courses and lessons

#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCourseRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CourseResponse {
    #[serde(flatten)]
    pub course: Course,
    pub lessons_count: usize,
    pub lessons: Vec<LessonSummary>,
}

#[derive(Debug, Deserialize)]
pub struct CreateLessonRequest {
    pub course_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub video_url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateLessonRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
}

// Subscriptions

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub course_id: String,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionStatusResponse {
    pub course_id: String,
    pub status: &'static str,
    pub message: &'static str,
}

// Checkout

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub course_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatePriceRequest {
    pub product_id: String,
    pub amount: f64,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub course_id: String,
    pub success_url: String,
    pub cancel_url: String,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub session_id: String,
    pub payment_status: String,
    pub local_status: String,
}

#[derive(Debug, Deserialize)]
pub struct ReconcileRequest {
    pub status: String,
}

// Payments ledger

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default)]
    pub lesson_id: Option<String>,
    pub amount: f64,
    pub method: String,
    #[serde(default)]
    pub payment_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaymentListParams {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub page_size: Option<i64>,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub lesson: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub amount_min: Option<f64>,
    #[serde(default)]
    pub amount_max: Option<f64>,
    #[serde(default)]
    pub date_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub ordering: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: String,
    pub user_id: String,
    pub item: PaidItem,
    pub amount: f64,
    pub method: PaymentMethod,
    pub method_display: &'static str,
    pub payment_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            user_id: payment.user_id,
            item: payment.item,
            amount: payment.amount,
            method_display: payment.method.display_name(),
            method: payment.method,
            payment_date: payment.payment_date,
            created_at: payment.created_at,
        }
    }
}

// Admin

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetCapabilitiesRequest {
    pub capabilities: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateUserTokenRequest {
    #[serde(default)]
    pub expires_in_seconds: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CreateTokenResponse {
    pub token: String,
    pub metadata: Token,
}

/// Parses a currency, defaulting to usd when absent.
pub fn parse_currency(raw: Option<&str>) -> crate::error::Result<Currency> {
    match raw {
        Some(raw) => raw.parse(),
        None => Ok(Currency::default()),
    }
}

pub fn parse_capabilities(names: &[String]) -> crate::error::Result<Capability> {
    Capability::parse_many(names).ok_or_else(|| {
        let bad = names
            .iter()
            .find(|n| Capability::parse(n).is_none())
            .cloned()
            .unwrap_or_default();
        crate::error::Error::InvalidCapability(bad)
    })
}
