mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::*;

/// Filters for the manual payments ledger. Every field is optional and the
/// populated ones are combined with AND.
#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    pub user_id: Option<String>,
    pub course_id: Option<String>,
    pub lesson_id: Option<String>,
    pub method: Option<PaymentMethod>,
    pub amount_min: Option<f64>,
    pub amount_max: Option<f64>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    /// Substring matched against payer email, course title and lesson title.
    pub search: Option<String>,
    pub ordering: PaymentOrdering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOrderField {
    PaymentDate,
    Amount,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentOrdering {
    pub field: PaymentOrderField,
    pub descending: bool,
}

impl Default for PaymentOrdering {
    fn default() -> Self {
        Self {
            field: PaymentOrderField::PaymentDate,
            descending: true,
        }
    }
}

impl PaymentOrdering {
    /// Parses `payment_date`, `amount` or `created_at`, optionally prefixed
    /// with `-` for descending order.
    pub fn parse(s: &str) -> Option<Self> {
        let (descending, name) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let field = match name {
            "payment_date" => PaymentOrderField::PaymentDate,
            "amount" => PaymentOrderField::Amount,
            "created_at" => PaymentOrderField::CreatedAt,
            _ => return None,
        };
        Some(Self { field, descending })
    }
}

/// Store defines the database interface.
///
/// List operations take an `offset` and `limit`; callers ask for one row
/// more than a page to learn whether another page exists.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // User operations
    fn create_user(&self, user: &User) -> Result<()>;
    fn get_user(&self, id: &str) -> Result<Option<User>>;
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    fn list_users(&self, offset: i64, limit: i64) -> Result<Vec<User>>;
    fn update_user(&self, user: &User) -> Result<()>;
    fn record_login(&self, id: &str, at: DateTime<Utc>) -> Result<()>;
    /// Deactivates active users whose last login (or creation, if they never
    /// logged in) is older than `cutoff`. Returns the number deactivated.
    fn deactivate_users_inactive_since(&self, cutoff: DateTime<Utc>) -> Result<usize>;

    // Token operations
    fn create_token(&self, token: &Token) -> Result<()>;
    fn get_token_by_id(&self, id: &str) -> Result<Option<Token>>;
    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>>;
    fn list_user_tokens(&self, user_id: &str) -> Result<Vec<Token>>;
    fn delete_token(&self, id: &str) -> Result<bool>;
    fn update_token_last_used(&self, id: &str) -> Result<()>;
    fn has_admin_token(&self) -> Result<bool>;

    // Course operations
    fn create_course(&self, course: &Course) -> Result<()>;
    fn get_course(&self, id: &str) -> Result<Option<Course>>;
    fn list_courses(&self, offset: i64, limit: i64) -> Result<Vec<Course>>;
    fn update_course(&self, course: &Course) -> Result<()>;
    fn delete_course(&self, id: &str) -> Result<bool>;

    // Lesson operations
    fn create_lesson(&self, lesson: &Lesson) -> Result<()>;
    fn get_lesson(&self, id: &str) -> Result<Option<Lesson>>;
    fn list_lessons(&self, offset: i64, limit: i64) -> Result<Vec<Lesson>>;
    fn list_course_lessons(&self, course_id: &str) -> Result<Vec<Lesson>>;
    fn update_lesson(&self, lesson: &Lesson) -> Result<()>;
    fn delete_lesson(&self, id: &str) -> Result<bool>;

    // Subscription operations
    /// Atomic get-or-create on (user, course) that also reactivates an
    /// inactive row.
    fn activate_subscription(&self, user_id: &str, course_id: &str) -> Result<SubscribeOutcome>;
    /// Marks the row inactive. Returns false if no row exists.
    fn deactivate_subscription(&self, user_id: &str, course_id: &str) -> Result<bool>;
    fn get_subscription(&self, user_id: &str, course_id: &str) -> Result<Option<Subscription>>;
    fn list_user_subscriptions(
        &self,
        user_id: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Subscription>>;
    fn list_active_subscriber_emails(&self, course_id: &str) -> Result<Vec<String>>;

    // Offering operations
    fn create_offering(&self, offering: &Offering) -> Result<()>;
    fn get_offering(&self, id: &str) -> Result<Option<Offering>>;
    fn get_offering_by_course(&self, course_id: &str) -> Result<Option<Offering>>;
    fn list_offerings(&self, offset: i64, limit: i64) -> Result<Vec<Offering>>;

    // Price operations
    fn create_price(&self, price: &Price) -> Result<()>;
    fn get_price(&self, id: &str) -> Result<Option<Price>>;
    fn list_prices(&self, offset: i64, limit: i64) -> Result<Vec<Price>>;
    /// First active price of an offering, newest first.
    fn first_active_price(&self, offering_id: &str) -> Result<Option<Price>>;

    // Payment attempt operations
    fn create_payment_attempt(&self, attempt: &PaymentAttempt) -> Result<()>;
    fn get_payment_attempt(&self, id: &str) -> Result<Option<PaymentAttempt>>;
    fn get_payment_attempt_by_external_id(
        &self,
        external_session_id: &str,
    ) -> Result<Option<PaymentAttempt>>;
    fn get_payment_attempt_by_idempotency_key(&self, key: &str) -> Result<Option<PaymentAttempt>>;
    fn list_user_payment_attempts(
        &self,
        user_id: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<PaymentAttempt>>;
    fn update_payment_attempt_status(&self, id: &str, status: PaymentStatus) -> Result<()>;

    // Payments ledger operations
    fn create_payment(&self, payment: &Payment) -> Result<()>;
    fn get_payment(&self, id: &str) -> Result<Option<Payment>>;
    fn list_payments(&self, filter: &PaymentFilter, offset: i64, limit: i64)
    -> Result<Vec<Payment>>;

    fn close(&self) -> Result<()>;
}
