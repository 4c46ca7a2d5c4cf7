use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Value, ValueRef};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params, params_from_iter};

use super::schema::SCHEMA;
use super::{PaymentFilter, PaymentOrderField, Store};
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

/// Fixed-width UTC timestamps so text comparison in SQL matches time order.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

macro_rules! text_enum_sql {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: Error| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

text_enum_sql!(PaymentStatus);
text_enum_sql!(Currency);
text_enum_sql!(PaymentMethod);

const USER_COLUMNS: &str = "id, email, first_name, last_name, phone, city, password_hash, \
     capabilities, is_active, last_login_at, created_at, updated_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        phone: row.get(4)?,
        city: row.get(5)?,
        password_hash: row.get(6)?,
        capabilities: Capability::from(row.get::<_, i64>(7)?),
        is_active: row.get(8)?,
        last_login_at: row.get::<_, Option<String>>(9)?.map(|s| parse_datetime(&s)),
        created_at: parse_datetime(&row.get::<_, String>(10)?),
        updated_at: parse_datetime(&row.get::<_, String>(11)?),
    })
}

const TOKEN_COLUMNS: &str =
    "id, token_hash, token_lookup, is_admin, user_id, created_at, expires_at, last_used_at";

fn token_from_row(row: &Row<'_>) -> rusqlite::Result<Token> {
    Ok(Token {
        id: row.get(0)?,
        token_hash: row.get(1)?,
        token_lookup: row.get(2)?,
        is_admin: row.get(3)?,
        user_id: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        expires_at: row.get::<_, Option<String>>(6)?.map(|s| parse_datetime(&s)),
        last_used_at: row.get::<_, Option<String>>(7)?.map(|s| parse_datetime(&s)),
    })
}

const COURSE_COLUMNS: &str = "id, title, description, owner_id, created_at, updated_at";

fn course_from_row(row: &Row<'_>) -> rusqlite::Result<Course> {
    Ok(Course {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        owner_id: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
        updated_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

const LESSON_COLUMNS: &str =
    "id, course_id, title, description, video_url, owner_id, created_at, updated_at";

fn lesson_from_row(row: &Row<'_>) -> rusqlite::Result<Lesson> {
    Ok(Lesson {
        id: row.get(0)?,
        course_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        video_url: row.get(4)?,
        owner_id: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
        updated_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

fn subscription_from_row(row: &Row<'_>) -> rusqlite::Result<Subscription> {
    Ok(Subscription {
        user_id: row.get(0)?,
        course_id: row.get(1)?,
        is_active: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
    })
}

const OFFERING_COLUMNS: &str =
    "id, course_id, external_product_id, name, description, created_at, updated_at";

fn offering_from_row(row: &Row<'_>) -> rusqlite::Result<Offering> {
    Ok(Offering {
        id: row.get(0)?,
        course_id: row.get(1)?,
        external_product_id: row.get(2)?,
        name: row.get(3)?,
        description: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        updated_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

const PRICE_COLUMNS: &str = "id, offering_id, external_price_id, amount, unit_amount, currency, \
     is_active, created_at, updated_at";

fn price_from_row(row: &Row<'_>) -> rusqlite::Result<Price> {
    Ok(Price {
        id: row.get(0)?,
        offering_id: row.get(1)?,
        external_price_id: row.get(2)?,
        amount: row.get(3)?,
        unit_amount: row.get(4)?,
        currency: row.get(5)?,
        is_active: row.get(6)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?),
        updated_at: parse_datetime(&row.get::<_, String>(8)?),
    })
}

const ATTEMPT_COLUMNS: &str = "id, user_id, course_id, external_session_id, checkout_url, \
     idempotency_key, amount, currency, status, created_at, updated_at";

fn attempt_from_row(row: &Row<'_>) -> rusqlite::Result<PaymentAttempt> {
    Ok(PaymentAttempt {
        id: row.get(0)?,
        user_id: row.get(1)?,
        course_id: row.get(2)?,
        external_session_id: row.get(3)?,
        checkout_url: row.get(4)?,
        idempotency_key: row.get(5)?,
        amount: row.get(6)?,
        currency: row.get(7)?,
        status: row.get(8)?,
        created_at: parse_datetime(&row.get::<_, String>(9)?),
        updated_at: parse_datetime(&row.get::<_, String>(10)?),
    })
}

const PAYMENT_COLUMNS: &str = "p.id, p.user_id, p.course_id, p.lesson_id, p.amount, p.method, \
     p.payment_date, p.created_at";

fn payment_from_row(row: &Row<'_>) -> rusqlite::Result<Payment> {
    let course_id: Option<String> = row.get(2)?;
    let lesson_id: Option<String> = row.get(3)?;
    let item = match (course_id, lesson_id) {
        (Some(id), None) => PaidItem::Course(id),
        (None, Some(id)) => PaidItem::Lesson(id),
        _ => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Null,
                Box::new(Error::Validation(
                    "payment must reference exactly one of course or lesson".to_string(),
                )),
            ));
        }
    };

    Ok(Payment {
        id: row.get(0)?,
        user_id: row.get(1)?,
        item,
        amount: row.get(4)?,
        method: row.get(5)?,
        payment_date: parse_datetime(&row.get::<_, String>(6)?),
        created_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // User operations

    fn create_user(&self, user: &User) -> Result<()> {
        let result = self.conn().execute(
            &format!(
                "INSERT INTO users ({USER_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
            ),
            params![
                user.id,
                user.email,
                user.first_name,
                user.last_name,
                user.phone,
                user.city,
                user.password_hash,
                i64::from(user.capabilities),
                user.is_active,
                user.last_login_at.as_ref().map(format_datetime),
                format_datetime(&user.created_at),
                format_datetime(&user.updated_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(Error::AlreadyExists)
            }
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                user_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
                user_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_users(&self, offset: i64, limit: i64) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY email LIMIT ?1 OFFSET ?2"
        ))?;

        let rows = stmt.query_map(params![limit, offset], user_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_user(&self, user: &User) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE users SET first_name = ?1, last_name = ?2, phone = ?3, city = ?4,
                    password_hash = ?5, capabilities = ?6, is_active = ?7, updated_at = ?8
             WHERE id = ?9",
            params![
                user.first_name,
                user.last_name,
                user.phone,
                user.city,
                user.password_hash,
                i64::from(user.capabilities),
                user.is_active,
                format_datetime(&Utc::now()),
                user.id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound("user"));
        }
        Ok(())
    }

    fn record_login(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        self.conn().execute(
            "UPDATE users SET last_login_at = ?1 WHERE id = ?2",
            params![format_datetime(&at), id],
        )?;
        Ok(())
    }

    fn deactivate_users_inactive_since(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let rows = self.conn().execute(
            "UPDATE users SET is_active = 0, updated_at = ?1
             WHERE is_active = 1 AND COALESCE(last_login_at, created_at) < ?2",
            params![format_datetime(&Utc::now()), format_datetime(&cutoff)],
        )?;
        Ok(rows)
    }

    // Token operations

    fn create_token(&self, token: &Token) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO tokens (id, token_hash, token_lookup, is_admin, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                token.id,
                token.token_hash,
                token.token_lookup,
                token.is_admin,
                token.user_id,
                format_datetime(&token.created_at),
                token.expires_at.as_ref().map(format_datetime),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(Error::TokenLookupCollision)
            }
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_token_by_id(&self, id: &str) -> Result<Option<Token>> {
        self.conn()
            .query_row(
                &format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE id = ?1"),
                params![id],
                token_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>> {
        self.conn()
            .query_row(
                &format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE token_lookup = ?1"),
                params![lookup],
                token_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_user_tokens(&self, user_id: &str) -> Result<Vec<Token>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens WHERE user_id = ?1 ORDER BY created_at DESC"
        ))?;

        let rows = stmt.query_map(params![user_id], token_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_token(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM tokens WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn update_token_last_used(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE tokens SET last_used_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    fn has_admin_token(&self) -> Result<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM tokens WHERE is_admin = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // Course operations

    fn create_course(&self, course: &Course) -> Result<()> {
        self.conn().execute(
            &format!("INSERT INTO courses ({COURSE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
            params![
                course.id,
                course.title,
                course.description,
                course.owner_id,
                format_datetime(&course.created_at),
                format_datetime(&course.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_course(&self, id: &str) -> Result<Option<Course>> {
        self.conn()
            .query_row(
                &format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?1"),
                params![id],
                course_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_courses(&self, offset: i64, limit: i64) -> Result<Vec<Course>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses
             ORDER BY created_at DESC, id LIMIT ?1 OFFSET ?2"
        ))?;

        let rows = stmt.query_map(params![limit, offset], course_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_course(&self, course: &Course) -> Result<()> {
        // owner_id is immutable
        let rows = self.conn().execute(
            "UPDATE courses SET title = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
            params![
                course.title,
                course.description,
                format_datetime(&course.updated_at),
                course.id
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound("course"));
        }
        Ok(())
    }

    fn delete_course(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM courses WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Lesson operations

    fn create_lesson(&self, lesson: &Lesson) -> Result<()> {
        self.conn().execute(
            &format!(
                "INSERT INTO lessons ({LESSON_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
            ),
            params![
                lesson.id,
                lesson.course_id,
                lesson.title,
                lesson.description,
                lesson.video_url,
                lesson.owner_id,
                format_datetime(&lesson.created_at),
                format_datetime(&lesson.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_lesson(&self, id: &str) -> Result<Option<Lesson>> {
        self.conn()
            .query_row(
                &format!("SELECT {LESSON_COLUMNS} FROM lessons WHERE id = ?1"),
                params![id],
                lesson_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_lessons(&self, offset: i64, limit: i64) -> Result<Vec<Lesson>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {LESSON_COLUMNS} FROM lessons ORDER BY created_at, id LIMIT ?1 OFFSET ?2"
        ))?;

        let rows = stmt.query_map(params![limit, offset], lesson_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_course_lessons(&self, course_id: &str) -> Result<Vec<Lesson>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {LESSON_COLUMNS} FROM lessons WHERE course_id = ?1 ORDER BY created_at, id"
        ))?;

        let rows = stmt.query_map(params![course_id], lesson_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_lesson(&self, lesson: &Lesson) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE lessons SET title = ?1, description = ?2, video_url = ?3, updated_at = ?4
             WHERE id = ?5",
            params![
                lesson.title,
                lesson.description,
                lesson.video_url,
                format_datetime(&lesson.updated_at),
                lesson.id
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound("lesson"));
        }
        Ok(())
    }

    fn delete_lesson(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM lessons WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Subscription operations

    fn activate_subscription(&self, user_id: &str, course_id: &str) -> Result<SubscribeOutcome> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<bool> = tx
            .query_row(
                "SELECT is_active FROM subscriptions WHERE user_id = ?1 AND course_id = ?2",
                params![user_id, course_id],
                |row| row.get(0),
            )
            .optional()?;

        let outcome = match existing {
            None => {
                tx.execute(
                    "INSERT INTO subscriptions (user_id, course_id, is_active, created_at)
                     VALUES (?1, ?2, 1, ?3)",
                    params![user_id, course_id, format_datetime(&Utc::now())],
                )?;
                SubscribeOutcome::Created
            }
            Some(false) => {
                tx.execute(
                    "UPDATE subscriptions SET is_active = 1 WHERE user_id = ?1 AND course_id = ?2",
                    params![user_id, course_id],
                )?;
                SubscribeOutcome::Reactivated
            }
            Some(true) => SubscribeOutcome::AlreadyActive,
        };

        tx.commit()?;
        Ok(outcome)
    }

    fn deactivate_subscription(&self, user_id: &str, course_id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "UPDATE subscriptions SET is_active = 0 WHERE user_id = ?1 AND course_id = ?2",
            params![user_id, course_id],
        )?;
        Ok(rows > 0)
    }

    fn get_subscription(&self, user_id: &str, course_id: &str) -> Result<Option<Subscription>> {
        self.conn()
            .query_row(
                "SELECT user_id, course_id, is_active, created_at
                 FROM subscriptions WHERE user_id = ?1 AND course_id = ?2",
                params![user_id, course_id],
                subscription_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_user_subscriptions(
        &self,
        user_id: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Subscription>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT user_id, course_id, is_active, created_at
             FROM subscriptions WHERE user_id = ?1 AND is_active = 1
             ORDER BY created_at DESC, course_id LIMIT ?2 OFFSET ?3",
        )?;

        let rows = stmt.query_map(params![user_id, limit, offset], subscription_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_active_subscriber_emails(&self, course_id: &str) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT u.email FROM subscriptions s
             JOIN users u ON u.id = s.user_id
             WHERE s.course_id = ?1 AND s.is_active = 1
             ORDER BY s.created_at",
        )?;

        let rows = stmt.query_map(params![course_id], |row| row.get(0))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Offering operations

    fn create_offering(&self, offering: &Offering) -> Result<()> {
        let result = self.conn().execute(
            &format!("INSERT INTO offerings ({OFFERING_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
            params![
                offering.id,
                offering.course_id,
                offering.external_product_id,
                offering.name,
                offering.description,
                format_datetime(&offering.created_at),
                format_datetime(&offering.updated_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(Error::DuplicateOffering)
            }
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_offering(&self, id: &str) -> Result<Option<Offering>> {
        self.conn()
            .query_row(
                &format!("SELECT {OFFERING_COLUMNS} FROM offerings WHERE id = ?1"),
                params![id],
                offering_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_offering_by_course(&self, course_id: &str) -> Result<Option<Offering>> {
        self.conn()
            .query_row(
                &format!("SELECT {OFFERING_COLUMNS} FROM offerings WHERE course_id = ?1"),
                params![course_id],
                offering_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_offerings(&self, offset: i64, limit: i64) -> Result<Vec<Offering>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {OFFERING_COLUMNS} FROM offerings
             ORDER BY created_at DESC, id LIMIT ?1 OFFSET ?2"
        ))?;

        let rows = stmt.query_map(params![limit, offset], offering_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Price operations

    fn create_price(&self, price: &Price) -> Result<()> {
        self.conn().execute(
            &format!(
                "INSERT INTO prices ({PRICE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
            ),
            params![
                price.id,
                price.offering_id,
                price.external_price_id,
                price.amount,
                price.unit_amount,
                price.currency,
                price.is_active,
                format_datetime(&price.created_at),
                format_datetime(&price.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_price(&self, id: &str) -> Result<Option<Price>> {
        self.conn()
            .query_row(
                &format!("SELECT {PRICE_COLUMNS} FROM prices WHERE id = ?1"),
                params![id],
                price_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_prices(&self, offset: i64, limit: i64) -> Result<Vec<Price>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PRICE_COLUMNS} FROM prices ORDER BY created_at DESC, id LIMIT ?1 OFFSET ?2"
        ))?;

        let rows = stmt.query_map(params![limit, offset], price_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn first_active_price(&self, offering_id: &str) -> Result<Option<Price>> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT {PRICE_COLUMNS} FROM prices
                     WHERE offering_id = ?1 AND is_active = 1
                     ORDER BY created_at DESC, id LIMIT 1"
                ),
                params![offering_id],
                price_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    // Payment attempt operations

    fn create_payment_attempt(&self, attempt: &PaymentAttempt) -> Result<()> {
        let result = self.conn().execute(
            &format!(
                "INSERT INTO payment_attempts ({ATTEMPT_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
            ),
            params![
                attempt.id,
                attempt.user_id,
                attempt.course_id,
                attempt.external_session_id,
                attempt.checkout_url,
                attempt.idempotency_key,
                attempt.amount,
                attempt.currency,
                attempt.status,
                format_datetime(&attempt.created_at),
                format_datetime(&attempt.updated_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(Error::AlreadyExists)
            }
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_payment_attempt(&self, id: &str) -> Result<Option<PaymentAttempt>> {
        self.conn()
            .query_row(
                &format!("SELECT {ATTEMPT_COLUMNS} FROM payment_attempts WHERE id = ?1"),
                params![id],
                attempt_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_payment_attempt_by_external_id(
        &self,
        external_session_id: &str,
    ) -> Result<Option<PaymentAttempt>> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT {ATTEMPT_COLUMNS} FROM payment_attempts WHERE external_session_id = ?1"
                ),
                params![external_session_id],
                attempt_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_payment_attempt_by_idempotency_key(&self, key: &str) -> Result<Option<PaymentAttempt>> {
        self.conn()
            .query_row(
                &format!("SELECT {ATTEMPT_COLUMNS} FROM payment_attempts WHERE idempotency_key = ?1"),
                params![key],
                attempt_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_user_payment_attempts(
        &self,
        user_id: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<PaymentAttempt>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM payment_attempts WHERE user_id = ?1
             ORDER BY created_at DESC, id LIMIT ?2 OFFSET ?3"
        ))?;

        let rows = stmt.query_map(params![user_id, limit, offset], attempt_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_payment_attempt_status(&self, id: &str, status: PaymentStatus) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE payment_attempts SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status, format_datetime(&Utc::now()), id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound("payment session"));
        }
        Ok(())
    }

    // Payments ledger operations

    fn create_payment(&self, payment: &Payment) -> Result<()> {
        self.conn().execute(
            "INSERT INTO payments (id, user_id, course_id, lesson_id, amount, method, payment_date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                payment.id,
                payment.user_id,
                payment.item.course_id(),
                payment.item.lesson_id(),
                payment.amount,
                payment.method,
                format_datetime(&payment.payment_date),
                format_datetime(&payment.created_at),
            ],
        )?;
        Ok(())
    }

    fn get_payment(&self, id: &str) -> Result<Option<Payment>> {
        self.conn()
            .query_row(
                &format!("SELECT {PAYMENT_COLUMNS} FROM payments p WHERE p.id = ?1"),
                params![id],
                payment_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_payments(
        &self,
        filter: &PaymentFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Payment>> {
        let mut sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments p
             JOIN users u ON u.id = p.user_id
             LEFT JOIN courses c ON c.id = p.course_id
             LEFT JOIN lessons l ON l.id = p.lesson_id
             WHERE 1 = 1"
        );
        let mut args: Vec<Value> = Vec::new();

        let mut push = |clause: &str, value: Value, sql: &mut String| {
            args.push(value);
            sql.push_str(&clause.replace("{}", &format!("?{}", args.len())));
        };

        if let Some(user_id) = &filter.user_id {
            push(" AND p.user_id = {}", Value::Text(user_id.clone()), &mut sql);
        }
        if let Some(course_id) = &filter.course_id {
            push(" AND p.course_id = {}", Value::Text(course_id.clone()), &mut sql);
        }
        if let Some(lesson_id) = &filter.lesson_id {
            push(" AND p.lesson_id = {}", Value::Text(lesson_id.clone()), &mut sql);
        }
        if let Some(method) = filter.method {
            push(" AND p.method = {}", Value::Text(method.as_str().to_string()), &mut sql);
        }
        if let Some(min) = filter.amount_min {
            push(" AND p.amount >= {}", Value::Real(min), &mut sql);
        }
        if let Some(max) = filter.amount_max {
            push(" AND p.amount <= {}", Value::Real(max), &mut sql);
        }
        if let Some(from) = &filter.date_from {
            push(" AND p.payment_date >= {}", Value::Text(format_datetime(from)), &mut sql);
        }
        if let Some(to) = &filter.date_to {
            push(" AND p.payment_date <= {}", Value::Text(format_datetime(to)), &mut sql);
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            push(
                " AND (u.email LIKE {} OR c.title LIKE {} OR l.title LIKE {})",
                Value::Text(format!("%{search}%")),
                &mut sql,
            );
        }

        let column = match filter.ordering.field {
            PaymentOrderField::PaymentDate => "p.payment_date",
            PaymentOrderField::Amount => "p.amount",
            PaymentOrderField::CreatedAt => "p.created_at",
        };
        let direction = if filter.ordering.descending { "DESC" } else { "ASC" };
        sql.push_str(&format!(" ORDER BY {column} {direction}, p.id {direction}"));

        args.push(Value::Integer(limit));
        sql.push_str(&format!(" LIMIT ?{}", args.len()));
        args.push(Value::Integer(offset));
        sql.push_str(&format!(" OFFSET ?{}", args.len()));

        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), payment_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
