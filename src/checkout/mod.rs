//! Checkout orchestration against a hosted payment gateway.
//!
//! Offerings and prices mirror remote catalog objects. Payment attempts are
//! created pending and only change status through reconciliation with what
//! the gateway reports.

mod gateway;
mod stripe;

pub use gateway::{
    GatewaySession, GatewaySessionStatus, OfflineGateway, PaymentGateway, SessionRequest,
};
pub use stripe::{DEFAULT_API_BASE, StripeGateway};

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Currency, Offering, PaymentAttempt, PaymentStatus, Price, User};

/// Width of the window within which repeated checkouts reuse one attempt.
const IDEMPOTENCY_BUCKET_SECS: i64 = 15 * 60;

/// Converts a decimal amount to integer minor units by multiplying by 100
/// and truncating toward zero.
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0) as i64
}

/// Derives a stable key for (user, course) within a fixed time bucket.
pub fn derive_idempotency_key(user_id: &str, course_id: &str, at: DateTime<Utc>) -> String {
    let bucket = at.timestamp().div_euclid(IDEMPOTENCY_BUCKET_SECS);
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    hasher.update(b":");
    hasher.update(course_id.as_bytes());
    hasher.update(b":");
    hasher.update(bucket.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Key for the next attempt once the one under `key` has finished.
fn successor_key(key: &str, finished_attempt_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hasher.update(b":");
    hasher.update(finished_attempt_id.as_bytes());
    hex::encode(hasher.finalize())
}

/// Maps a remote session onto a local status. Only facts the gateway
/// reports move an attempt out of pending.
pub fn status_from_gateway(remote: &GatewaySessionStatus) -> PaymentStatus {
    match (remote.status.as_str(), remote.payment_status.as_str()) {
        (_, "paid" | "no_payment_required") => PaymentStatus::Paid,
        ("expired", _) => PaymentStatus::Expired,
        _ => PaymentStatus::Pending,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutStarted {
    pub external_session_id: String,
    pub redirect_url: Option<String>,
    pub local_session_id: String,
    /// True when an earlier attempt with the same idempotency key was returned.
    pub reused: bool,
}

impl CheckoutStarted {
    fn from_attempt(attempt: &PaymentAttempt, reused: bool) -> Self {
        Self {
            external_session_id: attempt.external_session_id.clone(),
            redirect_url: attempt.checkout_url.clone(),
            local_session_id: attempt.id.clone(),
            reused,
        }
    }
}

pub struct CheckoutRequest<'a> {
    pub course_id: &'a str,
    pub success_url: &'a str,
    pub cancel_url: &'a str,
    /// Client-supplied key; derived from (user, course, time bucket) when absent.
    pub idempotency_key: Option<&'a str>,
}

pub struct CheckoutOrchestrator {
    store: Arc<dyn Store>,
    gateway: Arc<dyn PaymentGateway>,
    /// Courses with an offering currently being minted remotely.
    minting: Mutex<HashSet<String>>,
}

/// Holds a course's slot in `minting` until dropped.
struct MintClaim<'a> {
    minting: &'a Mutex<HashSet<String>>,
    course_id: String,
}

impl Drop for MintClaim<'_> {
    fn drop(&mut self) {
        self.minting
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.course_id);
    }
}

impl CheckoutOrchestrator {
    pub fn new(store: Arc<dyn Store>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            store,
            gateway,
            minting: Mutex::new(HashSet::new()),
        }
    }

    fn claim_mint(&self, course_id: &str) -> Result<MintClaim<'_>> {
        let mut minting = self.minting.lock().unwrap_or_else(|e| e.into_inner());
        if !minting.insert(course_id.to_string()) {
            return Err(Error::DuplicateOffering);
        }
        Ok(MintClaim {
            minting: &self.minting,
            course_id: course_id.to_string(),
        })
    }

    pub async fn create_offering(
        &self,
        course_id: &str,
        name: &str,
        description: &str,
    ) -> Result<Offering> {
        self.store
            .get_course(course_id)?
            .ok_or(Error::NotFound("course"))?;

        let _claim = self.claim_mint(course_id)?;
        if self.store.get_offering_by_course(course_id)?.is_some() {
            return Err(Error::DuplicateOffering);
        }

        let external_product_id = self
            .gateway
            .create_product(name, description, course_id)
            .await?;

        let now = Utc::now();
        let offering = Offering {
            id: Uuid::new_v4().to_string(),
            course_id: course_id.to_string(),
            external_product_id,
            name: name.to_string(),
            description: description.to_string(),
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.store.create_offering(&offering) {
            tracing::error!(
                course = course_id,
                product = %offering.external_product_id,
                "remote product created but not persisted: {e}"
            );
            return Err(e);
        }

        tracing::info!(course = course_id, offering = %offering.id, "offering created");
        Ok(offering)
    }

    pub async fn set_price(&self, offering_id: &str, amount: f64, currency: Currency) -> Result<Price> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(Error::Validation(
                "amount must be a non-negative number".to_string(),
            ));
        }

        let offering = self
            .store
            .get_offering(offering_id)?
            .ok_or(Error::NotFound("offering"))?;

        let unit_amount = to_minor_units(amount);
        let external_price_id = self
            .gateway
            .create_price(&offering.external_product_id, unit_amount, currency)
            .await?;

        let now = Utc::now();
        let price = Price {
            id: Uuid::new_v4().to_string(),
            offering_id: offering.id,
            external_price_id,
            amount,
            unit_amount,
            currency,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.store.create_price(&price)?;

        tracing::info!(offering = offering_id, price = %price.id, unit_amount, "price created");
        Ok(price)
    }

    pub async fn start_checkout(
        &self,
        user: &User,
        request: CheckoutRequest<'_>,
    ) -> Result<CheckoutStarted> {
        let course = self
            .store
            .get_course(request.course_id)?
            .ok_or(Error::NotFound("course"))?;
        let offering = self
            .store
            .get_offering_by_course(&course.id)?
            .ok_or(Error::NotFound("offering"))?;
        let price = self
            .store
            .first_active_price(&offering.id)?
            .ok_or(Error::NoActivePrice)?;

        let (mut key, derived) = match request.idempotency_key {
            Some(key) if !key.trim().is_empty() => (key.trim().to_string(), false),
            _ => (derive_idempotency_key(&user.id, &course.id, Utc::now()), true),
        };

        // A derived key moves past failed or expired attempts, whose redirect
        // URL is dead. A client-supplied key always gets its attempt back.
        while let Some(existing) = self.attempt_for_key(&key, &user.id, &course.id)? {
            if derived && matches!(existing.status, PaymentStatus::Failed | PaymentStatus::Expired) {
                key = successor_key(&key, &existing.id);
                continue;
            }
            tracing::debug!(session = %existing.external_session_id, "reusing checkout attempt");
            return Ok(CheckoutStarted::from_attempt(&existing, true));
        }

        let session = self
            .gateway
            .create_session(SessionRequest {
                price_id: &price.external_price_id,
                success_url: request.success_url,
                cancel_url: request.cancel_url,
                customer_email: &user.email,
                idempotency_key: &key,
                metadata: vec![
                    ("course_id", course.id.clone()),
                    ("user_id", user.id.clone()),
                    ("price_id", price.id.clone()),
                ],
            })
            .await?;

        let now = Utc::now();
        let attempt = PaymentAttempt {
            id: Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            course_id: course.id.clone(),
            external_session_id: session.id,
            checkout_url: session.url,
            idempotency_key: key.clone(),
            amount: price.amount,
            currency: price.currency,
            status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        match self.store.create_payment_attempt(&attempt) {
            Ok(()) => {}
            Err(Error::AlreadyExists) => {
                // A concurrent request with the same key won the insert
                if let Some(existing) = self.attempt_for_key(&key, &user.id, &course.id)? {
                    return Ok(CheckoutStarted::from_attempt(&existing, true));
                }
                return Err(Error::AlreadyExists);
            }
            Err(e) => return Err(e),
        }

        tracing::info!(
            user = %user.id,
            course = %course.id,
            session = %attempt.external_session_id,
            "checkout started"
        );
        Ok(CheckoutStarted::from_attempt(&attempt, false))
    }

    fn attempt_for_key(
        &self,
        key: &str,
        user_id: &str,
        course_id: &str,
    ) -> Result<Option<PaymentAttempt>> {
        let Some(existing) = self.store.get_payment_attempt_by_idempotency_key(key)? else {
            return Ok(None);
        };

        if existing.user_id != user_id || existing.course_id != course_id {
            return Err(Error::Validation(
                "idempotency key was already used for a different checkout".to_string(),
            ));
        }

        Ok(Some(existing))
    }

    /// Asks the gateway for the session's payment status without touching
    /// local state.
    pub async fn refresh_status(&self, external_session_id: &str) -> Result<String> {
        let remote = self.gateway.session_status(external_session_id).await?;
        Ok(remote.payment_status)
    }

    /// Records a status reported for a session. Re-applying the current
    /// status is a no-op; backward or sideways moves are rejected.
    pub fn reconcile(
        &self,
        external_session_id: &str,
        status: PaymentStatus,
    ) -> Result<PaymentAttempt> {
        let mut attempt = self
            .store
            .get_payment_attempt_by_external_id(external_session_id)?
            .ok_or(Error::NotFound("payment session"))?;

        if attempt.status == status {
            return Ok(attempt);
        }

        if !attempt.status.can_transition_to(status) {
            tracing::warn!(
                session = external_session_id,
                from = %attempt.status,
                to = %status,
                "rejected out-of-order payment status"
            );
            return Err(Error::IllegalStatusTransition {
                from: attempt.status.to_string(),
                to: status.to_string(),
            });
        }

        self.store
            .update_payment_attempt_status(&attempt.id, status)?;
        tracing::info!(session = external_session_id, from = %attempt.status, to = %status, "payment status updated");

        attempt.status = status;
        attempt.updated_at = Utc::now();
        Ok(attempt)
    }

    /// Pulls the session from the gateway and reconciles the local attempt.
    pub async fn sync(&self, external_session_id: &str) -> Result<PaymentAttempt> {
        let attempt = self
            .store
            .get_payment_attempt_by_external_id(external_session_id)?
            .ok_or(Error::NotFound("payment session"))?;

        let remote = self.gateway.session_status(external_session_id).await?;
        let status = status_from_gateway(&remote);

        if status == PaymentStatus::Pending || attempt.status.is_terminal() {
            return Ok(attempt);
        }

        self.reconcile(external_session_id, status)
    }
}
