//! Subscription lifecycle per (user, course) pair.
//!
//! States are absent, active and inactive. Subscribing creates or
//! reactivates the row; unsubscribing only clears the active flag, so a row
//! is never deleted once it exists.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{SubscribeOutcome, Subscription};

pub struct SubscriptionLedger {
    store: Arc<dyn Store>,
}

impl SubscriptionLedger {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn subscribe(&self, user_id: &str, course_id: &str) -> Result<SubscribeOutcome> {
        let course = self
            .store
            .get_course(course_id)?
            .ok_or(Error::NotFound("course"))?;

        if course.owner_id == user_id {
            return Err(Error::SelfSubscription);
        }

        let outcome = self.store.activate_subscription(user_id, course_id)?;
        tracing::info!(user = user_id, course = course_id, ?outcome, "subscribe");
        Ok(outcome)
    }

    pub fn unsubscribe(&self, user_id: &str, course_id: &str) -> Result<()> {
        if !self.store.deactivate_subscription(user_id, course_id)? {
            return Err(Error::NotSubscribed);
        }
        tracing::info!(user = user_id, course = course_id, "unsubscribe");
        Ok(())
    }

    pub fn is_subscribed(&self, user_id: &str, course_id: &str) -> Result<bool> {
        Ok(self
            .store
            .get_subscription(user_id, course_id)?
            .is_some_and(|s| s.is_active))
    }

    pub fn active_subscriptions(
        &self,
        user_id: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Subscription>> {
        self.store.list_user_subscriptions(user_id, offset, limit)
    }

    pub fn active_subscriber_emails(&self, course_id: &str) -> Result<Vec<String>> {
        self.store.list_active_subscriber_emails(course_id)
    }
}
