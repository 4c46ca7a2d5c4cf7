use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::Currency;

/// Parameters for opening a hosted checkout session for one price.
#[derive(Debug, Clone)]
pub struct SessionRequest<'a> {
    pub price_id: &'a str,
    pub success_url: &'a str,
    pub cancel_url: &'a str,
    pub customer_email: &'a str,
    pub idempotency_key: &'a str,
    pub metadata: Vec<(&'static str, String)>,
}

#[derive(Debug, Clone)]
pub struct GatewaySession {
    pub id: String,
    pub url: Option<String>,
}

/// Remote view of a checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySessionStatus {
    /// Session lifecycle: `open`, `complete` or `expired`.
    pub status: String,
    /// Money state: `paid`, `unpaid` or `no_payment_required`.
    pub payment_status: String,
}

/// A hosted payment provider: product, price and checkout session calls.
///
/// Implementations must turn every remote failure into `Error::Gateway`
/// carrying the provider's message.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_product(
        &self,
        name: &str,
        description: &str,
        course_id: &str,
    ) -> Result<String>;

    async fn create_price(
        &self,
        product_id: &str,
        unit_amount: i64,
        currency: Currency,
    ) -> Result<String>;

    async fn create_session(&self, request: SessionRequest<'_>) -> Result<GatewaySession>;

    async fn session_status(&self, session_id: &str) -> Result<GatewaySessionStatus>;
}

/// In-process gateway for local development. Ids are minted locally and
/// sessions stay open and unpaid.
#[derive(Default)]
pub struct OfflineGateway {
    sessions: Mutex<HashMap<String, GatewaySessionStatus>>,
}

impl OfflineGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn mint(prefix: &str) -> String {
        format!("{prefix}_offline_{}", Uuid::new_v4().simple())
    }
}

#[async_trait]
impl PaymentGateway for OfflineGateway {
    async fn create_product(&self, name: &str, _description: &str, course_id: &str) -> Result<String> {
        let id = Self::mint("prod");
        tracing::info!(product = %id, course = course_id, name, "offline product created");
        Ok(id)
    }

    async fn create_price(
        &self,
        product_id: &str,
        unit_amount: i64,
        currency: Currency,
    ) -> Result<String> {
        let id = Self::mint("price");
        tracing::info!(price = %id, product = product_id, unit_amount, %currency, "offline price created");
        Ok(id)
    }

    async fn create_session(&self, request: SessionRequest<'_>) -> Result<GatewaySession> {
        let id = Self::mint("cs");
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(
                id.clone(),
                GatewaySessionStatus {
                    status: "open".to_string(),
                    payment_status: "unpaid".to_string(),
                },
            );

        let url = format!("{}?session_id={id}", request.success_url);
        Ok(GatewaySession { id, url: Some(url) })
    }

    async fn session_status(&self, session_id: &str) -> Result<GatewaySessionStatus> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(session_id)
            .cloned()
            .ok_or_else(|| Error::Gateway(format!("No such checkout.session: '{session_id}'")))
    }
}
