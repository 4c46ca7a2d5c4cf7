//! Stripe REST client for products, prices and checkout sessions.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;

use super::gateway::{GatewaySession, GatewaySessionStatus, PaymentGateway, SessionRequest};
use crate::error::{Error, Result};
use crate::types::Currency;

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com/v1";

pub struct StripeGateway {
    client: Client,
    api_base: String,
    secret_key: String,
}

#[derive(Deserialize)]
struct StripeObject {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    message: String,
}

impl StripeGateway {
    pub fn new(api_base: &str, secret_key: &str, timeout: Duration) -> Result<Self> {
        if secret_key.is_empty() {
            return Err(Error::Config("stripe secret key is not set".to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build http client: {e}")))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(format!("{}/{path}", self.api_base))
            .bearer_auth(&self.secret_key)
    }

    async fn send(&self, request: RequestBuilder) -> Result<StripeObject> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Gateway(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<StripeObject>()
                .await
                .map_err(|e| Error::Gateway(format!("unexpected response: {e}")));
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<StripeErrorBody>(&body)
            .map(|b| b.error.message)
            .unwrap_or_else(|_| format!("HTTP {status}"));

        tracing::warn!(status = %status, message = %message, "stripe request failed");
        Err(Error::Gateway(message))
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_product(&self, name: &str, description: &str, course_id: &str) -> Result<String> {
        let mut form = vec![
            ("name", name.to_string()),
            ("metadata[course_id]", course_id.to_string()),
            ("metadata[type]", "course".to_string()),
        ];
        // Stripe rejects an empty description string
        if !description.is_empty() {
            form.push(("description", description.to_string()));
        }

        let product = self.send(self.post("products").form(&form)).await?;
        Ok(product.id)
    }

    async fn create_price(
        &self,
        product_id: &str,
        unit_amount: i64,
        currency: Currency,
    ) -> Result<String> {
        let form = [
            ("product", product_id.to_string()),
            ("unit_amount", unit_amount.to_string()),
            ("currency", currency.as_str().to_string()),
        ];

        let price = self.send(self.post("prices").form(&form)).await?;
        Ok(price.id)
    }

    async fn create_session(&self, request: SessionRequest<'_>) -> Result<GatewaySession> {
        let mut form = vec![
            ("mode".to_string(), "payment".to_string()),
            ("payment_method_types[0]".to_string(), "card".to_string()),
            ("line_items[0][price]".to_string(), request.price_id.to_string()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("success_url".to_string(), request.success_url.to_string()),
            ("cancel_url".to_string(), request.cancel_url.to_string()),
            ("customer_email".to_string(), request.customer_email.to_string()),
        ];
        for (key, value) in &request.metadata {
            form.push((format!("metadata[{key}]"), value.clone()));
        }

        let session = self
            .send(
                self.post("checkout/sessions")
                    .header("Idempotency-Key", request.idempotency_key)
                    .form(&form),
            )
            .await?;

        Ok(GatewaySession {
            id: session.id,
            url: session.url,
        })
    }

    async fn session_status(&self, session_id: &str) -> Result<GatewaySessionStatus> {
        let url = format!(
            "{}/checkout/sessions/{}",
            self.api_base,
            urlencoding::encode(session_id)
        );
        let session = self
            .send(self.client.get(url).bearer_auth(&self.secret_key))
            .await?;

        Ok(GatewaySessionStatus {
            status: session.status.unwrap_or_default(),
            payment_status: session.payment_status.unwrap_or_default(),
        })
    }
}
