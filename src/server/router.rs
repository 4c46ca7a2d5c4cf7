use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Router, routing::get};

use super::admin::admin_router;
use super::user::user_router;
use crate::checkout::{CheckoutOrchestrator, PaymentGateway};
use crate::ledger::SubscriptionLedger;
use crate::notify::{ChangeKind, NotificationJob, NotificationQueue};
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub ledger: SubscriptionLedger,
    pub checkout: CheckoutOrchestrator,
    pub notifications: NotificationQueue,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        gateway: Arc<dyn PaymentGateway>,
        notifications: NotificationQueue,
    ) -> Self {
        Self {
            ledger: SubscriptionLedger::new(store.clone()),
            checkout: CheckoutOrchestrator::new(store.clone(), gateway),
            store,
            notifications,
        }
    }

    /// Queues a subscriber notification without waiting for delivery.
    pub fn notify_course_update(&self, course_id: &str, kind: ChangeKind, changed_id: &str) {
        self.notifications.enqueue(NotificationJob {
            course_id: course_id.to_string(),
            kind,
            changed_id: changed_id.to_string(),
        });
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1/admin", admin_router())
        .nest("/api/v1", user_router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
