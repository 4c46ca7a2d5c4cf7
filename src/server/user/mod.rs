mod auth;
mod checkout;
mod courses;
mod lessons;
mod payments;
mod subscriptions;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::server::AppState;

pub fn user_router() -> Router<Arc<AppState>> {
    Router::new()
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        // Courses
        .route("/courses", get(courses::list_courses).post(courses::create_course))
        .route(
            "/courses/{id}",
            get(courses::get_course)
                .patch(courses::update_course)
                .delete(courses::delete_course),
        )
        .route("/courses/{id}/lessons", get(courses::list_course_lessons))
        .route("/courses/{id}/subscribe", post(courses::subscribe))
        .route("/courses/{id}/unsubscribe", delete(courses::unsubscribe))
        // Lessons
        .route("/lessons", get(lessons::list_lessons).post(lessons::create_lesson))
        .route(
            "/lessons/{id}",
            get(lessons::get_lesson)
                .patch(lessons::update_lesson)
                .delete(lessons::delete_lesson),
        )
        // Subscriptions
        .route(
            "/subscriptions",
            get(subscriptions::list_subscriptions).post(subscriptions::create_subscription),
        )
        .route(
            "/subscriptions/{course_id}",
            delete(subscriptions::delete_subscription),
        )
        // Checkout
        .route(
            "/checkout/products",
            get(checkout::list_products).post(checkout::create_product),
        )
        .route("/checkout/products/{id}", get(checkout::get_product))
        .route(
            "/checkout/prices",
            get(checkout::list_prices).post(checkout::create_price),
        )
        .route("/checkout/prices/{id}", get(checkout::get_price))
        .route(
            "/checkout/sessions",
            get(checkout::list_sessions).post(checkout::create_session),
        )
        .route("/checkout/sessions/{id}", get(checkout::get_session))
        .route("/checkout/sessions/{id}/status", get(checkout::session_status))
        .route("/checkout/sessions/{id}/sync", post(checkout::sync_session))
        // Payments ledger
        .route(
            "/payments",
            get(payments::list_payments).post(payments::create_payment),
        )
        .route("/payments/{id}", get(payments::get_payment))
}
