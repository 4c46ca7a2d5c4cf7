use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use super::courses::load_course;
use crate::auth::RequireUser;
use crate::checkout::CheckoutRequest;
use crate::policy::{Operation, authorize};
use crate::server::AppState;
use crate::server::dto::{
    CreatePriceRequest, CreateProductRequest, CreateSessionRequest, SessionStatusResponse,
    parse_currency,
};
use crate::server::response::{
    ApiError, ApiResponse, CATALOG_PAGE, PageParams, StoreOptionExt, StoreResultExt,
};
use crate::server::validation::validate_title;
use crate::types::{PaymentAttempt, User};

/// Loads an attempt by local id, hiding attempts that belong to someone else.
fn load_own_attempt(state: &AppState, user: &User, id: &str) -> Result<PaymentAttempt, ApiError> {
    state
        .store
        .get_payment_attempt(id)
        .api_err("Failed to get payment session")?
        .filter(|a| a.user_id == user.id)
        .or_not_found("Payment session not found")
}

pub async fn list_products(
    _auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> impl IntoResponse {
    let page = params.resolve(CATALOG_PAGE);

    let offerings = state
        .store
        .list_offerings(page.offset(), page.fetch_limit())
        .api_err("Failed to list products")?;

    Ok::<_, ApiError>(Json(page.respond(offerings, |o| o)))
}

pub async fn get_product(
    _auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let offering = state
        .store
        .get_offering(&id)
        .api_err("Failed to get product")?
        .or_not_found("Product not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(offering)))
}

pub async fn create_product(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProductRequest>,
) -> impl IntoResponse {
    validate_title(&req.name, "Product")?;

    let course = load_course(state.store.as_ref(), &req.course_id)?;
    authorize(&auth.user, &course, Operation::Update)?;

    let offering = state
        .checkout
        .create_offering(&course.id, req.name.trim(), &req.description)
        .await?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(offering))))
}

pub async fn list_prices(
    _auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> impl IntoResponse {
    let page = params.resolve(CATALOG_PAGE);

    let prices = state
        .store
        .list_prices(page.offset(), page.fetch_limit())
        .api_err("Failed to list prices")?;

    Ok::<_, ApiError>(Json(page.respond(prices, |p| p)))
}

pub async fn get_price(
    _auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let price = state
        .store
        .get_price(&id)
        .api_err("Failed to get price")?
        .or_not_found("Price not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(price)))
}

pub async fn create_price(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePriceRequest>,
) -> impl IntoResponse {
    let currency = parse_currency(req.currency.as_deref())?;

    let offering = state
        .store
        .get_offering(&req.product_id)
        .api_err("Failed to get product")?
        .or_not_found("Product not found")?;
    let course = load_course(state.store.as_ref(), &offering.course_id)?;
    authorize(&auth.user, &course, Operation::Update)?;

    let price = state
        .checkout
        .set_price(&offering.id, req.amount, currency)
        .await?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(price))))
}

pub async fn list_sessions(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> impl IntoResponse {
    let page = params.resolve(CATALOG_PAGE);

    let attempts = state
        .store
        .list_user_payment_attempts(&auth.user.id, page.offset(), page.fetch_limit())
        .api_err("Failed to list payment sessions")?;

    Ok::<_, ApiError>(Json(page.respond(attempts, |a| a)))
}

pub async fn get_session(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let attempt = load_own_attempt(&state, &auth.user, &id)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(attempt)))
}

pub async fn create_session(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> impl IntoResponse {
    if req.success_url.trim().is_empty() || req.cancel_url.trim().is_empty() {
        return Err(ApiError::bad_request(
            "success_url and cancel_url are required",
        ));
    }

    let started = state
        .checkout
        .start_checkout(
            &auth.user,
            CheckoutRequest {
                course_id: &req.course_id,
                success_url: &req.success_url,
                cancel_url: &req.cancel_url,
                idempotency_key: req.idempotency_key.as_deref(),
            },
        )
        .await?;

    let status = if started.reused {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok::<_, ApiError>((status, Json(ApiResponse::success(started))))
}

pub async fn session_status(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let attempt = load_own_attempt(&state, &auth.user, &id)?;

    let payment_status = state
        .checkout
        .refresh_status(&attempt.external_session_id)
        .await?;

    Ok::<_, ApiError>(Json(ApiResponse::success(SessionStatusResponse {
        session_id: attempt.external_session_id,
        payment_status,
        local_status: attempt.status.to_string(),
    })))
}

pub async fn sync_session(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let attempt = load_own_attempt(&state, &auth.user, &id)?;

    let attempt = state
        .checkout
        .sync(&attempt.external_session_id)
        .await?;

    Ok::<_, ApiError>(Json(ApiResponse::success(attempt)))
}
