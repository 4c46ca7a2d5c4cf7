use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::{CreatePaymentRequest, PaymentListParams, PaymentResponse};
use crate::server::response::{
    ApiError, ApiResponse, PAYMENT_PAGE, Page, StoreOptionExt, StoreResultExt,
};
use crate::store::{PaymentFilter, PaymentOrdering};
use crate::types::{PaidItem, Payment, PaymentMethod};

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn build_filter(user_id: &str, params: PaymentListParams) -> Result<PaymentFilter, ApiError> {
    let method = non_empty(params.method)
        .map(|m| m.parse::<PaymentMethod>())
        .transpose()?;

    let ordering = match non_empty(params.ordering) {
        Some(raw) => PaymentOrdering::parse(&raw)
            .ok_or_else(|| ApiError::bad_request(format!("Invalid ordering '{raw}'")))?,
        None => PaymentOrdering::default(),
    };

    if let (Some(min), Some(max)) = (params.amount_min, params.amount_max) {
        if min > max {
            return Err(ApiError::bad_request("amount_min must not exceed amount_max"));
        }
    }

    Ok(PaymentFilter {
        user_id: Some(user_id.to_string()),
        course_id: non_empty(params.course),
        lesson_id: non_empty(params.lesson),
        method,
        amount_min: params.amount_min,
        amount_max: params.amount_max,
        date_from: params.date_from,
        date_to: params.date_to,
        search: non_empty(params.search),
        ordering,
    })
}

pub async fn list_payments(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaymentListParams>,
) -> impl IntoResponse {
    let page = Page::resolve(params.page, params.page_size, PAYMENT_PAGE);
    let filter = build_filter(&auth.user.id, params)?;

    let payments = state
        .store
        .list_payments(&filter, page.offset(), page.fetch_limit())
        .api_err("Failed to list payments")?;

    Ok::<_, ApiError>(Json(page.respond(payments, PaymentResponse::from)))
}

pub async fn create_payment(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePaymentRequest>,
) -> impl IntoResponse {
    let item = match (non_empty(req.course_id), non_empty(req.lesson_id)) {
        (Some(course_id), None) => {
            state
                .store
                .get_course(&course_id)
                .api_err("Failed to get course")?
                .or_not_found("Course not found")?;
            PaidItem::Course(course_id)
        }
        (None, Some(lesson_id)) => {
            state
                .store
                .get_lesson(&lesson_id)
                .api_err("Failed to get lesson")?
                .or_not_found("Lesson not found")?;
            PaidItem::Lesson(lesson_id)
        }
        _ => {
            return Err(ApiError::bad_request(
                "Exactly one of course_id or lesson_id is required",
            ));
        }
    };

    if !req.amount.is_finite() || req.amount < 0.0 {
        return Err(ApiError::bad_request("Amount must be a non-negative number"));
    }
    let method: PaymentMethod = req.method.parse()?;

    let now = Utc::now();
    let payment = Payment {
        id: Uuid::new_v4().to_string(),
        user_id: auth.user.id.clone(),
        item,
        amount: req.amount,
        method,
        payment_date: req.payment_date.unwrap_or(now),
        created_at: now,
    };

    state
        .store
        .create_payment(&payment)
        .api_err("Failed to record payment")?;

    tracing::info!(payment = %payment.id, user = %payment.user_id, "payment recorded");

    Ok::<_, ApiError>((
        StatusCode::CREATED,
        Json(ApiResponse::success(PaymentResponse::from(payment))),
    ))
}

pub async fn get_payment(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let payment = state
        .store
        .get_payment(&id)
        .api_err("Failed to get payment")?
        .filter(|p| p.user_id == auth.user.id)
        .or_not_found("Payment not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(PaymentResponse::from(payment))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::PaymentOrderField;

    #[test]
    fn test_build_filter_scopes_to_user_and_parses_fields() {
        let params = PaymentListParams {
            method: Some("transfer".into()),
            ordering: Some("-amount".into()),
            search: Some("  ".into()),
            ..Default::default()
        };
        let filter = build_filter("u1", params).unwrap();
        assert_eq!(filter.user_id.as_deref(), Some("u1"));
        assert_eq!(filter.method, Some(PaymentMethod::Transfer));
        assert_eq!(filter.ordering.field, PaymentOrderField::Amount);
        assert!(filter.ordering.descending);
        assert!(filter.search.is_none());
    }

    #[test]
    fn test_build_filter_rejects_bad_input() {
        let bad_ordering = PaymentListParams {
            ordering: Some("password".into()),
            ..Default::default()
        };
        assert!(build_filter("u1", bad_ordering).is_err());

        let bad_method = PaymentListParams {
            method: Some("card".into()),
            ..Default::default()
        };
        assert!(build_filter("u1", bad_method).is_err());

        let inverted = PaymentListParams {
            amount_min: Some(10.0),
            amount_max: Some(1.0),
            ..Default::default()
        };
        assert!(build_filter("u1", inverted).is_err());
    }
}
