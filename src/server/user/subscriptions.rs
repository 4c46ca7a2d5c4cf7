use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::{SubscribeRequest, SubscriptionStatusResponse};
use crate::server::response::{
    ApiError, ApiResponse, PageParams, SUBSCRIPTION_PAGE, StoreResultExt,
};
use crate::types::SubscribeOutcome;

/// Shared by `POST /subscriptions` and `POST /courses/{id}/subscribe`.
pub(super) fn subscribe_response(
    state: &AppState,
    user_id: &str,
    course_id: &str,
) -> Result<Response, ApiError> {
    let outcome = state.ledger.subscribe(user_id, course_id)?;

    let (status, label, message) = match outcome {
        SubscribeOutcome::Created => (StatusCode::CREATED, "created", "Subscription created"),
        SubscribeOutcome::Reactivated => (StatusCode::OK, "reactivated", "Subscription reactivated"),
        SubscribeOutcome::AlreadyActive => {
            return Err(ApiError::bad_request(
                "You are already subscribed to this course",
            ));
        }
    };

    Ok((
        status,
        Json(ApiResponse::success(SubscriptionStatusResponse {
            course_id: course_id.to_string(),
            status: label,
            message,
        })),
    )
        .into_response())
}

pub async fn list_subscriptions(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> impl IntoResponse {
    let page = params.resolve(SUBSCRIPTION_PAGE);

    let subscriptions = state
        .ledger
        .active_subscriptions(&auth.user.id, page.offset(), page.fetch_limit())
        .api_err("Failed to list subscriptions")?;

    Ok::<_, ApiError>(Json(page.respond(subscriptions, |s| s)))
}

pub async fn create_subscription(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubscribeRequest>,
) -> impl IntoResponse {
    subscribe_response(&state, &auth.user.id, &req.course_id)
}

pub async fn delete_subscription(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
) -> impl IntoResponse {
    state.ledger.unsubscribe(&auth.user.id, &course_id)?;
    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
