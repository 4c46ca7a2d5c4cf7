use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::ReconcileRequest;
use crate::server::response::{ApiError, ApiResponse};
use crate::types::PaymentStatus;

/// Records a payment status reported out of band for a checkout session.
pub async fn reconcile_session(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(external_id): Path<String>,
    Json(req): Json<ReconcileRequest>,
) -> impl IntoResponse {
    let status: PaymentStatus = req.status.parse()?;
    let attempt = state.checkout.reconcile(&external_id, status)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(attempt)))
}
