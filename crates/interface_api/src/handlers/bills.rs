//! Bill handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use core_kernel::{AssignmentId, BillId};
use tracing::info;

use crate::dto::bills::*;
use crate::{error::ApiError, AppState};

/// Creates a bill from submitted line-item columns
pub async fn create_bill(
    State(state): State<AppState>,
    Json(request): Json<CreateBillRequest>,
) -> Result<(StatusCode, Json<CreateBillResponse>), ApiError> {
    let created = state.billing.create_bill(request.into()).await?;
    if !created.skipped_rows.is_empty() {
        info!(skipped = created.skipped_rows.len(), "Bill created with skipped rows");
    }

    Ok((
        StatusCode::CREATED,
        Json(CreateBillResponse {
            bill: created.bill.into(),
            skipped_rows: created.skipped_rows,
        }),
    ))
}

/// Lists bills, newest first
pub async fn list_bills(State(state): State<AppState>) -> Result<Json<Vec<BillResponse>>, ApiError> {
    let bills = state.billing.list_bills().await?;
    Ok(Json(bills.into_iter().map(BillResponse::from).collect()))
}

/// Gets a bill by ID
pub async fn get_bill(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<BillResponse>, ApiError> {
    let bill = state.billing.require_bill(BillId::new(id)).await?;
    Ok(Json(bill.into()))
}

/// Flips a bill between paid and unpaid
pub async fn toggle_paid(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<BillResponse>, ApiError> {
    let bill = state.billing.toggle_paid(BillId::new(id)).await?;
    Ok(Json(bill.into()))
}

/// Moves a bill's due date
pub async fn reschedule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<RescheduleRequest>,
) -> Result<Json<BillResponse>, ApiError> {
    let bill = state
        .billing
        .reschedule(BillId::new(id), request.due_date)
        .await?;
    Ok(Json(bill.into()))
}

/// Removes one line item from a bill
pub async fn remove_line_item(
    State(state): State<AppState>,
    Path((id, assignment_id)): Path<(i64, i64)>,
) -> Result<Json<BillResponse>, ApiError> {
    let bill = state
        .billing
        .remove_line_item(BillId::new(id), AssignmentId::new(assignment_id))
        .await?;
    Ok(Json(bill.into()))
}

/// Deletes a bill and its line items
pub async fn delete_bill(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.billing.delete_bill(BillId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
