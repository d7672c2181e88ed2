//! Exchange rate handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::dto::rates::*;
use crate::{error::ApiError, AppState};

/// Records a rate; later bills look it up for rows without an explicit rate
pub async fn record_rate(
    State(state): State<AppState>,
    Json(request): Json<RecordRateRequest>,
) -> Result<(StatusCode, Json<RateQuoteResponse>), ApiError> {
    request.validate()?;
    let quote = state
        .rates
        .record_rate(&request.from, &request.to, request.rate)
        .await?;
    Ok((StatusCode::CREATED, Json(quote.into())))
}

/// The rate a pair resolves to, with its recorded history newest first
pub async fn rate_overview(
    State(state): State<AppState>,
    Query(query): Query<RateQuery>,
) -> Result<Json<RateOverviewResponse>, ApiError> {
    let overview = state
        .rates
        .overview(&query.from, &query.to, query.limit)
        .await?;
    Ok(Json(overview.into()))
}
