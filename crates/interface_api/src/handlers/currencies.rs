//! Currency handlers

use axum::{extract::State, Json};

use crate::dto::currencies::CurrenciesResponse;
use crate::AppState;

/// Lists supported currencies and the base currency
pub async fn list_currencies(State(state): State<AppState>) -> Json<CurrenciesResponse> {
    Json(CurrenciesResponse::from(&state.registry))
}
