//! Catalog item handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use core_kernel::{CatalogItemId, PortError};
use domain_billing::CatalogItem;
use validator::Validate;

use crate::dto::items::*;
use crate::{error::ApiError, AppState};

pub async fn create_item(
    State(state): State<AppState>,
    Json(request): Json<ItemRequest>,
) -> Result<(StatusCode, Json<ItemResponse>), ApiError> {
    request.validate()?;
    let mut item = CatalogItem::new(request.name, request.price, &request.currency, &state.registry)?;
    state.directory.create_item(&mut item).await?;
    Ok((StatusCode::CREATED, Json(item.into())))
}

pub async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    let items = state.directory.list_items().await?;
    Ok(Json(items.into_iter().map(ItemResponse::from).collect()))
}

pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ItemResponse>, ApiError> {
    let id = CatalogItemId::new(id);
    let item = state
        .directory
        .get_item(id)
        .await?
        .ok_or_else(|| PortError::not_found("CatalogItem", id))?;
    Ok(Json(item.into()))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<ItemRequest>,
) -> Result<Json<ItemResponse>, ApiError> {
    request.validate()?;
    let id = CatalogItemId::new(id);
    let mut item = state
        .directory
        .get_item(id)
        .await?
        .ok_or_else(|| PortError::not_found("CatalogItem", id))?;
    item.update(request.name, request.price, &request.currency, &state.registry)?;
    state.directory.update_item(&item).await?;
    Ok(Json(item.into()))
}

/// Deletes a catalog item; items still on a bill are a conflict
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.directory.delete_item(CatalogItemId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
