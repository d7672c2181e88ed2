//! Issuer and receiver handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use core_kernel::{IssuerId, PortError, ReceiverId};
use domain_billing::{Issuer, Party, Receiver};
use validator::Validate;

use crate::dto::parties::*;
use crate::{error::ApiError, AppState};

fn new_party<Id>(request: PartyRequest) -> Result<Party<Id>, ApiError> {
    request.validate()?;
    Ok(Party::new(request.name, request.vat_number, request.address)?)
}

fn apply_update<Id>(party: &mut Party<Id>, request: PartyRequest) -> Result<(), ApiError> {
    request.validate()?;
    party.update(request.name, request.vat_number, request.address)?;
    Ok(())
}

pub async fn create_issuer(
    State(state): State<AppState>,
    Json(request): Json<PartyRequest>,
) -> Result<(StatusCode, Json<PartyResponse<IssuerId>>), ApiError> {
    let mut issuer: Issuer = new_party(request)?;
    state.directory.create_issuer(&mut issuer).await?;
    Ok((StatusCode::CREATED, Json(issuer.into())))
}

pub async fn list_issuers(
    State(state): State<AppState>,
) -> Result<Json<Vec<PartyResponse<IssuerId>>>, ApiError> {
    let issuers = state.directory.list_issuers().await?;
    Ok(Json(issuers.into_iter().map(PartyResponse::from).collect()))
}

pub async fn get_issuer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PartyResponse<IssuerId>>, ApiError> {
    let id = IssuerId::new(id);
    let issuer = state
        .directory
        .get_issuer(id)
        .await?
        .ok_or_else(|| PortError::not_found("Issuer", id))?;
    Ok(Json(issuer.into()))
}

pub async fn update_issuer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<PartyRequest>,
) -> Result<Json<PartyResponse<IssuerId>>, ApiError> {
    let id = IssuerId::new(id);
    let mut issuer = state
        .directory
        .get_issuer(id)
        .await?
        .ok_or_else(|| PortError::not_found("Issuer", id))?;
    apply_update(&mut issuer, request)?;
    state.directory.update_issuer(&issuer).await?;
    Ok(Json(issuer.into()))
}

pub async fn delete_issuer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.directory.delete_issuer(IssuerId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_receiver(
    State(state): State<AppState>,
    Json(request): Json<PartyRequest>,
) -> Result<(StatusCode, Json<PartyResponse<ReceiverId>>), ApiError> {
    let mut receiver: Receiver = new_party(request)?;
    state.directory.create_receiver(&mut receiver).await?;
    Ok((StatusCode::CREATED, Json(receiver.into())))
}

pub async fn list_receivers(
    State(state): State<AppState>,
) -> Result<Json<Vec<PartyResponse<ReceiverId>>>, ApiError> {
    let receivers = state.directory.list_receivers().await?;
    Ok(Json(receivers.into_iter().map(PartyResponse::from).collect()))
}

pub async fn get_receiver(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PartyResponse<ReceiverId>>, ApiError> {
    let id = ReceiverId::new(id);
    let receiver = state
        .directory
        .get_receiver(id)
        .await?
        .ok_or_else(|| PortError::not_found("Receiver", id))?;
    Ok(Json(receiver.into()))
}

pub async fn update_receiver(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<PartyRequest>,
) -> Result<Json<PartyResponse<ReceiverId>>, ApiError> {
    let id = ReceiverId::new(id);
    let mut receiver = state
        .directory
        .get_receiver(id)
        .await?
        .ok_or_else(|| PortError::not_found("Receiver", id))?;
    apply_update(&mut receiver, request)?;
    state.directory.update_receiver(&receiver).await?;
    Ok(Json(receiver.into()))
}

pub async fn delete_receiver(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.directory.delete_receiver(ReceiverId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
