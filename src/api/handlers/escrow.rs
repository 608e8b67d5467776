//! Escrow handlers: confirmed inbound transfers and outbound claims.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{EscrowResponse, EscrowTransferRequest, parse_amount, parse_asset, parse_holder};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `GET /escrow/{holder}` — Escrow balances of a holder.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] if the holder is blank.
#[utoipa::path(
    get,
    path = "/api/v1/escrow/{holder}",
    tag = "Escrow",
    summary = "Get escrow balances",
    params(
        ("holder" = String, Path, description = "Holder identifier"),
    ),
    responses(
        (status = 200, description = "Escrow balances", body = EscrowResponse),
        (status = 400, description = "Invalid holder", body = ErrorResponse),
    )
)]
pub async fn get_escrow(
    State(state): State<AppState>,
    Path(holder): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let holder = parse_holder(&holder)?;
    let balance = state.pool_service.escrow_of(&holder).await;
    Ok(Json(EscrowResponse::new(&holder, balance)))
}

/// `POST /escrow/{holder}/credit` — Record a confirmed inbound transfer.
///
/// # Errors
///
/// Returns [`GatewayError`] on invalid parameters or overflow.
#[utoipa::path(
    post,
    path = "/api/v1/escrow/{holder}/credit",
    tag = "Escrow",
    summary = "Credit escrow",
    description = "Records an inbound token transfer confirmed by the token collaborator.",
    params(
        ("holder" = String, Path, description = "Holder identifier"),
    ),
    request_body = EscrowTransferRequest,
    responses(
        (status = 200, description = "Escrow credited", body = EscrowResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
    )
)]
pub async fn credit_escrow(
    State(state): State<AppState>,
    Path(holder): Path<String>,
    Json(req): Json<EscrowTransferRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let holder = parse_holder(&holder)?;
    let asset = parse_asset(&state.assets, &req.asset)?;
    let amount = parse_amount("amount", &req.amount)?;

    let balance = state
        .pool_service
        .credit_escrow(&holder, asset, amount)
        .await?;
    Ok(Json(EscrowResponse::new(&holder, balance)))
}

/// `POST /escrow/{holder}/debit` — Record an outbound claim.
///
/// # Errors
///
/// Returns [`GatewayError`] on invalid parameters or insufficient escrow.
#[utoipa::path(
    post,
    path = "/api/v1/escrow/{holder}/debit",
    tag = "Escrow",
    summary = "Debit escrow",
    description = "Records an outbound token transfer claimed by the holder.",
    params(
        ("holder" = String, Path, description = "Holder identifier"),
    ),
    request_body = EscrowTransferRequest,
    responses(
        (status = 200, description = "Escrow debited", body = EscrowResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 422, description = "Insufficient escrow", body = ErrorResponse),
    )
)]
pub async fn debit_escrow(
    State(state): State<AppState>,
    Path(holder): Path<String>,
    Json(req): Json<EscrowTransferRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let holder = parse_holder(&holder)?;
    let asset = parse_asset(&state.assets, &req.asset)?;
    let amount = parse_amount("amount", &req.amount)?;

    let balance = state
        .pool_service
        .debit_escrow(&holder, asset, amount)
        .await?;
    Ok(Json(EscrowResponse::new(&holder, balance)))
}

/// Escrow routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/escrow/{holder}", get(get_escrow))
        .route("/escrow/{holder}/credit", post(credit_escrow))
        .route("/escrow/{holder}/debit", post(debit_escrow))
}
