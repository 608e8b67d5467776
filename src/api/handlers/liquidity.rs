//! Deposit and withdrawal endpoint handlers.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{
    DepositEstimateRequest, DepositEstimateResponse, DepositRequest, DepositResponse,
    WithdrawEstimateRequest, WithdrawRequest, WithdrawResponse, parse_amount, parse_asset,
    parse_holder,
};
use crate::app_state::AppState;
use crate::domain::WithdrawReceipt;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /pool/deposit` — Add liquidity from the holder's escrow.
///
/// # Errors
///
/// Returns [`GatewayError`] on invalid amounts, insufficient escrow, or a
/// ratio violation.
#[utoipa::path(
    post,
    path = "/api/v1/pool/deposit",
    tag = "Liquidity",
    summary = "Deposit liquidity",
    description = "Moves both assets from the holder's escrow into the pool and mints shares. Asset B above the current ratio is returned to escrow.",
    request_body = DepositRequest,
    responses(
        (status = 200, description = "Liquidity added", body = DepositResponse),
        (status = 400, description = "Invalid amounts or ratio", body = ErrorResponse),
        (status = 422, description = "Insufficient escrow", body = ErrorResponse),
    )
)]
pub async fn deposit(
    State(state): State<AppState>,
    Json(req): Json<DepositRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let holder = parse_holder(&req.holder)?;
    let amount_a = parse_amount("amount_a", &req.amount_a)?;
    let amount_b = parse_amount("amount_b", &req.amount_b)?;

    let receipt = state
        .pool_service
        .deposit(&holder, amount_a, amount_b)
        .await?;

    Ok(Json(DepositResponse {
        holder: holder.to_string(),
        shares_minted: receipt.shares_minted.to_string(),
        amount_a: receipt.amount_a.to_string(),
        amount_b: receipt.amount_b.to_string(),
        amount_b_unused: receipt.amount_b_unused.to_string(),
    }))
}

/// `POST /pool/deposit/estimate` — Paired amount required by the current ratio.
///
/// # Errors
///
/// Returns [`GatewayError`] on invalid parameters or an empty pool.
#[utoipa::path(
    post,
    path = "/api/v1/pool/deposit/estimate",
    tag = "Liquidity",
    summary = "Estimate deposit",
    description = "Returns how much of the opposite asset must accompany the given amount at the current reserve ratio.",
    request_body = DepositEstimateRequest,
    responses(
        (status = 200, description = "Paired amount", body = DepositEstimateResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 422, description = "Pool empty", body = ErrorResponse),
    )
)]
pub async fn estimate_deposit(
    State(state): State<AppState>,
    Json(req): Json<DepositEstimateRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let asset = parse_asset(&state.assets, &req.asset)?;
    let amount = parse_amount("amount", &req.amount)?;

    let paired = state.pool_service.required_deposit(asset, amount).await?;

    Ok(Json(DepositEstimateResponse {
        asset: state.assets.identity(asset).to_string(),
        amount: amount.to_string(),
        paired_asset: state.assets.identity(asset.opposite()).to_string(),
        paired_amount: paired.to_string(),
    }))
}

/// `POST /pool/withdraw` — Burn shares and release reserves to escrow.
///
/// # Errors
///
/// Returns [`GatewayError`] on invalid amounts or insufficient shares.
#[utoipa::path(
    post,
    path = "/api/v1/pool/withdraw",
    tag = "Liquidity",
    summary = "Withdraw liquidity",
    description = "Burns the holder's shares and pays the proportional reserves, rounded down, into the holder's escrow.",
    request_body = WithdrawRequest,
    responses(
        (status = 200, description = "Liquidity removed", body = WithdrawResponse),
        (status = 400, description = "Invalid amount", body = ErrorResponse),
        (status = 422, description = "Insufficient shares", body = ErrorResponse),
    )
)]
pub async fn withdraw(
    State(state): State<AppState>,
    Json(req): Json<WithdrawRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let holder = parse_holder(&req.holder)?;
    let shares = parse_amount("shares", &req.shares)?;

    let receipt = state.pool_service.withdraw(&holder, shares).await?;
    Ok(Json(withdraw_response(receipt)))
}

/// `POST /pool/withdraw/estimate` — Preview a withdrawal.
///
/// # Errors
///
/// Returns [`GatewayError`] on invalid amounts or an empty pool.
#[utoipa::path(
    post,
    path = "/api/v1/pool/withdraw/estimate",
    tag = "Liquidity",
    summary = "Estimate withdrawal",
    description = "Returns the reserves burning the given shares would pay out. The pool state is not modified.",
    request_body = WithdrawEstimateRequest,
    responses(
        (status = 200, description = "Withdrawal preview", body = WithdrawResponse),
        (status = 400, description = "Invalid amount", body = ErrorResponse),
        (status = 422, description = "Pool empty", body = ErrorResponse),
    )
)]
pub async fn estimate_withdraw(
    State(state): State<AppState>,
    Json(req): Json<WithdrawEstimateRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let shares = parse_amount("shares", &req.shares)?;
    let receipt = state.pool_service.quote_withdraw(shares).await?;
    Ok(Json(withdraw_response(receipt)))
}

fn withdraw_response(receipt: WithdrawReceipt) -> WithdrawResponse {
    WithdrawResponse {
        shares_burned: receipt.shares_burned.to_string(),
        amount_a: receipt.amount_a.to_string(),
        amount_b: receipt.amount_b.to_string(),
    }
}

/// Liquidity routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pool/deposit", post(deposit))
        .route("/pool/deposit/estimate", post(estimate_deposit))
        .route("/pool/withdraw", post(withdraw))
        .route("/pool/withdraw/estimate", post(estimate_withdraw))
}
