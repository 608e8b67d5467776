//! Swap and quote endpoint handlers.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{
    QuoteRequest, QuoteResponse, SwapRequest, SwapResponse, parse_amount, parse_asset,
    parse_holder, parse_optional_amount,
};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /pool/swap` — Execute a swap funded from the holder's escrow.
///
/// # Errors
///
/// Returns [`GatewayError`] on invalid parameters, insufficient escrow, an
/// empty pool, or when the output is below `min_amount_out`.
#[utoipa::path(
    post,
    path = "/api/v1/pool/swap",
    tag = "Swaps",
    summary = "Execute a swap",
    description = "Sells an exact input amount from the holder's escrow and pays the constant-product output into it.",
    request_body = SwapRequest,
    responses(
        (status = 200, description = "Swap executed", body = SwapResponse),
        (status = 400, description = "Invalid swap parameters", body = ErrorResponse),
        (status = 422, description = "Empty pool, insufficient escrow, or slippage exceeded", body = ErrorResponse),
    )
)]
pub async fn execute_swap(
    State(state): State<AppState>,
    Json(req): Json<SwapRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let holder = parse_holder(&req.holder)?;
    let asset_in = parse_asset(&state.assets, &req.asset_in)?;
    let amount_in = parse_amount("amount_in", &req.amount_in)?;
    let min_amount_out = parse_optional_amount("min_amount_out", req.min_amount_out.as_deref())?;

    let record = state
        .pool_service
        .swap(&holder, asset_in, amount_in, min_amount_out)
        .await?;

    Ok(Json(SwapResponse {
        sequence: record.sequence,
        asset_in: state.assets.identity(record.asset_in).to_string(),
        asset_out: state.assets.identity(record.asset_out).to_string(),
        amount_in: record.amount_in.to_string(),
        amount_out: record.amount_out.to_string(),
        fee: record.fee.to_string(),
        reserve_a: record.reserve_a.to_string(),
        reserve_b: record.reserve_b.to_string(),
        executed_at: record.executed_at,
    }))
}

/// `POST /pool/quote` — Get swap quote (read-only).
///
/// # Errors
///
/// Returns [`GatewayError`] on invalid parameters or an empty pool.
#[utoipa::path(
    post,
    path = "/api/v1/pool/quote",
    tag = "Swaps",
    summary = "Get swap quote",
    description = "Returns the output a swap would produce against the current reserves. The pool state is not modified.",
    request_body = QuoteRequest,
    responses(
        (status = 200, description = "Quote computed", body = QuoteResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 422, description = "Pool empty", body = ErrorResponse),
    )
)]
pub async fn get_quote(
    State(state): State<AppState>,
    Json(req): Json<QuoteRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let asset_in = parse_asset(&state.assets, &req.asset_in)?;
    let amount_in = parse_amount("amount_in", &req.amount_in)?;

    let quote = state.pool_service.quote(asset_in, amount_in).await?;

    Ok(Json(QuoteResponse {
        asset_in: state.assets.identity(quote.asset_in).to_string(),
        asset_out: state.assets.identity(quote.asset_out).to_string(),
        amount_in: quote.amount_in.to_string(),
        amount_out: quote.amount_out.to_string(),
        fee: quote.fee.to_string(),
        reserve_a_after: quote.reserve_a_after.to_string(),
        reserve_b_after: quote.reserve_b_after.to_string(),
        quoted_at: Utc::now(),
    }))
}

/// Swap and quote routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pool/swap", post(execute_swap))
        .route("/pool/quote", post(get_quote))
}
