//! Pool read handlers: state, shares, and the swap log.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{
    CursorMeta, PoolResponse, SharesResponse, SwapLogParams, SwapLogResponse, SwapRecordDto,
    parse_holder,
};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `GET /pool` — Current pool state.
#[utoipa::path(
    get,
    path = "/api/v1/pool",
    tag = "Pool",
    summary = "Get pool state",
    description = "Returns reserves, total shares, the invariant K, macro-state, spot price, fee, and metadata.",
    responses(
        (status = 200, description = "Pool state", body = PoolResponse),
    )
)]
pub async fn get_pool(State(state): State<AppState>) -> impl IntoResponse {
    Json(PoolResponse::from(state.pool_service.summary().await))
}

/// `GET /pool/shares/{holder}` — Share balance of a holder.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] if the holder is blank.
#[utoipa::path(
    get,
    path = "/api/v1/pool/shares/{holder}",
    tag = "Pool",
    summary = "Get holder shares",
    description = "Returns the holder's share balance (zero if unknown) and the total supply.",
    params(
        ("holder" = String, Path, description = "Holder identifier"),
    ),
    responses(
        (status = 200, description = "Share balance", body = SharesResponse),
        (status = 400, description = "Invalid holder", body = ErrorResponse),
    )
)]
pub async fn get_shares(
    State(state): State<AppState>,
    Path(holder): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let holder = parse_holder(&holder)?;
    let (shares, total_shares) = state.pool_service.shares_of(&holder).await;
    Ok(Json(SharesResponse {
        holder: holder.to_string(),
        shares: shares.to_string(),
        total_shares: total_shares.to_string(),
    }))
}

/// `GET /pool/swaps` — Page through the append-only swap log.
#[utoipa::path(
    get,
    path = "/api/v1/pool/swaps",
    tag = "Pool",
    summary = "List swap records",
    description = "Returns swap records with a sequence greater than `after`, oldest first.",
    params(SwapLogParams),
    responses(
        (status = 200, description = "Swap log page", body = SwapLogResponse),
    )
)]
pub async fn list_swaps(
    State(state): State<AppState>,
    Query(params): Query<SwapLogParams>,
) -> impl IntoResponse {
    let params = params.clamped();
    let records = state
        .pool_service
        .swap_records(params.after, params.limit)
        .await;

    let next_after = if records.len() == params.limit {
        records.last().map(|r| r.sequence)
    } else {
        None
    };
    let data = records
        .iter()
        .map(|r| SwapRecordDto::from_record(r, &state.assets))
        .collect();

    Json(SwapLogResponse {
        data,
        cursor: CursorMeta {
            after: params.after,
            limit: params.limit,
            next_after,
        },
    })
}

/// Pool read routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pool", get(get_pool))
        .route("/pool/shares/{holder}", get(get_shares))
        .route("/pool/swaps", get(list_swaps))
}
