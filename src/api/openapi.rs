//! OpenAPI document assembled from the handler annotations.

use utoipa::OpenApi;

use super::handlers;

/// OpenAPI description of the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "amm-ledger",
        description = "Two-asset constant-product pool ledger. Amounts are decimal strings in smallest units."
    ),
    paths(
        handlers::pool::get_pool,
        handlers::pool::get_shares,
        handlers::pool::list_swaps,
        handlers::liquidity::deposit,
        handlers::liquidity::estimate_deposit,
        handlers::liquidity::withdraw,
        handlers::liquidity::estimate_withdraw,
        handlers::swap::execute_swap,
        handlers::swap::get_quote,
        handlers::escrow::get_escrow,
        handlers::escrow::credit_escrow,
        handlers::escrow::debit_escrow,
        handlers::system::health_handler,
    ),
    tags(
        (name = "Pool", description = "Reserves, shares, and the swap log"),
        (name = "Liquidity", description = "Deposits and withdrawals"),
        (name = "Swaps", description = "Swaps and quotes"),
        (name = "Escrow", description = "Holder escrow balances"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;
