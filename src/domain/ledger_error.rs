//! Ledger error kinds.
//!
//! Every variant aborts the requested operation with no partial state
//! mutation. Nothing is retried internally.

use super::{Amount, Asset};

/// Errors returned by the pool ledger and its custody collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Zero input, or an input that does not satisfy the current ratio.
    #[error("invalid amount: {0}")]
    InvalidAmount(&'static str),

    /// The holder tried to burn more shares than they own.
    #[error("insufficient shares: requested {requested}, held {held}")]
    InsufficientShares {
        /// Shares the caller asked to burn.
        requested: Amount,
        /// Shares the holder currently owns.
        held: Amount,
    },

    /// Trade or quote against a pool with a zero reserve.
    #[error("pool has no liquidity")]
    PoolEmpty,

    /// An intermediate computation left the representable range.
    #[error("arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),

    /// The computed output fell below the caller's minimum.
    #[error("slippage exceeded: output {amount_out} below minimum {min_amount_out}")]
    SlippageExceeded {
        /// Output the pool would pay.
        amount_out: Amount,
        /// Minimum the caller accepted.
        min_amount_out: Amount,
    },

    /// Escrow does not hold enough of an asset to cover a transfer.
    #[error("insufficient escrow of asset {asset}: requested {requested}, available {available}")]
    InsufficientEscrow {
        /// Asset being moved.
        asset: Asset,
        /// Amount requested.
        requested: Amount,
        /// Amount available.
        available: Amount,
    },

    /// A persisted snapshot violates a ledger invariant.
    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),
}
