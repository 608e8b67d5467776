//! # amm-ledger
//!
//! Two-asset constant-product liquidity pool ledger with a REST and
//! WebSocket gateway.
//!
//! The ledger keeps reserves of assets A and B, issues proportional
//! ownership shares to liquidity providers, and prices exact-input swaps
//! so that `reserve_a × reserve_b` never decreases. All arithmetic is
//! exact integer fixed-point with 256-bit intermediates; every rounding
//! favors the pool.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── PoolService (service/)      single write lock per mutation
//!     ├── EventBus (domain/)
//!     │
//!     ├── PoolEntry (domain/)
//!     │     ├── PoolLedger            reserves, shares, swap log
//!     │     └── EscrowVault           holder escrow + pool vault
//!     │
//!     └── PostgreSQL Persistence      optional, fed by a writer task
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;
