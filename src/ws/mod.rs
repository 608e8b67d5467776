//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` streams committed pool events to
//! clients filtered by topic (`swaps`, `liquidity`, `price`, `escrow`) and
//! optionally by holder.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
