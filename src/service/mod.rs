//! Service layer: business logic orchestration.
//!
//! [`PoolService`] serializes ledger operations, moves funds through
//! custody around them, and emits events through the
//! [`super::domain::EventBus`].

pub mod pool_service;

pub use pool_service::PoolService;
