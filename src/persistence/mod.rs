//! Persistence layer: PostgreSQL ledger snapshots and swap log.
//!
//! Committed state reaches the database through a background writer fed by
//! an unbounded channel, so ledger operations never wait on I/O. Each
//! commit (snapshot plus the swap record it produced, if any) is written in
//! one transaction; on startup the latest snapshot and the full swap log
//! rebuild the ledger exactly.

pub mod models;
pub mod postgres;
pub mod writer;

pub use models::PersistedState;
pub use postgres::PostgresPersistence;
pub use writer::{PersistenceHandle, spawn_writer};
