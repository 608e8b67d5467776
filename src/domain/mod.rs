//! Domain layer: the pool ledger, its value types, custody, and events.
//!
//! This module contains the deterministic ledger core (fixed-point
//! amounts, asset and holder identities, fee policy, swap log), the
//! custody contract that moves funds around it, and the event system that
//! broadcasts committed state changes.

pub mod amount;
pub mod asset;
pub mod custody;
pub mod event_bus;
pub mod fee;
pub mod holder;
pub mod ledger;
pub mod ledger_error;
pub mod pool_entry;
pub mod pool_event;
pub mod swap_record;

pub use amount::{Amount, U256};
pub use asset::{Asset, AssetPair};
pub use custody::{AssetCustody, EscrowBalance, EscrowVault};
pub use event_bus::EventBus;
pub use fee::FeePolicy;
pub use holder::HolderId;
pub use ledger::{
    DepositReceipt, LedgerSnapshot, PoolLedger, PoolState, SwapQuote, WithdrawReceipt,
};
pub use ledger_error::LedgerError;
pub use pool_entry::{PoolEntry, PoolSummary};
pub use pool_event::{EventTopic, PoolEvent, PriceChangeReason};
pub use swap_record::SwapRecord;
