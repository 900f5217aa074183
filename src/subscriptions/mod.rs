//! Live update subscriptions.
//!
//! Connected dashboards subscribe here; every ledger or roster mutation
//! publishes one shared full-state frame to all of them.

mod manager;
mod types;

pub use manager::SubscriptionManager;
pub use types::{
    DropReason, LedgerEvent, SubscriptionConfig, SubscriptionHandle, SubscriptionId,
};
