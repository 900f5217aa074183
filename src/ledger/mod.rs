//! The in-memory deposit ledger.

mod store;

pub use store::{LedgerSnapshot, LedgerStore};
