//! # Tally
//!
//! A live group deposit ledger: cumulative deposits for a small team,
//! pushed to connected dashboards on every change, with period
//! snapshot/restore and an append-only audit trail.
//!
//! ## Core Concepts
//!
//! - **Ledger**: one aggregate deposit timeline plus one per contributor
//! - **Periods**: close snapshots and resets the ledger; restore brings a
//!   closed period back
//! - **Audit**: append-only trail of admin actions, cleared only by the
//!   master account
//! - **Subscriptions**: every mutation fans the full state out to all
//!   connected sinks
//!
//! ## Example
//!
//! ```ignore
//! use tally::{Tally, TallyConfig};
//!
//! let tally = Tally::open_or_create(TallyConfig {
//!     path: "./my-tally".into(),
//!     ..Default::default()
//! })?;
//!
//! // Record a deposit
//! tally.record_deposit(50.0, "Mon 10:00", Some("Ana"), Some("ana"))?;
//!
//! // Watch live updates
//! let updates = tally.subscribe();
//! let first_frame = updates.recv()?;
//!
//! // Close the month
//! let next_period = tally.close_period(Some("ana"))?;
//! ```

pub mod audit;
pub mod credentials;
pub mod error;
pub mod ledger;
pub mod periods;
pub mod roster;
pub mod subscriptions;
pub mod tally;
pub mod types;

// Re-exports
pub use audit::{AuditAction, AuditEntry, AuditLog};
pub use credentials::{digest_password, Credential, CredentialStore};
pub use error::{Result, TallyError};
pub use ledger::{LedgerSnapshot, LedgerStore};
pub use periods::{PeriodManager, PeriodSnapshot};
pub use roster::RosterManager;
pub use subscriptions::{
    DropReason, LedgerEvent, SubscriptionConfig, SubscriptionHandle, SubscriptionId,
    SubscriptionManager,
};
pub use tally::{Tally, TallyConfig};
pub use types::*;
