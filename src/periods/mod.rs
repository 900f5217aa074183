//! Accounting period snapshots: close, restore, history.

mod manager;

pub use manager::{PeriodManager, PeriodSnapshot};
