//! Append-only audit trail of administrative actions.

mod log;

pub use log::{AuditAction, AuditEntry, AuditLog};
