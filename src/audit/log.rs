//! Audit log implementation.

use crate::error::{Result, TallyError};
use crate::types::Timestamp;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Actor recorded when a request carries no name.
const UNKNOWN_ACTOR: &str = "unknown";

/// Kinds of administrative actions the log records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Deposit,
    EditEntry,
    RenameContributor,
    DeleteContributor,
    ClosePeriod,
    RestorePeriod,
    RosterAdd,
    RosterEdit,
    RosterRemove,
    Register,
    ClearLog,
}

/// One audit log entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: Timestamp,
    pub actor: String,
    pub action: AuditAction,
    pub details: String,
}

/// Append-only record of administrative actions.
///
/// Recording is best-effort bookkeeping and never fails the caller's
/// primary operation; only the distinguished master account may clear it.
pub struct AuditLog {
    entries: RwLock<Vec<AuditEntry>>,
}

impl AuditLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Append an entry. A missing actor is recorded as "unknown".
    pub fn record(&self, actor: Option<&str>, action: AuditAction, details: impl Into<String>) {
        let entry = AuditEntry {
            timestamp: Timestamp::now(),
            actor: actor.unwrap_or(UNKNOWN_ACTOR).to_string(),
            action,
            details: details.into(),
        };
        self.entries.write().push(entry);
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().clone()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Empty the log.
    ///
    /// Permitted only when `actor` matches the master account name
    /// case-insensitively; the clear itself becomes the first entry of the
    /// fresh log.
    pub fn clear(&self, actor: &str, master: &str) -> Result<()> {
        if !actor.eq_ignore_ascii_case(master) {
            return Err(TallyError::PermissionDenied(actor.to_string()));
        }

        let mut entries = self.entries.write();
        entries.clear();
        entries.push(AuditEntry {
            timestamp: Timestamp::now(),
            actor: actor.to_string(),
            action: AuditAction::ClearLog,
            details: String::new(),
        });
        Ok(())
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_is_ordered() {
        let log = AuditLog::new();
        log.record(Some("ana"), AuditAction::Deposit, "50");
        log.record(Some("bo"), AuditAction::ClosePeriod, "");

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].actor, "ana");
        assert_eq!(entries[1].action, AuditAction::ClosePeriod);
    }

    #[test]
    fn test_missing_actor_is_unknown() {
        let log = AuditLog::new();
        log.record(None, AuditAction::Deposit, "30");
        assert_eq!(log.entries()[0].actor, "unknown");
    }

    #[test]
    fn test_clear_requires_master() {
        let log = AuditLog::new();
        log.record(Some("ana"), AuditAction::Deposit, "50");

        let result = log.clear("ana", "root");
        assert!(matches!(result, Err(TallyError::PermissionDenied(_))));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_clear_is_case_insensitive_and_self_recording() {
        let log = AuditLog::new();
        log.record(Some("ana"), AuditAction::Deposit, "50");
        log.record(Some("bo"), AuditAction::Deposit, "20");

        log.clear("ROOT", "root").unwrap();

        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::ClearLog);
        assert_eq!(entries[0].actor, "ROOT");
    }
}
