//! Main Tally struct tying all components together.

use crate::audit::{AuditAction, AuditEntry, AuditLog};
use crate::credentials::{Credential, CredentialStore};
use crate::error::{Result, TallyError};
use crate::ledger::LedgerStore;
use crate::periods::PeriodManager;
use crate::roster::RosterManager;
use crate::subscriptions::{
    SubscriptionConfig, SubscriptionHandle, SubscriptionId, SubscriptionManager,
};
use crate::types::{
    ContributorId, ContributorSummary, FullState, PeriodId, RosterMember, TallyStats,
};
use fs2::FileExt;
use parking_lot::Mutex;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Tally configuration.
#[derive(Clone, Debug)]
pub struct TallyConfig {
    /// Data directory: lock file, credential file, period history.
    pub path: PathBuf,

    /// Whether to persist closed periods to disk.
    pub persist_periods: bool,

    /// Whether to create the data directory if it doesn't exist.
    pub create_if_missing: bool,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./tally"),
            persist_periods: true,
            create_if_missing: true,
        }
    }
}

/// Magic bytes for the data directory manifest.
const TALLY_MAGIC: &[u8; 4] = b"TAL\0";

/// Current data directory format version.
const TALLY_VERSION: u8 = 1;

/// The deposit ledger application core.
///
/// Owns every component and runs each mutation to completion (store
/// update, audit entry, broadcast) before the next one begins. Reads
/// never take the write lock.
pub struct Tally {
    /// Configuration.
    config: TallyConfig,

    /// Lock file for exclusive access.
    _lock_file: File,

    /// Aggregate and per-contributor deposit series.
    ledger: LedgerStore,

    /// Period snapshot history.
    periods: PeriodManager,

    /// Team roster.
    roster: RosterManager,

    /// Administrative action trail.
    audit: AuditLog,

    /// Accounts, loaded at open.
    credentials: CredentialStore,

    /// Live update fan-out.
    subscriptions: SubscriptionManager,

    /// Lock serializing mutations.
    write_lock: Mutex<()>,
}

impl Tally {
    /// Open an existing data directory or create a new one.
    pub fn open_or_create(config: TallyConfig) -> Result<Self> {
        if config.path.exists() {
            Self::open(config)
        } else if config.create_if_missing {
            Self::create(config)
        } else {
            Err(TallyError::NotInitialized)
        }
    }

    /// Create a new data directory.
    pub fn create(config: TallyConfig) -> Result<Self> {
        fs::create_dir_all(&config.path)?;

        Self::write_manifest(&config.path)?;

        let lock_file = Self::acquire_lock(&config.path)?;
        Self::build(config, lock_file)
    }

    /// Open an existing data directory.
    pub fn open(config: TallyConfig) -> Result<Self> {
        Self::verify_manifest(&config.path)?;

        let lock_file = Self::acquire_lock(&config.path)?;
        Self::build(config, lock_file)
    }

    fn build(config: TallyConfig, lock_file: File) -> Result<Self> {
        let periods = if config.persist_periods {
            PeriodManager::load(config.path.join("periods.bin"))?
        } else {
            PeriodManager::new(None)
        };
        let credentials = CredentialStore::load(config.path.join("credentials.json"))?;

        Ok(Self {
            config,
            _lock_file: lock_file,
            ledger: LedgerStore::new(),
            periods,
            roster: RosterManager::new(),
            audit: AuditLog::new(),
            credentials,
            subscriptions: SubscriptionManager::new(),
            write_lock: Mutex::new(()),
        })
    }

    // --- Deposit Operations ---

    /// Record a deposit, optionally attributed to a contributor.
    ///
    /// Returns the index of the new entry in the aggregate series.
    pub fn record_deposit(
        &self,
        amount: f64,
        time: &str,
        contributor: Option<&str>,
        actor: Option<&str>,
    ) -> Result<usize> {
        let _lock = self.write_lock.lock();

        let index = self.ledger.append_deposit(amount, time, contributor)?;

        let details = match contributor {
            Some(name) => format!("{} at {} for {}", amount, time, name),
            None => format!("{} at {}", amount, time),
        };
        self.audit.record(actor, AuditAction::Deposit, details);
        info!(amount, contributor, "deposit recorded");

        self.publish_state();
        Ok(index)
    }

    /// Rewrite the timestamp of one contributor entry.
    pub fn edit_entry_time(
        &self,
        contributor: &str,
        index: usize,
        new_time: &str,
        actor: Option<&str>,
    ) -> Result<()> {
        let _lock = self.write_lock.lock();

        self.ledger.edit_entry_time(contributor, index, new_time)?;
        self.audit.record(
            actor,
            AuditAction::EditEntry,
            format!("{}[{}] -> {}", contributor, index, new_time),
        );

        self.publish_state();
        Ok(())
    }

    /// Move a contributor's series under a new display name.
    pub fn rename_contributor(&self, old: &str, new: &str, actor: Option<&str>) -> Result<()> {
        let _lock = self.write_lock.lock();

        self.ledger.rename_contributor(old, new)?;
        self.audit.record(
            actor,
            AuditAction::RenameContributor,
            format!("{} -> {}", old, new),
        );
        info!(old, new, "contributor renamed");

        self.publish_state();
        Ok(())
    }

    /// Remove a contributor's series; aggregate totals are retained.
    pub fn delete_contributor(&self, name: &str, actor: Option<&str>) -> Result<()> {
        let _lock = self.write_lock.lock();

        self.ledger.delete_contributor(name)?;
        self.audit
            .record(actor, AuditAction::DeleteContributor, name.to_string());
        info!(name, "contributor deleted");

        self.publish_state();
        Ok(())
    }

    /// Per-contributor summaries, computed fresh.
    pub fn list_contributors(&self) -> Vec<ContributorSummary> {
        self.ledger.list_contributors()
    }

    // --- Period Operations ---

    /// Close the current period: snapshot, reset, new period id.
    pub fn close_period(&self, actor: Option<&str>) -> Result<PeriodId> {
        let _lock = self.write_lock.lock();

        let closed = self.periods.current_period();
        let next = self.periods.close_period(&self.ledger, &self.roster)?;
        self.audit
            .record(actor, AuditAction::ClosePeriod, closed.to_string());
        info!(closed = %closed, next = %next, "period closed");

        self.publish_state();
        Ok(next)
    }

    /// Restore a closed period into the live ledger and roster.
    pub fn restore_period(&self, id: &PeriodId, actor: Option<&str>) -> Result<()> {
        let _lock = self.write_lock.lock();

        self.periods
            .restore_period(id, &self.ledger, &self.roster)?;
        self.audit
            .record(actor, AuditAction::RestorePeriod, id.to_string());
        info!(period = %id, "period restored");

        self.publish_state();
        Ok(())
    }

    /// Period ids in history, in creation order.
    pub fn list_periods(&self) -> Vec<PeriodId> {
        self.periods.list_periods()
    }

    /// The period deposits currently accumulate into.
    pub fn current_period(&self) -> PeriodId {
        self.periods.current_period()
    }

    // --- Roster Operations ---

    /// Add a roster member.
    pub fn add_roster_member(
        &self,
        name: &str,
        description: &str,
        actor: Option<&str>,
    ) -> Result<RosterMember> {
        let _lock = self.write_lock.lock();

        let member = self.roster.add(name, description)?;
        self.audit
            .record(actor, AuditAction::RosterAdd, name.to_string());

        self.publish_state();
        Ok(member)
    }

    /// Update a roster member's name and/or description.
    pub fn edit_roster_member(
        &self,
        id: &ContributorId,
        name: Option<&str>,
        description: Option<&str>,
        actor: Option<&str>,
    ) -> Result<RosterMember> {
        let _lock = self.write_lock.lock();

        let member = self.roster.edit(id, name, description)?;
        self.audit
            .record(actor, AuditAction::RosterEdit, member.id.to_string());

        self.publish_state();
        Ok(member)
    }

    /// Remove a roster member.
    pub fn remove_roster_member(&self, id: &ContributorId, actor: Option<&str>) -> Result<()> {
        let _lock = self.write_lock.lock();

        self.roster.remove(id)?;
        self.audit
            .record(actor, AuditAction::RosterRemove, id.to_string());

        self.publish_state();
        Ok(())
    }

    /// Roster members in insertion order.
    pub fn roster(&self) -> Vec<RosterMember> {
        self.roster.members()
    }

    // --- Accounts ---

    /// Register an account. The first account becomes the master.
    pub fn register_account(
        &self,
        name: &str,
        password: &str,
        actor: Option<&str>,
    ) -> Result<Credential> {
        let _lock = self.write_lock.lock();

        let is_master = self.credentials.is_empty();
        let credential = self.credentials.register(name, password, is_master)?;
        self.audit
            .record(actor, AuditAction::Register, name.to_string());
        info!(name, is_master, "account registered");

        Ok(credential)
    }

    /// Check a name/password pair. Returns the matched account.
    pub fn login(&self, name: &str, password: &str) -> Option<Credential> {
        self.credentials.verify(name, password)
    }

    // --- Audit ---

    /// Audit entries, oldest first.
    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.audit.entries()
    }

    /// Clear the audit log; master account only.
    pub fn clear_audit(&self, actor: &str) -> Result<()> {
        let _lock = self.write_lock.lock();

        let master = self
            .credentials
            .master_name()
            .ok_or_else(|| TallyError::PermissionDenied(actor.to_string()))?;
        self.audit.clear(actor, &master)
    }

    // --- Live Updates ---

    /// Subscribe to live updates with default buffering.
    ///
    /// The current full state arrives immediately as the first event.
    pub fn subscribe(&self) -> SubscriptionHandle {
        self.subscribe_with(SubscriptionConfig::default())
    }

    /// Subscribe with explicit configuration.
    pub fn subscribe_with(&self, config: SubscriptionConfig) -> SubscriptionHandle {
        // Hold the write lock so the initial frame cannot interleave with
        // a mutation in progress.
        let _lock = self.write_lock.lock();
        self.subscriptions.subscribe(config, Arc::new(self.full_state()))
    }

    /// Drop a subscription. Safe to call for an already-gone id.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscriptions.unsubscribe(id);
    }

    /// Assemble the complete live state (also the broadcast payload).
    pub fn full_state(&self) -> FullState {
        let snapshot = self.ledger.snapshot();
        FullState {
            aggregate: snapshot.aggregate,
            contributors: snapshot.contributors,
            roster: self.roster.members(),
            period: self.periods.current_period(),
        }
    }

    /// Ledger statistics.
    pub fn stats(&self) -> TallyStats {
        TallyStats {
            aggregate_deposits: self.ledger.aggregate_len(),
            contributor_count: self.ledger.contributor_count(),
            roster_size: self.roster.len(),
            period_count: self.periods.period_count(),
            audit_entries: self.audit.len(),
            subscriber_count: self.subscriptions.subscriber_count(),
        }
    }

    /// Configured data directory.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Serialize the current state once and fan it out to every sink.
    fn publish_state(&self) {
        self.subscriptions.publish(Arc::new(self.full_state()));
    }

    fn write_manifest(path: &Path) -> Result<()> {
        use std::io::Write;

        let manifest_path = path.join("MANIFEST");
        let mut file = File::create(manifest_path)?;

        file.write_all(TALLY_MAGIC)?;
        file.write_all(&[TALLY_VERSION])?;
        file.sync_all()?;

        Ok(())
    }

    fn verify_manifest(path: &Path) -> Result<()> {
        use std::io::Read;

        let manifest_path = path.join("MANIFEST");
        let mut file = File::open(manifest_path)?;

        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)?;
        if &magic != TALLY_MAGIC {
            return Err(TallyError::InvalidFormat("Invalid manifest magic".into()));
        }

        let mut version = [0u8; 1];
        file.read_exact(&mut version)?;
        if version[0] != TALLY_VERSION {
            return Err(TallyError::InvalidFormat(format!(
                "Unsupported data directory version: {}",
                version[0]
            )));
        }

        Ok(())
    }

    fn acquire_lock(path: &Path) -> Result<File> {
        let lock_path = path.join("LOCK");
        let lock_file = File::create(lock_path)?;

        lock_file
            .try_lock_exclusive()
            .map_err(|_| TallyError::Locked)?;

        Ok(lock_file)
    }
}
