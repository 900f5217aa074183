//! Period manager implementation.

use crate::error::{Result, TallyError};
use crate::ledger::{LedgerSnapshot, LedgerStore};
use crate::roster::RosterManager;
use crate::types::{PeriodId, RosterMember, Timestamp};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Magic bytes for the period history file.
const PERIOD_HISTORY_MAGIC: &[u8; 4] = b"TLY\0";

/// Current period history format version.
const PERIOD_HISTORY_VERSION: u8 = 1;

/// Immutable deep copy of the ledger and roster at period close.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PeriodSnapshot {
    /// Id of the period this snapshot closed.
    pub id: PeriodId,

    /// When the snapshot was taken.
    pub taken: Timestamp,

    /// Ledger contents at close time.
    pub ledger: LedgerSnapshot,

    /// Roster at close time.
    pub roster: Vec<RosterMember>,
}

/// Period history kept in memory and optionally on disk.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct PeriodHistory {
    /// Snapshots in creation order.
    snapshots: Vec<PeriodSnapshot>,

    /// The period deposits are currently accumulating into.
    current: PeriodId,
}

/// Manages the snapshot history and the current period pointer.
pub struct PeriodManager {
    /// History file path; `None` disables persistence.
    path: Option<PathBuf>,

    history: RwLock<PeriodHistory>,
}

impl PeriodManager {
    /// Create a manager with an empty history and a fresh current period.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            history: RwLock::new(PeriodHistory {
                snapshots: Vec::new(),
                current: PeriodId::derive(Timestamp::now()),
            }),
        }
    }

    /// Load the history file if present, otherwise start fresh.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let manager = Self::new(Some(path.clone()));

        if path.exists() {
            manager.load_from_file()?;
        }

        Ok(manager)
    }

    /// Close the current period.
    ///
    /// Deep-copies the live ledger and roster into a snapshot stored under
    /// the current period id, clears the ledger (the roster stays live),
    /// and makes a fresh id current. Closing twice simply produces two
    /// history entries; the second one is empty.
    ///
    /// Returns the new current period id.
    pub fn close_period(&self, ledger: &LedgerStore, roster: &RosterManager) -> Result<PeriodId> {
        let mut history = self.history.write();

        let snapshot = PeriodSnapshot {
            id: history.current.clone(),
            taken: Timestamp::now(),
            ledger: ledger.snapshot(),
            roster: roster.snapshot(),
        };
        history.snapshots.push(snapshot);

        ledger.clear();

        // Micros tick fast, but two closes in the same tick must still get
        // distinct ids.
        let mut ts = Timestamp::now();
        if PeriodId::derive(ts) == history.current {
            ts = Timestamp(ts.0 + 1);
        }
        let next = PeriodId::derive(ts);
        history.current = next.clone();

        self.save(&history)?;
        Ok(next)
    }

    /// Restore a closed period into the live ledger and roster.
    ///
    /// The history itself is untouched; the restored snapshot's id becomes
    /// the current period.
    pub fn restore_period(
        &self,
        id: &PeriodId,
        ledger: &LedgerStore,
        roster: &RosterManager,
    ) -> Result<()> {
        let mut history = self.history.write();

        let snapshot = history
            .snapshots
            .iter()
            .find(|s| &s.id == id)
            .cloned()
            .ok_or_else(|| TallyError::PeriodNotFound(id.to_string()))?;

        ledger.restore(snapshot.ledger);
        roster.restore(snapshot.roster);
        history.current = snapshot.id;

        self.save(&history)?;
        Ok(())
    }

    /// Period ids present in history, in creation order.
    pub fn list_periods(&self) -> Vec<PeriodId> {
        self.history
            .read()
            .snapshots
            .iter()
            .map(|s| s.id.clone())
            .collect()
    }

    /// The period deposits currently accumulate into.
    pub fn current_period(&self) -> PeriodId {
        self.history.read().current.clone()
    }

    /// Number of snapshots in history.
    pub fn period_count(&self) -> usize {
        self.history.read().snapshots.len()
    }

    /// Save the history to file (no-op when persistence is disabled).
    fn save(&self, history: &PeriodHistory) -> Result<()> {
        let path = match &self.path {
            Some(path) => path,
            None => return Ok(()),
        };

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        file.write_all(PERIOD_HISTORY_MAGIC)?;
        file.write_all(&[PERIOD_HISTORY_VERSION])?;

        let encoded = rmp_serde::to_vec(history)?;
        file.write_all(&(encoded.len() as u64).to_le_bytes())?;
        file.write_all(&encoded)?;

        file.sync_all()?;
        Ok(())
    }

    /// Load the history from file.
    fn load_from_file(&self) -> Result<()> {
        let path = self.path.as_ref().ok_or(TallyError::NotInitialized)?;
        let mut file = File::open(path)?;

        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)?;
        if &magic != PERIOD_HISTORY_MAGIC {
            return Err(TallyError::InvalidFormat(
                "Invalid period history magic".into(),
            ));
        }

        let mut version = [0u8; 1];
        file.read_exact(&mut version)?;
        if version[0] != PERIOD_HISTORY_VERSION {
            return Err(TallyError::InvalidFormat(format!(
                "Unsupported period history version: {}",
                version[0]
            )));
        }

        let mut len_bytes = [0u8; 8];
        file.read_exact(&mut len_bytes)?;
        let len = u64::from_le_bytes(len_bytes) as usize;

        let mut encoded = vec![0u8; len];
        file.read_exact(&mut encoded)?;

        let history: PeriodHistory = rmp_serde::from_slice(&encoded)?;
        *self.history.write() = history;

        Ok(())
    }
}
