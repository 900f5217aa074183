//! Ledger store implementation.

use crate::error::{Result, TallyError};
use crate::types::{ContributorId, ContributorSummary, DepositEntry, DepositSeries};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Deep copy of the ledger contents, as captured into period snapshots.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// The combined all-contributors timeline.
    pub aggregate: DepositSeries,

    /// Per-contributor timelines, keyed by display name.
    pub contributors: BTreeMap<String, DepositSeries>,
}

/// Holds the aggregate deposit series and one series per contributor.
///
/// Mutated only through the operations below; the contributor key is the
/// display name exactly as given (case- and diacritic-sensitive).
pub struct LedgerStore {
    inner: RwLock<LedgerSnapshot>,
}

impl LedgerStore {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LedgerSnapshot::default()),
        }
    }

    /// Append a deposit to the aggregate series and, if a contributor is
    /// named, to that contributor's series (created lazily).
    ///
    /// Returns the index of the new entry in the aggregate series.
    pub fn append_deposit(
        &self,
        amount: f64,
        time: &str,
        contributor: Option<&str>,
    ) -> Result<usize> {
        if !amount.is_finite() {
            return Err(TallyError::InvalidAmount(amount));
        }

        let mut inner = self.inner.write();

        let aggregate_index = inner.aggregate.len();
        inner.aggregate.push(time, amount);

        if let Some(name) = contributor {
            let series = inner.contributors.entry(name.to_string()).or_default();
            series.push(time, amount);
            series.entries.push(DepositEntry {
                time: time.to_string(),
                value: amount,
                aggregate_index,
            });
        }

        Ok(aggregate_index)
    }

    /// Rewrite the timestamp of one contributor entry, together with the
    /// aggregate label it cross-references.
    ///
    /// Values and ordering are untouched; after the edit the contributor
    /// label and the aggregate label at `entries[index].aggregate_index`
    /// are identical again.
    pub fn edit_entry_time(&self, contributor: &str, index: usize, new_time: &str) -> Result<()> {
        let mut inner = self.inner.write();

        let series = inner
            .contributors
            .get_mut(contributor)
            .ok_or_else(|| TallyError::ContributorNotFound(contributor.to_string()))?;

        let len = series.entries.len();
        if index >= len {
            return Err(TallyError::EntryOutOfBounds {
                contributor: contributor.to_string(),
                index,
                len,
            });
        }

        series.labels[index] = new_time.to_string();
        series.entries[index].time = new_time.to_string();
        let aggregate_index = series.entries[index].aggregate_index;

        let slot = inner
            .aggregate
            .labels
            .get_mut(aggregate_index)
            .ok_or_else(|| {
                TallyError::InvalidFormat(format!(
                    "stale aggregate cross-reference {} for {}",
                    aggregate_index, contributor
                ))
            })?;
        *slot = new_time.to_string();

        Ok(())
    }

    /// Move a contributor's series under a new display name.
    ///
    /// The per-entry aggregate cross-references move with the series, so
    /// later edits keep working on deposits made before the rename.
    pub fn rename_contributor(&self, old: &str, new: &str) -> Result<()> {
        let mut inner = self.inner.write();

        if inner.contributors.contains_key(new) {
            return Err(TallyError::DuplicateName(new.to_string()));
        }

        let series = inner
            .contributors
            .remove(old)
            .ok_or_else(|| TallyError::ContributorNotFound(old.to_string()))?;

        inner.contributors.insert(new.to_string(), series);
        Ok(())
    }

    /// Remove a contributor's series entirely.
    ///
    /// The aggregate series keeps its entries: historical totals are
    /// retained even though per-contributor attribution is lost.
    pub fn delete_contributor(&self, name: &str) -> Result<()> {
        let mut inner = self.inner.write();
        inner
            .contributors
            .remove(name)
            .ok_or_else(|| TallyError::ContributorNotFound(name.to_string()))?;
        Ok(())
    }

    /// Summaries for every contributor, computed fresh on each call.
    pub fn list_contributors(&self) -> Vec<ContributorSummary> {
        let inner = self.inner.read();
        inner
            .contributors
            .iter()
            .map(|(name, series)| ContributorSummary {
                id: ContributorId::derive(name),
                name: name.clone(),
                deposit_count: series.len(),
                total: series.total(),
            })
            .collect()
    }

    /// Cloned view of the aggregate series.
    pub fn aggregate(&self) -> DepositSeries {
        self.inner.read().aggregate.clone()
    }

    /// Cloned view of one contributor's series.
    pub fn contributor(&self, name: &str) -> Option<DepositSeries> {
        self.inner.read().contributors.get(name).cloned()
    }

    /// Number of contributors with a live series.
    pub fn contributor_count(&self) -> usize {
        self.inner.read().contributors.len()
    }

    /// Number of entries in the aggregate series.
    pub fn aggregate_len(&self) -> usize {
        self.inner.read().aggregate.len()
    }

    /// Deep copy of the full ledger contents.
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.inner.read().clone()
    }

    /// Replace the ledger contents with a previously taken snapshot.
    pub fn restore(&self, snapshot: LedgerSnapshot) {
        *self.inner.write() = snapshot;
    }

    /// Empty the aggregate series and all contributor series.
    pub fn clear(&self) {
        *self.inner.write() = LedgerSnapshot::default();
    }
}

impl Default for LedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_grows_both_series() {
        let store = LedgerStore::new();

        let idx = store.append_deposit(50.0, "Mon 10:00", Some("Ana")).unwrap();
        assert_eq!(idx, 0);
        let idx = store.append_deposit(30.0, "Tue 09:15", Some("Ana")).unwrap();
        assert_eq!(idx, 1);

        let aggregate = store.aggregate();
        assert_eq!(aggregate.labels.len(), aggregate.values.len());
        assert_eq!(aggregate.len(), 2);
        assert_eq!(aggregate.total(), 80.0);

        let ana = store.contributor("Ana").unwrap();
        assert_eq!(ana.len(), 2);
        assert_eq!(ana.entries[1].aggregate_index, 1);
    }

    #[test]
    fn test_append_rejects_non_finite() {
        let store = LedgerStore::new();
        assert!(matches!(
            store.append_deposit(f64::NAN, "now", None),
            Err(TallyError::InvalidAmount(_))
        ));
        assert!(matches!(
            store.append_deposit(f64::INFINITY, "now", None),
            Err(TallyError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_anonymous_deposit_touches_only_aggregate() {
        let store = LedgerStore::new();
        store.append_deposit(10.0, "Mon", None).unwrap();
        assert_eq!(store.aggregate_len(), 1);
        assert_eq!(store.contributor_count(), 0);
    }

    #[test]
    fn test_edit_updates_both_labels() {
        let store = LedgerStore::new();
        store.append_deposit(5.0, "Mon", None).unwrap();
        store.append_deposit(50.0, "Tue", Some("Bo")).unwrap();

        store.edit_entry_time("Bo", 0, "Wed").unwrap();

        let bo = store.contributor("Bo").unwrap();
        assert_eq!(bo.labels[0], "Wed");
        assert_eq!(bo.entries[0].time, "Wed");

        let aggregate = store.aggregate();
        assert_eq!(aggregate.labels[1], "Wed");
        // Untouched neighbor.
        assert_eq!(aggregate.labels[0], "Mon");
        assert_eq!(aggregate.values, vec![5.0, 50.0]);
    }

    #[test]
    fn test_edit_bounds() {
        let store = LedgerStore::new();
        store.append_deposit(50.0, "Tue", Some("Bo")).unwrap();

        assert!(matches!(
            store.edit_entry_time("Bo", 3, "Wed"),
            Err(TallyError::EntryOutOfBounds { index: 3, .. })
        ));
        assert!(matches!(
            store.edit_entry_time("nobody", 0, "Wed"),
            Err(TallyError::ContributorNotFound(_))
        ));
    }

    #[test]
    fn test_rename_keeps_entries() {
        let store = LedgerStore::new();
        store.append_deposit(50.0, "Tue", Some("Bo")).unwrap();

        store.rename_contributor("Bo", "Robert").unwrap();
        assert!(store.contributor("Bo").is_none());

        let robert = store.contributor("Robert").unwrap();
        assert_eq!(robert.entries.len(), 1);

        // Edits still reach the aggregate slot after the rename.
        store.edit_entry_time("Robert", 0, "Thu").unwrap();
        assert_eq!(store.aggregate().labels[0], "Thu");
    }

    #[test]
    fn test_rename_collision() {
        let store = LedgerStore::new();
        store.append_deposit(1.0, "Mon", Some("Ana")).unwrap();
        store.append_deposit(2.0, "Mon", Some("Bo")).unwrap();

        assert!(matches!(
            store.rename_contributor("Ana", "Bo"),
            Err(TallyError::DuplicateName(_))
        ));
    }

    #[test]
    fn test_delete_leaves_aggregate() {
        let store = LedgerStore::new();
        store.append_deposit(50.0, "Mon", Some("Ana")).unwrap();
        store.append_deposit(30.0, "Tue", Some("Bo")).unwrap();

        store.delete_contributor("Ana").unwrap();

        assert!(store.contributor("Ana").is_none());
        assert_eq!(store.aggregate().total(), 80.0);
        assert_eq!(store.list_contributors().len(), 1);
    }

    #[test]
    fn test_list_contributors_fresh_totals() {
        let store = LedgerStore::new();
        store.append_deposit(50.0, "Mon", Some("Ana")).unwrap();
        store.append_deposit(30.0, "Tue", Some("Ana")).unwrap();

        let listed = store.list_contributors();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Ana");
        assert_eq!(listed[0].deposit_count, 2);
        assert_eq!(listed[0].total, 80.0);
    }

    #[test]
    fn test_snapshot_restore_roundtrip() {
        let store = LedgerStore::new();
        store.append_deposit(10.0, "Mon", Some("Ana")).unwrap();

        let snapshot = store.snapshot();
        store.clear();
        assert_eq!(store.aggregate_len(), 0);

        store.restore(snapshot);
        assert_eq!(store.aggregate_len(), 1);
        assert_eq!(store.contributor("Ana").unwrap().total(), 10.0);
    }
}
