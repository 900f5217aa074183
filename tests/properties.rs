//! Property tests for series invariants.

use proptest::prelude::*;
use tally::LedgerStore;

const NAMES: [&str; 3] = ["Ana", "Bo", "Cleo"];

/// A deposit: amount plus an optional contributor pick.
fn deposits() -> impl Strategy<Value = Vec<(f64, Option<usize>)>> {
    prop::collection::vec(
        (-1000.0f64..1000.0, prop::option::of(0usize..NAMES.len())),
        1..64,
    )
}

proptest! {
    /// Labels and values stay aligned and grow by exactly one per append,
    /// in the aggregate and in every contributor series.
    #[test]
    fn append_keeps_series_aligned(seq in deposits()) {
        let store = LedgerStore::new();

        for (i, (amount, who)) in seq.iter().enumerate() {
            let contributor = who.map(|w| NAMES[w]);
            let index = store
                .append_deposit(*amount, &format!("t{}", i), contributor)
                .unwrap();
            prop_assert_eq!(index, i);

            let aggregate = store.aggregate();
            prop_assert_eq!(aggregate.labels.len(), aggregate.values.len());
            prop_assert_eq!(aggregate.len(), i + 1);
        }

        for name in NAMES {
            if let Some(series) = store.contributor(name) {
                prop_assert_eq!(series.labels.len(), series.values.len());
                prop_assert_eq!(series.entries.len(), series.labels.len());
                for (i, entry) in series.entries.iter().enumerate() {
                    prop_assert_eq!(&entry.time, &series.labels[i]);
                    prop_assert_eq!(entry.value, series.values[i]);
                }
            }
        }
    }

    /// With every deposit attributed and nothing deleted, contributor
    /// totals account for the whole aggregate.
    #[test]
    fn attributed_totals_sum_to_aggregate(seq in deposits()) {
        let store = LedgerStore::new();

        for (i, (amount, who)) in seq.iter().enumerate() {
            let contributor = NAMES[who.unwrap_or(0)];
            store
                .append_deposit(*amount, &format!("t{}", i), Some(contributor))
                .unwrap();
        }

        let contributor_sum: f64 = store
            .list_contributors()
            .iter()
            .map(|c| c.total)
            .sum();
        let aggregate_total = store.aggregate().total();
        prop_assert!((contributor_sum - aggregate_total).abs() < 1e-6);
    }

    /// Editing one entry touches exactly one contributor label and its
    /// aggregate counterpart.
    #[test]
    fn edit_touches_one_slot(
        seq in deposits(),
        pick in 0usize..64,
    ) {
        let store = LedgerStore::new();

        for (i, (amount, who)) in seq.iter().enumerate() {
            let contributor = NAMES[who.unwrap_or(0)];
            store
                .append_deposit(*amount, &format!("t{}", i), Some(contributor))
                .unwrap();
        }

        // Pick some existing contributor entry.
        let summaries = store.list_contributors();
        let target = &summaries[pick % summaries.len()];
        let series = store.contributor(&target.name).unwrap();
        let index = pick % series.len();
        let aggregate_index = series.entries[index].aggregate_index;

        let before = store.aggregate();
        store.edit_entry_time(&target.name, index, "edited").unwrap();
        let after = store.aggregate();

        prop_assert_eq!(&after.labels[aggregate_index], "edited");
        for i in 0..before.len() {
            if i != aggregate_index {
                prop_assert_eq!(&after.labels[i], &before.labels[i]);
            }
        }
        prop_assert_eq!(after.values, before.values);
    }

    /// Snapshot then restore reproduces the ledger exactly, regardless of
    /// what happened in between.
    #[test]
    fn snapshot_restore_is_exact(seq in deposits()) {
        let store = LedgerStore::new();

        for (i, (amount, who)) in seq.iter().enumerate() {
            let contributor = who.map(|w| NAMES[w]);
            store
                .append_deposit(*amount, &format!("t{}", i), contributor)
                .unwrap();
        }

        let before = store.snapshot();
        store.append_deposit(1.0, "later", Some("Dee")).unwrap();
        store.clear();
        store.restore(before);

        let aggregate = store.aggregate();
        prop_assert_eq!(aggregate.len(), seq.len());
        prop_assert!(store.contributor("Dee").is_none());
    }
}
