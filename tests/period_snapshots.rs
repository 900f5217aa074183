//! Period close/restore behavior, including on-disk history.

use tally::{Tally, TallyConfig};
use tempfile::TempDir;

fn test_tally(dir: &TempDir) -> Tally {
    Tally::create(TallyConfig {
        path: dir.path().join("tally"),
        persist_periods: false,
        create_if_missing: true,
    })
    .unwrap()
}

#[test]
fn test_close_resets_ledger() {
    let dir = TempDir::new().unwrap();
    let tally = test_tally(&dir);

    tally.record_deposit(10.0, "Mon", None, None).unwrap();
    tally.record_deposit(20.0, "Tue", None, None).unwrap();

    let closed = tally.current_period();
    let next = tally.close_period(Some("root")).unwrap();

    assert_ne!(closed, next);
    assert_eq!(tally.current_period(), next);
    assert_eq!(tally.list_periods(), vec![closed]);

    let state = tally.full_state();
    assert!(state.aggregate.is_empty());
    assert!(state.contributors.is_empty());
}

#[test]
fn test_close_keeps_roster() {
    let dir = TempDir::new().unwrap();
    let tally = test_tally(&dir);

    tally.add_roster_member("Ana", "keeper", None).unwrap();
    tally.record_deposit(10.0, "Mon", Some("Ana"), None).unwrap();

    tally.close_period(None).unwrap();

    assert_eq!(tally.roster().len(), 1);
    assert!(tally.list_contributors().is_empty());
}

#[test]
fn test_restore_after_further_mutations() {
    let dir = TempDir::new().unwrap();
    let tally = test_tally(&dir);

    tally
        .record_deposit(10.0, "Mon", Some("Ana"), None)
        .unwrap();
    tally.record_deposit(20.0, "Tue", None, None).unwrap();

    let closed = tally.current_period();
    tally.close_period(None).unwrap();

    // A new month gets underway before the restore.
    tally
        .record_deposit(999.0, "Wed", Some("Bo"), None)
        .unwrap();
    tally.add_roster_member("Bo", "", None).unwrap();

    tally.restore_period(&closed, Some("root")).unwrap();

    let state = tally.full_state();
    assert_eq!(state.aggregate.values, vec![10.0, 20.0]);
    assert_eq!(state.aggregate.labels, vec!["Mon", "Tue"]);
    assert_eq!(state.contributors["Ana"].total(), 10.0);
    assert!(!state.contributors.contains_key("Bo"));
    assert_eq!(state.period, closed);
    // The pre-close roster (empty) is restored too.
    assert!(tally.roster().is_empty());
}

#[test]
fn test_restore_leaves_history_intact() {
    let dir = TempDir::new().unwrap();
    let tally = test_tally(&dir);

    tally.record_deposit(10.0, "Mon", None, None).unwrap();
    let first = tally.current_period();
    tally.close_period(None).unwrap();

    tally.record_deposit(20.0, "Tue", None, None).unwrap();
    let second = tally.current_period();
    tally.close_period(None).unwrap();

    tally.restore_period(&first, None).unwrap();
    assert_eq!(tally.list_periods(), vec![first.clone(), second.clone()]);

    // Restoring is repeatable in any order.
    tally.restore_period(&second, None).unwrap();
    assert_eq!(tally.full_state().aggregate.values, vec![20.0]);
    tally.restore_period(&first, None).unwrap();
    assert_eq!(tally.full_state().aggregate.values, vec![10.0]);
}

#[test]
fn test_double_close() {
    let dir = TempDir::new().unwrap();
    let tally = test_tally(&dir);

    tally.record_deposit(10.0, "Mon", None, None).unwrap();
    tally.close_period(None).unwrap();
    tally.close_period(None).unwrap();

    // Two history entries, the second snapshot empty.
    let periods = tally.list_periods();
    assert_eq!(periods.len(), 2);

    tally.restore_period(&periods[1], None).unwrap();
    assert!(tally.full_state().aggregate.is_empty());

    tally.restore_period(&periods[0], None).unwrap();
    assert_eq!(tally.full_state().aggregate.values, vec![10.0]);
}

// --- Persistence ---

#[test]
fn test_history_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tally");

    let (closed, next) = {
        let tally = Tally::create(TallyConfig {
            path: path.clone(),
            persist_periods: true,
            create_if_missing: true,
        })
        .unwrap();

        tally
            .record_deposit(42.0, "Mon", Some("Ana"), None)
            .unwrap();
        let closed = tally.current_period();
        let next = tally.close_period(Some("root")).unwrap();
        (closed, next)
    };

    let tally = Tally::open(TallyConfig {
        path,
        persist_periods: true,
        create_if_missing: true,
    })
    .unwrap();

    assert_eq!(tally.list_periods(), vec![closed.clone()]);
    assert_eq!(tally.current_period(), next);

    tally.restore_period(&closed, None).unwrap();
    let state = tally.full_state();
    assert_eq!(state.aggregate.values, vec![42.0]);
    assert_eq!(state.contributors["Ana"].total(), 42.0);
}

#[test]
fn test_memory_only_history_is_lost_on_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tally");

    {
        let tally = Tally::create(TallyConfig {
            path: path.clone(),
            persist_periods: false,
            create_if_missing: true,
        })
        .unwrap();
        tally.record_deposit(42.0, "Mon", None, None).unwrap();
        tally.close_period(None).unwrap();
        assert_eq!(tally.list_periods().len(), 1);
    }

    let tally = Tally::open(TallyConfig {
        path,
        persist_periods: false,
        create_if_missing: true,
    })
    .unwrap();
    assert!(tally.list_periods().is_empty());
}
