use chrono::{Duration, Local, TimeZone};
use plank::config::StorageBackend;
use plank::history::{HistoryStore, HISTORY_KEY};
use plank::session::TrainingSession;
use plank::storage::{open_store, FileStore, KeyValueStore, SqliteStore};
use tempfile::tempdir;

/// History survives closing and reopening the on-disk stores,
/// and each append keeps what was there before.

fn sessions() -> Vec<TrainingSession> {
    let t0 = Local.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
    vec![
        TrainingSession::new(t0, 10),
        TrainingSession::new(t0 + Duration::days(1), 25),
        TrainingSession::new(t0 + Duration::days(2), 61),
    ]
}

#[test]
fn sqlite_history_persists_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("history.db");

    for session in sessions() {
        // reopen for every append, like separate app launches
        let history = HistoryStore::new(SqliteStore::open(&path).unwrap());
        history.append(session).unwrap();
    }

    let history = HistoryStore::new(SqliteStore::open(&path).unwrap());
    assert_eq!(history.load_all(), sessions());

    let newest: Vec<u64> = history.newest_first().iter().map(|s| s.time).collect();
    assert_eq!(newest, vec![61, 25, 10]);
}

#[test]
fn file_history_persists_across_reopen() {
    let dir = tempdir().unwrap();

    for session in sessions() {
        HistoryStore::new(FileStore::new(dir.path()))
            .append(session)
            .unwrap();
    }

    let history = HistoryStore::new(FileStore::new(dir.path()));
    assert_eq!(history.load_all(), sessions());
}

#[test]
fn corrupted_file_history_reads_empty_then_recovers() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path());
    std::fs::write(store.path_for(HISTORY_KEY), b"\x00\x01 definitely not json").unwrap();

    let history = HistoryStore::new(store);
    assert!(history.load_all().is_empty());

    let first = sessions().remove(0);
    history.append(first.clone()).unwrap();
    assert_eq!(history.load_all(), vec![first]);
}

#[test]
fn stored_blob_is_a_json_list_of_date_and_time() {
    let dir = tempdir().unwrap();
    let store = open_store(StorageBackend::Sqlite, dir.path()).unwrap();
    let history = HistoryStore::new(store);
    history.append(sessions().remove(1)).unwrap();

    let blob = history.store().load(HISTORY_KEY).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&blob).unwrap();
    let list = value.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["time"], 25);
    assert!(list[0]["date"].as_str().unwrap().starts_with("2024-03-02T10:00:00"));
}
