use std::fs;

use assert_matches::assert_matches;
use chrono::{Datelike, Local, TimeZone};
use cubik::error::{SessionLoadError, StoreError};
use cubik::export::export_csv_file;
use cubik::scramble::CubeSize;
use cubik::session::{FileSessionStore, SessionStore, Solve};
use tempfile::tempdir;

#[test]
fn session_survives_a_store_round_trip() {
    let dir = tempdir().unwrap();
    let store = FileSessionStore::with_dir(dir.path());

    let mut session = store.create("weekly", CubeSize::Two, false).unwrap();
    let date = Local.with_ymd_and_hms(2024, 5, 1, 9, 15, 0).unwrap();
    for time in ["8.12", "7.95", "9.01", "8.40", "8.77", "1:02.50"] {
        session.push(Solve::new(time, "R U R' F2", date).unwrap());
    }
    store.save(&session).unwrap();

    let loaded = store.load("weekly").unwrap();
    assert_eq!(loaded.name(), "weekly");
    assert_eq!(loaded.scramble_type(), CubeSize::Two);
    assert_eq!(loaded.len(), 6);
    assert_eq!(loaded.solves()[5].raw_time, 62.5);
    assert_eq!(loaded.solves()[0].date, date);
    assert_eq!(loaded.stats().best_time, Some(7.95));
    assert_eq!(loaded.all_ao5(), session.all_ao5());
}

#[test]
fn legacy_session_file_is_migrated() {
    let dir = tempdir().unwrap();
    // no version and no scramble type, dates in the old space separated format,
    // cached statistics that are recomputed instead of trusted
    fs::write(
        dir.path().join("old.json"),
        r#"{
            "name": "old",
            "solves": [
                {"time": "12.34", "scramble": "R U", "date": "2021-06-01 20:11:05.123456"},
                {"time": "11.00", "scramble": "F2 D", "date": "2021-06-01 20:12:40.5"}
            ],
            "best_time": "1.00",
            "best_ao5": "n/a"
        }"#,
    )
    .unwrap();

    let store = FileSessionStore::with_dir(dir.path());
    let session = store.load("old").unwrap();
    assert_eq!(session.scramble_type(), CubeSize::Three);
    assert_eq!(session.len(), 2);
    assert_eq!(session.stats().best_time, Some(11.0));
    assert_eq!(session.solves()[0].date.year(), 2021);

    // saving writes the current format, which loads back the same
    store.save(&session).unwrap();
    let text = fs::read_to_string(dir.path().join("old.json")).unwrap();
    assert!(text.contains("\"version\": 1"));
    assert_eq!(store.load("old").unwrap().len(), 2);
}

#[test]
fn broken_session_files_are_reported() {
    let dir = tempdir().unwrap();
    let store = FileSessionStore::with_dir(dir.path());

    fs::write(dir.path().join("garbage.json"), "not json at all").unwrap();
    assert_matches!(
        store.load("garbage"),
        Err(StoreError::Load {
            source: SessionLoadError::Corrupted(_),
            ..
        })
    );

    fs::write(
        dir.path().join("badtime.json"),
        r#"{"version": 1, "name": "badtime", "scramble_type": "3x3x3",
            "solves": [{"time": "abc", "scramble": "", "date": "2024-01-01T10:00:00+00:00"}]}"#,
    )
    .unwrap();
    assert_matches!(
        store.load("badtime"),
        Err(StoreError::Load {
            source: SessionLoadError::InvalidTime { index: 0, .. },
            ..
        })
    );

    fs::write(
        dir.path().join("future.json"),
        r#"{"version": 99, "name": "future", "scramble_type": "3x3x3", "solves": []}"#,
    )
    .unwrap();
    assert_matches!(
        store.load("future"),
        Err(StoreError::Load {
            source: SessionLoadError::UnsupportedVersion(99),
            ..
        })
    );

    assert_matches!(store.load("missing"), Err(StoreError::NotFound(_)));
}

#[test]
fn sessions_can_be_listed_renamed_and_deleted() {
    let dir = tempdir().unwrap();
    let store = FileSessionStore::with_dir(dir.path());
    store.create("b", CubeSize::Three, false).unwrap();
    store.create("a", CubeSize::Four, false).unwrap();

    assert_eq!(store.list().unwrap(), vec!["a", "b"]);
    assert_matches!(
        store.create("a", CubeSize::Three, false),
        Err(StoreError::AlreadyExists(_))
    );
    assert_matches!(store.create("../x", CubeSize::Three, false), Err(StoreError::InvalidName(_)));

    let renamed = store.rename("a", "c").unwrap();
    assert_eq!(renamed.name(), "c");
    assert_eq!(renamed.scramble_type(), CubeSize::Four);
    assert!(!store.exists("a"));
    assert_matches!(store.rename("b", "c"), Err(StoreError::AlreadyExists(_)));

    store.delete("b").unwrap();
    assert_eq!(store.list().unwrap(), vec!["c"]);
    assert_matches!(store.delete("b"), Err(StoreError::NotFound(_)));
}

#[test]
fn exported_csv_matches_session() {
    let dir = tempdir().unwrap();
    let store = FileSessionStore::with_dir(dir.path());
    let mut session = store.create("csv", CubeSize::Three, false).unwrap();
    let date = Local.with_ymd_and_hms(2024, 5, 1, 9, 15, 0).unwrap();
    for time in ["10.00", "11.00", "12.00", "13.00", "14.00"] {
        session.push(Solve::new(time, "U2 B", date).unwrap());
    }

    let path = dir.path().join("out.csv");
    assert_eq!(export_csv_file(&session, &path).unwrap(), 5);

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "index,time,scramble,date,ao5,ao12");
    assert_eq!(lines[1], "1,10.00,U2 B,2024-05-01 09:15:00,,");
    assert_eq!(lines[5], "5,14.00,U2 B,2024-05-01 09:15:00,12.00,");
}
