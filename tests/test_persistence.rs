use galactic_salvage::error::StorageError;
use galactic_salvage::persistence::*;

fn result(score: u32) -> SessionResult {
    SessionResult {
        score,
        level: 1 + score / 10,
        accuracy: Some(50.0),
    }
}

// ── players ───────────────────────────────────────────────────────────────────

#[test]
fn player_lookup_is_case_insensitive() {
    let mut store = MemoryStore::new();
    let a = store.get_or_create_player_id("Ana").unwrap();
    let b = store.get_or_create_player_id("  ana ").unwrap();
    let c = store.get_or_create_player_id("ANA").unwrap();
    assert_eq!(a, b);
    assert_eq!(a, c);
    assert_eq!(store.tables().find_player("aNa"), Some(a));
}

#[test]
fn distinct_names_get_distinct_ids() {
    let mut store = MemoryStore::new();
    let a = store.get_or_create_player_id("Ana").unwrap();
    let b = store.get_or_create_player_id("Ben").unwrap();
    assert_ne!(a, b);
}

#[test]
fn blank_name_is_rejected() {
    let mut store = MemoryStore::new();
    assert!(matches!(
        store.get_or_create_player_id("   "),
        Err(StorageError::EmptyName)
    ));
}

// ── rows ──────────────────────────────────────────────────────────────────────

#[test]
fn zero_score_is_not_recorded() {
    let mut store = MemoryStore::new();
    let id = store.get_or_create_player_id("Ana").unwrap();
    assert!(matches!(
        store.record_session(id, &result(0)),
        Err(StorageError::ZeroScore)
    ));
    assert_eq!(store.tables().row_count(), 0);
}

#[test]
fn unknown_player_is_rejected() {
    let mut store = MemoryStore::new();
    assert!(matches!(
        store.record_session(99, &result(5)),
        Err(StorageError::UnknownPlayer(99))
    ));
}

#[test]
fn recorded_row_is_joined_with_its_player() {
    let mut store = MemoryStore::new();
    let id = store.get_or_create_player_id("Ana").unwrap();
    let row = store
        .record_session(
            id,
            &SessionResult {
                score: 7,
                level: 1,
                accuracy: None,
            },
        )
        .unwrap();

    let board = store.full_leaderboard().unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].row_id, row);
    assert_eq!(board[0].player_name, "Ana");
    assert_eq!(board[0].score, 7);
    assert_eq!(board[0].shooting_accuracy, None);
}

// ── views ─────────────────────────────────────────────────────────────────────

#[test]
fn high_score_of_empty_store_is_zero() {
    let store = MemoryStore::new();
    assert_eq!(store.current_high_score().unwrap(), 0);
    assert!(store.top_ten().unwrap().is_empty());
}

#[test]
fn top_ten_is_capped_and_sorted() {
    let mut store = MemoryStore::new();
    let ana = store.get_or_create_player_id("Ana").unwrap();
    let ben = store.get_or_create_player_id("Ben").unwrap();
    for score in 1..=12 {
        let who = if score % 2 == 0 { ana } else { ben };
        store.record_session(who, &result(score)).unwrap();
    }

    let top = store.top_ten().unwrap();
    assert_eq!(top.len(), TOP_TEN);
    assert_eq!(top[0].score, 12);
    assert_eq!(top[9].score, 3);
    assert!(top.windows(2).all(|w| w[0].score >= w[1].score));
    assert_eq!(store.current_high_score().unwrap(), 12);
    assert_eq!(store.full_leaderboard().unwrap().len(), 12);
}

#[test]
fn ties_keep_the_earlier_row_first() {
    let mut store = MemoryStore::new();
    let ana = store.get_or_create_player_id("Ana").unwrap();
    let ben = store.get_or_create_player_id("Ben").unwrap();
    let first = store.record_session(ben, &result(5)).unwrap();
    let second = store.record_session(ana, &result(5)).unwrap();

    let board = store.full_leaderboard().unwrap();
    assert_eq!(board[0].row_id, first);
    assert_eq!(board[1].row_id, second);
}

#[test]
fn top_entries_with_small_n() {
    let mut store = MemoryStore::new();
    let ana = store.get_or_create_player_id("Ana").unwrap();
    for score in [4, 9, 2] {
        store.record_session(ana, &result(score)).unwrap();
    }
    let top: Vec<u32> = store.top_entries(2).unwrap().iter().map(|e| e.score).collect();
    assert_eq!(top, vec![9, 4]);
}

// ── SQLite store ──────────────────────────────────────────────────────────────

fn open_db(dir: &tempfile::TempDir) -> SqliteStore {
    SqliteStore::open(dir.path().join("board.db")).unwrap()
}

#[test]
fn new_database_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_db(&dir);
    assert_eq!(store.current_high_score().unwrap(), 0);
    assert!(store.top_ten().unwrap().is_empty());
    assert_eq!(store.path(), dir.path().join("board.db").as_path());
}

#[test]
fn sqlite_player_lookup_is_case_insensitive() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let a = store.get_or_create_player_id("Ana").unwrap();
    assert_eq!(store.get_or_create_player_id(" ana ").unwrap(), a);
    assert_eq!(store.get_or_create_player_id("ANA").unwrap(), a);
    assert_ne!(store.get_or_create_player_id("Ben").unwrap(), a);
    assert!(matches!(
        store.get_or_create_player_id(""),
        Err(StorageError::EmptyName)
    ));
}

#[test]
fn players_table_rejects_a_name_differing_only_in_case() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_db(&dir);
    store.get_or_create_player_id("Ana").unwrap();

    let raw = rusqlite::Connection::open(dir.path().join("board.db")).unwrap();
    let dup = raw.execute("INSERT INTO players (player_name) VALUES ('aNA')", []);
    assert!(dup.is_err());
    let n: i64 = raw
        .query_row("SELECT COUNT(*) FROM players", [], |row| row.get(0))
        .unwrap();
    assert_eq!(n, 1);
}

#[test]
fn sqlite_rejects_zero_score_and_unknown_player() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let ana = store.get_or_create_player_id("Ana").unwrap();
    assert!(matches!(
        store.record_session(ana, &result(0)),
        Err(StorageError::ZeroScore)
    ));
    assert!(matches!(
        store.record_session(ana + 100, &result(5)),
        Err(StorageError::UnknownPlayer(_))
    ));
    assert_eq!(store.row_count().unwrap(), 0);
}

#[test]
fn sqlite_views_sort_and_cap() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let ana = store.get_or_create_player_id("Ana").unwrap();
    let ben = store.get_or_create_player_id("Ben").unwrap();
    let first_five = store.record_session(ben, &result(5)).unwrap();
    for score in 1..=12 {
        let who = if score % 2 == 0 { ana } else { ben };
        store.record_session(who, &result(score)).unwrap();
    }

    let top = store.top_ten().unwrap();
    assert_eq!(top.len(), TOP_TEN);
    assert_eq!(top[0].score, 12);
    assert!(top.windows(2).all(|w| w[0].score >= w[1].score));
    // Equal scores keep the earlier row first
    let fives: Vec<RowId> = top.iter().filter(|e| e.score == 5).map(|e| e.row_id).collect();
    assert_eq!(fives[0], first_five);
    assert_eq!(fives.len(), 2);

    assert_eq!(store.full_leaderboard().unwrap().len(), 13);
    let top3: Vec<u32> = store.top_entries(3).unwrap().iter().map(|e| e.score).collect();
    assert_eq!(top3, vec![12, 11, 10]);
    assert_eq!(store.current_high_score().unwrap(), 12);
}

#[test]
fn rows_survive_a_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut store = open_db(&dir);
        let ana = store.get_or_create_player_id("Ana").unwrap();
        store
            .record_session(
                ana,
                &SessionResult {
                    score: 7,
                    level: 1,
                    accuracy: None,
                },
            )
            .unwrap();
        store.record_session(ana, &result(3)).unwrap();
    }

    let mut store = open_db(&dir);
    let board = store.full_leaderboard().unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!(board[0].player_name, "Ana");
    assert_eq!(board[0].score, 7);
    assert_eq!(board[0].shooting_accuracy, None);
    assert_eq!(board[1].shooting_accuracy, Some(50.0));

    // Existing player is found, not duplicated, and ids keep counting
    let ana = store.get_or_create_player_id("ana").unwrap();
    let row = store.record_session(ana, &result(1)).unwrap();
    assert_eq!(row, 3);
}

#[test]
fn two_stores_on_one_file_keep_both_rows() {
    let dir = tempfile::tempdir().unwrap();
    let mut a = open_db(&dir);
    let mut b = open_db(&dir);

    let alice = a.get_or_create_player_id("Alice").unwrap();
    let row_a = a.record_session(alice, &result(7)).unwrap();
    let bob = b.get_or_create_player_id("bob").unwrap();
    let row_b = b.record_session(bob, &result(9)).unwrap();
    assert_ne!(row_a, row_b);

    // Each store sees the other's player rather than creating a second one
    assert_eq!(b.get_or_create_player_id("ALICE").unwrap(), alice);
    assert_eq!(a.get_or_create_player_id("Bob").unwrap(), bob);
    drop((a, b));

    let store = open_db(&dir);
    let rows: Vec<(String, u32)> = store
        .full_leaderboard()
        .unwrap()
        .into_iter()
        .map(|e| (e.player_name, e.score))
        .collect();
    assert_eq!(rows, vec![("bob".to_string(), 9), ("Alice".to_string(), 7)]);
}

#[test]
fn file_that_is_not_a_database_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.db");
    std::fs::write(&path, "not a database\n".repeat(64)).unwrap();
    assert!(matches!(
        SqliteStore::open(&path),
        Err(StorageError::Open { .. })
    ));
}

#[test]
fn missing_directory_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("board.db");
    assert!(matches!(
        SqliteStore::open(&path),
        Err(StorageError::Open { .. })
    ));
}

// ── unavailable store ─────────────────────────────────────────────────────────

#[test]
fn unavailable_store_fails_every_call() {
    let mut store = UnavailableStore::new("disk gone");
    assert!(matches!(
        store.get_or_create_player_id("Ana"),
        Err(StorageError::Unavailable(_))
    ));
    assert!(matches!(
        store.record_session(1, &result(5)),
        Err(StorageError::Unavailable(_))
    ));
    assert!(store.top_ten().is_err());
    match store.current_high_score() {
        Err(err) => assert_eq!(err.to_string(), "leaderboard unavailable: disk gone"),
        Ok(score) => panic!("unexpected high score {score}"),
    }
}
