//! Leaderboard persistence.
//!
//! Two relations are stored: `players` (case-insensitively unique names)
//! and `leaderboard` (one immutable row per finished session), plus the
//! `full_leaderboard` and `top_ten_leaderboard` views over their join.
//! `SqliteStore` is the durable store; `MemoryStore` mirrors it in memory
//! for tests, and `UnavailableStore` stands in when the database cannot be
//! opened so every write reports the failure.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, Row};

use crate::error::StorageError;

/// SQLite rowids.
pub type PlayerId = i64;
pub type RowId = i64;

/// Rows shown on the end-of-game screen.
pub const TOP_TEN: usize = 10;

// ── Records ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub player_name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LeaderboardRow {
    pub id: RowId,
    pub player_id: PlayerId,
    pub score: u32,
    pub level: u32,
    pub shooting_accuracy: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// A leaderboard row joined with its player's name.
#[derive(Clone, Debug, PartialEq)]
pub struct LeaderboardEntry {
    pub row_id: RowId,
    pub player_name: String,
    pub score: u32,
    pub level: u32,
    pub shooting_accuracy: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// What a finished session hands to the store.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionResult {
    pub score: u32,
    pub level: u32,
    /// `None` when no shot was fired.
    pub accuracy: Option<f64>,
}

// ── Tables ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct Tables {
    players: Vec<PlayerRecord>,
    leaderboard: Vec<LeaderboardRow>,
    next_player_id: PlayerId,
    next_row_id: RowId,
}

/// Trimmed display form of a player name.
fn normalize(name: &str) -> Result<String, StorageError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StorageError::EmptyName);
    }
    Ok(trimmed.to_string())
}

impl Tables {
    pub fn find_player(&self, name: &str) -> Option<PlayerId> {
        let key = name.trim().to_lowercase();
        self.players
            .iter()
            .find(|p| p.player_name.to_lowercase() == key)
            .map(|p| p.id)
    }

    /// Lookup-or-insert as one step; the returned id is always findable.
    fn get_or_create_player(&mut self, name: &str) -> Result<(PlayerId, bool), StorageError> {
        let display = normalize(name)?;
        if let Some(id) = self.find_player(&display) {
            return Ok((id, false));
        }
        self.next_player_id = self.next_player_id.max(1);
        let id = self.next_player_id;
        self.next_player_id += 1;
        self.players.push(PlayerRecord {
            id,
            player_name: display,
        });
        Ok((id, true))
    }

    fn insert_row(
        &mut self,
        player_id: PlayerId,
        result: &SessionResult,
        created_at: DateTime<Utc>,
    ) -> Result<RowId, StorageError> {
        if result.score == 0 {
            return Err(StorageError::ZeroScore);
        }
        if !self.players.iter().any(|p| p.id == player_id) {
            return Err(StorageError::UnknownPlayer(player_id));
        }
        self.next_row_id = self.next_row_id.max(1);
        let id = self.next_row_id;
        self.next_row_id += 1;
        self.leaderboard.push(LeaderboardRow {
            id,
            player_id,
            score: result.score,
            level: result.level,
            shooting_accuracy: result.accuracy,
            created_at,
        });
        Ok(id)
    }

    /// Every row joined with its player, best first.  Equal scores are
    /// ordered by the earlier timestamp, then the lower row id.
    pub fn full_leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = self
            .leaderboard
            .iter()
            .filter_map(|row| {
                let Some(player) = self.players.iter().find(|p| p.id == row.player_id) else {
                    tracing::warn!(row = row.id, player = row.player_id, "row without a player; skipped");
                    return None;
                };
                Some(LeaderboardEntry {
                    row_id: row.id,
                    player_name: player.player_name.clone(),
                    score: row.score,
                    level: row.level,
                    shooting_accuracy: row.shooting_accuracy,
                    created_at: row.created_at,
                })
            })
            .collect();
        entries.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.row_id.cmp(&b.row_id))
        });
        entries
    }

    pub fn high_score(&self) -> u32 {
        self.leaderboard.iter().map(|r| r.score).max().unwrap_or(0)
    }

    pub fn row_count(&self) -> usize {
        self.leaderboard.len()
    }
}

// ── Store trait ───────────────────────────────────────────────────────────────

pub trait LeaderboardStore {
    /// Case-insensitive lookup, creating the player when absent.
    fn get_or_create_player_id(&mut self, name: &str) -> Result<PlayerId, StorageError>;

    /// Append one row.  Rejects a zero score and unknown players.
    fn record_session(&mut self, player_id: PlayerId, result: &SessionResult) -> Result<RowId, StorageError>;

    fn full_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, StorageError>;

    /// Highest `n` rows, best first.
    fn top_entries(&self, n: usize) -> Result<Vec<LeaderboardEntry>, StorageError> {
        let mut entries = self.full_leaderboard()?;
        entries.truncate(n);
        Ok(entries)
    }

    fn top_ten(&self) -> Result<Vec<LeaderboardEntry>, StorageError> {
        self.top_entries(TOP_TEN)
    }

    /// Best score on record, 0 for an empty store.
    fn current_high_score(&self) -> Result<u32, StorageError>;
}

// ── In-memory store ───────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tables: Tables,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }
}

impl LeaderboardStore for MemoryStore {
    fn get_or_create_player_id(&mut self, name: &str) -> Result<PlayerId, StorageError> {
        let (id, created) = self.tables.get_or_create_player(name)?;
        if created {
            tracing::info!(player_id = id, "player created");
        }
        Ok(id)
    }

    fn record_session(&mut self, player_id: PlayerId, result: &SessionResult) -> Result<RowId, StorageError> {
        self.tables.insert_row(player_id, result, Utc::now())
    }

    fn full_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, StorageError> {
        Ok(self.tables.full_leaderboard())
    }

    fn current_high_score(&self) -> Result<u32, StorageError> {
        Ok(self.tables.high_score())
    }
}

// ── SQLite store ──────────────────────────────────────────────────────────────

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS players (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        player_name TEXT NOT NULL UNIQUE COLLATE NOCASE
    );
    CREATE TABLE IF NOT EXISTS leaderboard (
        id                INTEGER PRIMARY KEY AUTOINCREMENT,
        player_id         INTEGER NOT NULL REFERENCES players(id),
        score             INTEGER NOT NULL CHECK (score > 0),
        level             INTEGER NOT NULL,
        shooting_accuracy REAL,
        created_at        TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_leaderboard_score ON leaderboard(score);
    CREATE VIEW IF NOT EXISTS full_leaderboard AS
        SELECT l.id, p.player_name, l.score, l.level, l.shooting_accuracy, l.created_at
        FROM leaderboard l JOIN players p ON p.id = l.player_id
        ORDER BY l.score DESC, l.created_at, l.id;
    CREATE VIEW IF NOT EXISTS top_ten_leaderboard AS
        SELECT * FROM full_leaderboard
        ORDER BY score DESC, created_at, id
        LIMIT 10;";

const ENTRY_COLUMNS: &str = "id, player_name, score, level, shooting_accuracy, created_at";
const ENTRY_ORDER: &str = "ORDER BY score DESC, created_at, id";

/// Leaderboard database file.  Every write is its own SQLite transaction,
/// so several stores may share one file without losing each other's rows.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and make sure the schema
    /// exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let open_err = |source: rusqlite::Error| StorageError::Open {
            path: path.clone(),
            source,
        };
        let conn = Connection::open(&path).map_err(open_err)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA busy_timeout=5000;
             PRAGMA foreign_keys=ON;",
        )
        .map_err(open_err)?;
        conn.execute_batch(SCHEMA).map_err(open_err)?;

        let store = SqliteStore { conn, path };
        tracing::debug!(
            path = %store.path.display(),
            rows = store.row_count()?,
            "leaderboard opened"
        );
        Ok(store)
    }

    /// An in-memory database with the same schema.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::open(":memory:")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn row_count(&self) -> Result<usize, StorageError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM leaderboard", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    fn select(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<LeaderboardEntry>, StorageError> {
        let mut stmt = self.conn.prepare(sql)?;
        let entries = stmt
            .query_map(params, entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<LeaderboardEntry> {
    Ok(LeaderboardEntry {
        row_id: row.get(0)?,
        player_name: row.get(1)?,
        score: row.get(2)?,
        level: row.get(3)?,
        shooting_accuracy: row.get(4)?,
        created_at: row.get(5)?,
    })
}

impl LeaderboardStore for SqliteStore {
    fn get_or_create_player_id(&mut self, name: &str) -> Result<PlayerId, StorageError> {
        let display = normalize(name)?;
        let tx = self.conn.transaction()?;
        let created = tx.execute(
            "INSERT OR IGNORE INTO players (player_name) VALUES (?1)",
            params![display],
        )?;
        let id: PlayerId = tx.query_row(
            "SELECT id FROM players WHERE player_name = ?1",
            params![display],
            |row| row.get(0),
        )?;
        tx.commit()?;
        if created > 0 {
            tracing::info!(player_id = id, "player created");
        }
        Ok(id)
    }

    fn record_session(&mut self, player_id: PlayerId, result: &SessionResult) -> Result<RowId, StorageError> {
        if result.score == 0 {
            return Err(StorageError::ZeroScore);
        }
        let inserted = self.conn.execute(
            "INSERT INTO leaderboard (player_id, score, level, shooting_accuracy, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![player_id, result.score, result.level, result.accuracy, Utc::now()],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == ErrorCode::ConstraintViolation => {
                return Err(StorageError::UnknownPlayer(player_id));
            }
            Err(err) => return Err(err.into()),
        }
        let row = self.conn.last_insert_rowid();
        tracing::info!(row, player_id, score = result.score, "leaderboard row written");
        Ok(row)
    }

    fn full_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, StorageError> {
        self.select(
            &format!("SELECT {ENTRY_COLUMNS} FROM full_leaderboard {ENTRY_ORDER}"),
            [],
        )
    }

    fn top_entries(&self, n: usize) -> Result<Vec<LeaderboardEntry>, StorageError> {
        let limit = i64::try_from(n).unwrap_or(i64::MAX);
        self.select(
            &format!("SELECT {ENTRY_COLUMNS} FROM full_leaderboard {ENTRY_ORDER} LIMIT ?1"),
            params![limit],
        )
    }

    fn top_ten(&self) -> Result<Vec<LeaderboardEntry>, StorageError> {
        self.select(
            &format!("SELECT {ENTRY_COLUMNS} FROM top_ten_leaderboard {ENTRY_ORDER}"),
            [],
        )
    }

    fn current_high_score(&self) -> Result<u32, StorageError> {
        let best: u32 = self.conn.query_row(
            "SELECT COALESCE(MAX(score), 0) FROM leaderboard",
            [],
            |row| row.get(0),
        )?;
        Ok(best)
    }
}

// ── Unavailable store ─────────────────────────────────────────────────────────

/// Used when the database could not be opened.  Every call fails with the
/// original reason, so a finished session reports its write as failed
/// instead of pretending it was saved.
#[derive(Clone, Debug)]
pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    pub fn new(reason: impl Into<String>) -> Self {
        UnavailableStore {
            reason: reason.into(),
        }
    }

    fn err(&self) -> StorageError {
        StorageError::Unavailable(self.reason.clone())
    }
}

impl LeaderboardStore for UnavailableStore {
    fn get_or_create_player_id(&mut self, _name: &str) -> Result<PlayerId, StorageError> {
        Err(self.err())
    }

    fn record_session(&mut self, _player_id: PlayerId, _result: &SessionResult) -> Result<RowId, StorageError> {
        Err(self.err())
    }

    fn full_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, StorageError> {
        Err(self.err())
    }

    fn current_high_score(&self) -> Result<u32, StorageError> {
        Err(self.err())
    }
}
