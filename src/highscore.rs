use crate::app_dirs::AppDirs;
use crate::config::GameType;
use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension, Result};
use std::path::{Path, PathBuf};

/// Best score ever achieved, with when it happened.
#[derive(Debug, Clone, PartialEq)]
pub struct Highscore {
    pub score: i32,
    pub achieved_at: DateTime<Local>,
}

/// One completed session, as persisted for the history view.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub score: i32,
    pub game_type: GameType,
    pub n_back: usize,
    pub sequence_len: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub played_at: DateTime<Local>,
}

/// Persistence seam for scores. The controller only writes the best
/// score when it has actually been beaten; session rows are recorded
/// unconditionally.
pub trait HighscoreStore {
    fn highscore(&self) -> Result<Option<Highscore>>;
    fn save_highscore(&mut self, entry: &Highscore) -> Result<()>;
    fn record_session(&mut self, record: &SessionRecord) -> Result<()>;
    fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>>;
}

/// SQLite-backed store
#[derive(Debug)]
pub struct SqliteHighscoreStore {
    conn: Connection,
}

impl SqliteHighscoreStore {
    /// Opens the store under the user state directory, creating the
    /// schema if needed.
    pub fn open_default() -> Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("nbak_scores.db"));

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        Self::open(db_path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS highscore (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                score INTEGER NOT NULL,
                achieved_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                score INTEGER NOT NULL,
                game_type TEXT NOT NULL,
                n_back INTEGER NOT NULL,
                sequence_len INTEGER NOT NULL,
                correct INTEGER NOT NULL,
                incorrect INTEGER NOT NULL,
                played_at TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_sessions_played_at ON sessions(played_at)",
            [],
        )?;

        Ok(SqliteHighscoreStore { conn })
    }
}

fn game_type_from_str(s: &str) -> GameType {
    match s {
        "Audio" => GameType::Audio,
        "AudioVisual" => GameType::AudioVisual,
        _ => GameType::Visual,
    }
}

fn parse_timestamp(column: usize, value: String) -> Result<DateTime<Local>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|ts| ts.with_timezone(&Local))
        .map_err(|_| {
            rusqlite::Error::InvalidColumnType(
                column,
                "timestamp".to_string(),
                rusqlite::types::Type::Text,
            )
        })
}

impl HighscoreStore for SqliteHighscoreStore {
    fn highscore(&self) -> Result<Option<Highscore>> {
        self.conn
            .query_row(
                "SELECT score, achieved_at FROM highscore WHERE id = 1",
                [],
                |row| {
                    let achieved_at: String = row.get(1)?;
                    Ok((row.get::<_, i32>(0)?, achieved_at))
                },
            )
            .optional()?
            .map(|(score, achieved_at)| {
                Ok(Highscore {
                    score,
                    achieved_at: parse_timestamp(1, achieved_at)?,
                })
            })
            .transpose()
    }

    fn save_highscore(&mut self, entry: &Highscore) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO highscore (id, score, achieved_at)
            VALUES (1, ?1, ?2)
            ON CONFLICT(id) DO UPDATE SET
                score = excluded.score,
                achieved_at = excluded.achieved_at
            "#,
            params![entry.score, entry.achieved_at.to_rfc3339()],
        )?;
        Ok(())
    }

    fn record_session(&mut self, record: &SessionRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO sessions
            (score, game_type, n_back, sequence_len, correct, incorrect, played_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.score,
                record.game_type.to_string(),
                record.n_back,
                record.sequence_len,
                record.correct,
                record.incorrect,
                record.played_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT score, game_type, n_back, sequence_len, correct, incorrect, played_at
            FROM sessions
            ORDER BY id DESC
            LIMIT ?1
            "#,
        )?;

        let record_iter = stmt.query_map([limit], |row| {
            let game_type: String = row.get(1)?;
            let played_at: String = row.get(6)?;
            Ok((
                row.get::<_, i32>(0)?,
                game_type,
                row.get::<_, usize>(2)?,
                row.get::<_, usize>(3)?,
                row.get::<_, usize>(4)?,
                row.get::<_, usize>(5)?,
                played_at,
            ))
        })?;

        let mut records = Vec::new();
        for record in record_iter {
            let (score, game_type, n_back, sequence_len, correct, incorrect, played_at) = record?;
            records.push(SessionRecord {
                score,
                game_type: game_type_from_str(&game_type),
                n_back,
                sequence_len,
                correct,
                incorrect,
                played_at: parse_timestamp(6, played_at)?,
            });
        }

        Ok(records)
    }
}

/// In-memory store for headless and integration tests. Tracks how many
/// times the best score was persisted so tests can assert exactly-once
/// behavior.
#[derive(Debug, Default)]
pub struct MemoryHighscoreStore {
    pub highscore: Option<Highscore>,
    pub sessions: Vec<SessionRecord>,
    pub highscore_saves: usize,
}

impl MemoryHighscoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_highscore(score: i32) -> Self {
        Self {
            highscore: Some(Highscore {
                score,
                achieved_at: Local::now(),
            }),
            ..Self::default()
        }
    }
}

impl HighscoreStore for MemoryHighscoreStore {
    fn highscore(&self) -> Result<Option<Highscore>> {
        Ok(self.highscore.clone())
    }

    fn save_highscore(&mut self, entry: &Highscore) -> Result<()> {
        self.highscore = Some(entry.clone());
        self.highscore_saves += 1;
        Ok(())
    }

    fn record_session(&mut self, record: &SessionRecord) -> Result<()> {
        self.sessions.push(record.clone());
        Ok(())
    }

    fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>> {
        Ok(self.sessions.iter().rev().take(limit).cloned().collect())
    }
}

/// Shared handle so a test can keep observing the store after handing it
/// to a controller.
impl HighscoreStore for std::sync::Arc<std::sync::Mutex<MemoryHighscoreStore>> {
    fn highscore(&self) -> Result<Option<Highscore>> {
        self.lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .highscore()
    }

    fn save_highscore(&mut self, entry: &Highscore) -> Result<()> {
        self.lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .save_highscore(entry)
    }

    fn record_session(&mut self, record: &SessionRecord) -> Result<()> {
        self.lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .record_session(record)
    }

    fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>> {
        self.lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .recent_sessions(limit)
    }
}
