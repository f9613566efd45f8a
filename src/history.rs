use crate::app_dirs::AppDirs;
use crate::content::ClassLevel;
use crate::error::HistoryError;
use crate::practice::PracticeMode;
use crate::verifier::{FailureReason, VerificationResult, Verdict};
use chrono::{DateTime, Local};
use clap::ValueEnum;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS attempts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp TEXT NOT NULL,
        level INTEGER,
        mode TEXT NOT NULL,
        expected TEXT NOT NULL,
        recognized TEXT NOT NULL,
        outcome TEXT NOT NULL,
        passed BOOLEAN NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_attempts_expected ON attempts(expected);
    CREATE INDEX IF NOT EXISTS idx_attempts_timestamp ON attempts(timestamp);
"#;

/// One checked attempt, as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    pub timestamp: DateTime<Local>,
    pub level: Option<ClassLevel>,
    pub mode: PracticeMode,
    pub expected: String,
    pub recognized: String,
    pub outcome: String,
    pub passed: bool,
}

impl AttemptRecord {
    pub fn from_result(
        level: Option<ClassLevel>,
        mode: PracticeMode,
        result: &VerificationResult,
    ) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            mode,
            expected: result.expected_text.clone(),
            recognized: result.recognized_text.clone(),
            outcome: outcome_label(result.verdict).to_string(),
            passed: result.passed(),
        }
    }
}

pub fn outcome_label(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Passed => "passed",
        Verdict::Failed(FailureReason::Mismatch) => "mismatch",
        Verdict::Failed(FailureReason::NoRecognitionAvailable) => "no_recognition",
        Verdict::Failed(FailureReason::EmptyContentPool) => "empty_pool",
    }
}

/// Per-target totals across every stored attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSummary {
    pub expected: String,
    pub attempts: u32,
    pub passed: u32,
}

/// SQLite log of verification attempts.
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Open the database at the default state path.
    pub fn open_default() -> Result<Self, HistoryError> {
        let path = AppDirs::history_path().unwrap_or_else(|| PathBuf::from("scrawl_history.db"));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, HistoryError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn in_memory() -> Result<Self, HistoryError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, HistoryError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn record(&self, attempt: &AttemptRecord) -> Result<(), HistoryError> {
        self.conn.execute(
            r#"
            INSERT INTO attempts
            (timestamp, level, mode, expected, recognized, outcome, passed)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                attempt.timestamp.to_rfc3339(),
                attempt.level.map(ClassLevel::get),
                attempt.mode.to_string(),
                attempt.expected,
                attempt.recognized,
                attempt.outcome,
                attempt.passed,
            ],
        )?;
        Ok(())
    }

    /// Most recent attempts first.
    pub fn recent(&self, limit: usize) -> Result<Vec<AttemptRecord>, HistoryError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT timestamp, level, mode, expected, recognized, outcome, passed
            FROM attempts
            ORDER BY id DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            let timestamp: String = row.get(0)?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        0,
                        "timestamp".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);
            let level: Option<u8> = row.get(1)?;
            let mode: String = row.get(2)?;

            Ok(AttemptRecord {
                timestamp,
                level: level.and_then(ClassLevel::new),
                mode: PracticeMode::from_str(&mode, true).unwrap_or_default(),
                expected: row.get(3)?,
                recognized: row.get(4)?,
                outcome: row.get(5)?,
                passed: row.get(6)?,
            })
        })?;

        let mut attempts = Vec::new();
        for attempt in rows {
            attempts.push(attempt?);
        }
        Ok(attempts)
    }

    /// Attempts and passes per target, hardest (lowest pass share) first.
    pub fn summary(&self) -> Result<Vec<ItemSummary>, HistoryError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT
                expected,
                COUNT(*) AS total,
                SUM(CASE WHEN passed = 1 THEN 1 ELSE 0 END) AS passes
            FROM attempts
            WHERE expected != ''
            GROUP BY expected
            ORDER BY (passes * 1.0 / total) ASC, total DESC, expected ASC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(ItemSummary {
                expected: row.get(0)?,
                attempts: row.get(1)?,
                passed: row.get(2)?,
            })
        })?;

        let mut summary = Vec::new();
        for item in rows {
            summary.push(item?);
        }
        Ok(summary)
    }

    pub fn count(&self) -> Result<u64, HistoryError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM attempts", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn clear(&self) -> Result<(), HistoryError> {
        self.conn.execute("DELETE FROM attempts", [])?;
        Ok(())
    }
}
