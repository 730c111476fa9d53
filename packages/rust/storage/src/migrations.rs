//! SQL migration definitions for the sectorwise database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a set of SQL statements executed as a batch.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: topics, user_progress, search_history",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Topic corpus, one row per sector. The sector name is the
-- case-sensitive identity; rows are overwritten on refresh and
-- never deleted by the service.
CREATE TABLE IF NOT EXISTS topics (
    sector          TEXT PRIMARY KEY,
    content         TEXT NOT NULL,
    further_reading TEXT,
    last_update     TEXT NOT NULL
);

-- Per-sector study audit rows
CREATE TABLE IF NOT EXISTS user_progress (
    id              TEXT PRIMARY KEY,
    sector          TEXT NOT NULL,
    last_study_date TEXT NOT NULL,
    performance     REAL NOT NULL,
    notes           TEXT
);

CREATE INDEX IF NOT EXISTS idx_user_progress_sector ON user_progress(sector);

-- Search audit rows
CREATE TABLE IF NOT EXISTS search_history (
    id        TEXT PRIMARY KEY,
    query     TEXT NOT NULL,
    timestamp TEXT NOT NULL
);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
