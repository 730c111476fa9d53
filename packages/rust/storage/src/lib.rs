//! libSQL storage layer for the topic corpus.
//!
//! The [`Storage`] struct wraps a local libSQL database holding the topic
//! corpus plus the user-progress and search-history audit tables. Point
//! lookups and upserts are keyed by sector; search uses a full-corpus scan
//! (acceptable for a small corpus — a documented scaling limit).

mod migrations;

use std::path::Path;

use chrono::{DateTime, Utc};
use libsql::{Connection, Database, params};
use sectorwise_shared::{Result, SearchRecord, SectorwiseError, Topic, UserProgress};
use uuid::Uuid;

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl Storage {
    /// Open or create a database at `path` and apply pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SectorwiseError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| SectorwiseError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| SectorwiseError::Storage(e.to_string()))?;

        let storage = Self { db, conn };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    SectorwiseError::Storage(format!(
                        "migration v{} failed: {e}",
                        migration.version
                    ))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    // -----------------------------------------------------------------------
    // Topic operations
    // -----------------------------------------------------------------------

    /// Insert or overwrite the topic for `sector`.
    ///
    /// First successful refresh creates the row; every later refresh
    /// overwrites content, link, and `last_update`.
    pub async fn upsert_topic(
        &self,
        sector: &str,
        content: &str,
        further_reading: Option<&str>,
        last_update: DateTime<Utc>,
    ) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO topics (sector, content, further_reading, last_update)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(sector) DO UPDATE SET
                   content = excluded.content,
                   further_reading = excluded.further_reading,
                   last_update = excluded.last_update",
                params![
                    sector,
                    content,
                    further_reading,
                    last_update.to_rfc3339()
                ],
            )
            .await
            .map_err(|e| SectorwiseError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Point lookup by sector. `None` means "unknown sector", a valid state.
    pub async fn get_topic(&self, sector: &str) -> Result<Option<Topic>> {
        let mut rows = self
            .conn
            .query(
                "SELECT sector, content, further_reading, last_update
                 FROM topics WHERE sector = ?1",
                params![sector],
            )
            .await
            .map_err(|e| SectorwiseError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_topic(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(SectorwiseError::Storage(e.to_string())),
        }
    }

    /// Full-corpus scan, in stable insertion-independent order (by sector).
    pub async fn list_topics(&self) -> Result<Vec<Topic>> {
        let mut rows = self
            .conn
            .query(
                "SELECT sector, content, further_reading, last_update
                 FROM topics ORDER BY sector",
                params![],
            )
            .await
            .map_err(|e| SectorwiseError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(row_to_topic(&row)?);
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // User progress
    // -----------------------------------------------------------------------

    /// Append a study-progress row. Returns the generated row ID.
    pub async fn record_progress(
        &self,
        sector: &str,
        performance: f64,
        notes: Option<&str>,
    ) -> Result<String> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO user_progress (id, sector, last_study_date, performance, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id.as_str(), sector, now.as_str(), performance, notes],
            )
            .await
            .map_err(|e| SectorwiseError::Storage(e.to_string()))?;
        Ok(id)
    }

    /// List progress rows, optionally filtered by sector, newest first.
    pub async fn list_progress(&self, sector: Option<&str>) -> Result<Vec<UserProgress>> {
        let mut rows = match sector {
            Some(sector) => self
                .conn
                .query(
                    "SELECT id, sector, last_study_date, performance, notes
                     FROM user_progress WHERE sector = ?1 ORDER BY last_study_date DESC",
                    params![sector],
                )
                .await,
            None => self
                .conn
                .query(
                    "SELECT id, sector, last_study_date, performance, notes
                     FROM user_progress ORDER BY last_study_date DESC",
                    params![],
                )
                .await,
        }
        .map_err(|e| SectorwiseError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(UserProgress {
                id: row
                    .get::<String>(0)
                    .map_err(|e| SectorwiseError::Storage(e.to_string()))?,
                sector: row
                    .get::<String>(1)
                    .map_err(|e| SectorwiseError::Storage(e.to_string()))?,
                last_study_date: parse_timestamp(&row, 2)?,
                performance: row
                    .get::<f64>(3)
                    .map_err(|e| SectorwiseError::Storage(e.to_string()))?,
                notes: row.get::<String>(4).ok(),
            });
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // Search history
    // -----------------------------------------------------------------------

    /// Append a search-history row. Returns the generated row ID.
    pub async fn record_search(&self, query: &str) -> Result<String> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO search_history (id, query, timestamp) VALUES (?1, ?2, ?3)",
                params![id.as_str(), query, now.as_str()],
            )
            .await
            .map_err(|e| SectorwiseError::Storage(e.to_string()))?;
        Ok(id)
    }

    /// The most recent `limit` search records, newest first.
    pub async fn recent_searches(&self, limit: u32) -> Result<Vec<SearchRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, query, timestamp FROM search_history
                 ORDER BY timestamp DESC, id DESC LIMIT ?1",
                params![limit],
            )
            .await
            .map_err(|e| SectorwiseError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(SearchRecord {
                id: row
                    .get::<String>(0)
                    .map_err(|e| SectorwiseError::Storage(e.to_string()))?,
                query: row
                    .get::<String>(1)
                    .map_err(|e| SectorwiseError::Storage(e.to_string()))?,
                timestamp: parse_timestamp(&row, 2)?,
            });
        }
        Ok(results)
    }
}

/// Convert a database row to a [`Topic`].
fn row_to_topic(row: &libsql::Row) -> Result<Topic> {
    Ok(Topic {
        sector: row
            .get::<String>(0)
            .map_err(|e| SectorwiseError::Storage(e.to_string()))?,
        content: row
            .get::<String>(1)
            .map_err(|e| SectorwiseError::Storage(e.to_string()))?,
        further_reading: row.get::<String>(2).ok(),
        last_update: parse_timestamp(row, 3)?,
    })
}

/// Parse an RFC 3339 TEXT column into a UTC timestamp.
fn parse_timestamp(row: &libsql::Row, idx: i32) -> Result<DateTime<Utc>> {
    let s: String = row
        .get(idx)
        .map_err(|e| SectorwiseError::Storage(e.to_string()))?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SectorwiseError::Storage(format!("invalid date: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    /// Create a temp file storage for testing.
    async fn test_storage() -> Storage {
        let tmp = std::env::temp_dir().join(format!("sw_test_{}.db", Uuid::now_v7()));
        Storage::open(&tmp).await.expect("open test db")
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let storage = test_storage().await;
        let version = storage.get_schema_version().await;
        assert_eq!(version, 1);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = std::env::temp_dir().join(format!("sw_test_{}.db", Uuid::now_v7()));
        let _s1 = Storage::open(&tmp).await.expect("first open");
        drop(_s1);
        let s2 = Storage::open(&tmp).await.expect("second open");
        assert_eq!(s2.get_schema_version().await, 1);
    }

    #[tokio::test]
    async fn unknown_sector_is_none() {
        let storage = test_storage().await;
        let topic = storage.get_topic("physics").await.expect("get topic");
        assert!(topic.is_none());
    }

    #[tokio::test]
    async fn upsert_creates_then_overwrites() {
        let storage = test_storage().await;
        let first = Utc::now() - Duration::days(1);

        storage
            .upsert_topic("physics", "Newton's laws...", Some("http://x"), first)
            .await
            .expect("insert topic");

        let topic = storage
            .get_topic("physics")
            .await
            .expect("get topic")
            .expect("topic exists");
        assert_eq!(topic.content, "Newton's laws...");
        assert_eq!(topic.further_reading.as_deref(), Some("http://x"));

        // Refresh overwrites content, link, and last_update.
        let second = Utc::now();
        storage
            .upsert_topic("physics", "Relativity...", None, second)
            .await
            .expect("overwrite topic");

        let topic = storage
            .get_topic("physics")
            .await
            .expect("get topic")
            .expect("topic exists");
        assert_eq!(topic.content, "Relativity...");
        assert!(topic.further_reading.is_none());
        assert!(topic.last_update > first);
    }

    #[tokio::test]
    async fn sector_key_is_case_sensitive() {
        let storage = test_storage().await;
        storage
            .upsert_topic("Physics", "capitalized", None, Utc::now())
            .await
            .unwrap();

        assert!(storage.get_topic("physics").await.unwrap().is_none());
        assert!(storage.get_topic("Physics").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn list_topics_scans_full_corpus() {
        let storage = test_storage().await;
        for sector in ["physics", "math", "chemistry"] {
            storage
                .upsert_topic(sector, &format!("{sector} content"), None, Utc::now())
                .await
                .unwrap();
        }

        let topics = storage.list_topics().await.expect("list topics");
        assert_eq!(topics.len(), 3);
        let sectors: Vec<&str> = topics.iter().map(|t| t.sector.as_str()).collect();
        assert_eq!(sectors, vec!["chemistry", "math", "physics"]);
    }

    #[tokio::test]
    async fn progress_rows() {
        let storage = test_storage().await;
        let id = storage
            .record_progress("physics", 0.8, Some("good session"))
            .await
            .expect("record progress");
        assert!(!id.is_empty());

        storage
            .record_progress("math", 0.5, None)
            .await
            .expect("record progress");

        let all = storage.list_progress(None).await.expect("list all");
        assert_eq!(all.len(), 2);

        let physics = storage
            .list_progress(Some("physics"))
            .await
            .expect("list filtered");
        assert_eq!(physics.len(), 1);
        assert_eq!(physics[0].performance, 0.8);
        assert_eq!(physics[0].notes.as_deref(), Some("good session"));
    }

    #[tokio::test]
    async fn search_history_rows() {
        let storage = test_storage().await;
        storage.record_search("gravity").await.expect("record");
        storage.record_search("entropy").await.expect("record");
        storage.record_search("momentum").await.expect("record");

        let recent = storage.recent_searches(2).await.expect("recent");
        assert_eq!(recent.len(), 2);
        // id DESC tiebreak: v7 ids keep newest-first when timestamps
        // collide at second resolution.
        assert_eq!(recent[0].query, "momentum");
        assert_eq!(recent[1].query, "entropy");
    }
}
