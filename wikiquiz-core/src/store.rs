//! Quiz persistence.
//!
//! SQLite-backed storage of generated quizzes. Rows are written once per
//! generation and never updated.

use crate::model::{HistoryItem, NewQuiz, StoredQuiz};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{FromRow, SqlitePool};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Errors related to quiz storage
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to initialize database: {0}")]
    Initialization(String),

    #[error("Invalid stored timestamp '{value}': {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

#[derive(Debug, FromRow)]
struct QuizRow {
    id: i64,
    url: String,
    title: Option<String>,
    date_generated: String,
    scraped_content: Option<String>,
    full_quiz_data: String,
}

#[derive(Debug, FromRow)]
struct HistoryRow {
    id: i64,
    url: String,
    title: Option<String>,
    date_generated: String,
}

fn parse_timestamp(value: String) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| StoreError::Timestamp { value, source })
}

impl TryFrom<QuizRow> for StoredQuiz {
    type Error = StoreError;

    fn try_from(row: QuizRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            url: row.url,
            title: row.title,
            created_at: parse_timestamp(row.date_generated)?,
            scraped_content: row.scraped_content,
            quiz_json: row.full_quiz_data,
        })
    }
}

impl TryFrom<HistoryRow> for HistoryItem {
    type Error = StoreError;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            url: row.url,
            title: row.title,
            date_generated: parse_timestamp(row.date_generated)?,
        })
    }
}

/// Store of generated quizzes
#[derive(Clone)]
pub struct QuizStore {
    pool: SqlitePool,
}

impl QuizStore {
    /// Open (or create) the database at the given path
    #[instrument(skip_all, fields(path = %db_path.display()))]
    pub async fn open(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Initialization(format!("Failed to create directory: {}", e))
            })?;
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        debug!("Connecting to SQLite database at: {}", db_path.display());
        let pool = SqlitePool::connect(&db_url).await?;

        Self::init_schema(&pool).await?;
        info!("Quiz store ready at {}", db_path.display());

        Ok(Self { pool })
    }

    /// Open a private in-memory database
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        // Every connection to :memory: is its own database, so keep exactly one
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::init_schema(&pool).await?;
        Ok(Self { pool })
    }

    async fn init_schema(pool: &SqlitePool) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS quizzes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT NOT NULL,
                title TEXT,
                date_generated TEXT NOT NULL,
                scraped_content TEXT,
                full_quiz_data TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_quizzes_date_generated
            ON quizzes(date_generated)
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Persist a quiz, stamping it with the current time
    #[instrument(skip(self, quiz), fields(url = %quiz.url))]
    pub async fn insert(&self, quiz: NewQuiz) -> Result<StoredQuiz, StoreError> {
        // Fixed-width UTC timestamps sort lexicographically in time order
        let created_at = Utc::now();
        let timestamp = created_at.to_rfc3339_opts(SecondsFormat::Micros, true);

        let result = sqlx::query(
            r#"
            INSERT INTO quizzes
                (url, title, date_generated, scraped_content, full_quiz_data)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&quiz.url)
        .bind(&quiz.title)
        .bind(&timestamp)
        .bind(&quiz.scraped_content)
        .bind(&quiz.quiz_json)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!("Stored quiz with id: {}", id);

        Ok(StoredQuiz {
            id,
            url: quiz.url,
            title: quiz.title,
            created_at: parse_timestamp(timestamp)?,
            scraped_content: quiz.scraped_content,
            quiz_json: quiz.quiz_json,
        })
    }

    /// All stored quizzes, newest first
    pub async fn list(&self) -> Result<Vec<HistoryItem>, StoreError> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT id, url, title, date_generated
            FROM quizzes
            ORDER BY date_generated DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(HistoryItem::try_from).collect()
    }

    /// Look up a quiz by id
    pub async fn get(&self, id: i64) -> Result<Option<StoredQuiz>, StoreError> {
        let row = sqlx::query_as::<_, QuizRow>(
            r#"
            SELECT id, url, title, date_generated, scraped_content, full_quiz_data
            FROM quizzes
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(StoredQuiz::try_from).transpose()
    }

    /// Check the database answers queries
    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    #[cfg(test)]
    async fn insert_at(&self, url: &str, timestamp: &str) -> Result<i64, StoreError> {
        let result = sqlx::query(
            "INSERT INTO quizzes (url, title, date_generated, full_quiz_data) VALUES (?, NULL, ?, '{}')",
        )
        .bind(url)
        .bind(timestamp)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn new_quiz(url: &str) -> NewQuiz {
        NewQuiz {
            url: url.to_string(),
            title: Some("Dog".to_string()),
            scraped_content: Some("Dogs are mammals.".to_string()),
            quiz_json: r#"{"title":"Dog","summary":"s","questions":[]}"#.to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = QuizStore::open_in_memory().await.unwrap();

        let stored = store
            .insert(new_quiz("https://en.wikipedia.org/wiki/Dog"))
            .await
            .unwrap();
        assert!(stored.id > 0);

        let fetched = store.get(stored.id).await.unwrap().unwrap();
        assert_eq!(fetched, stored);
        assert_eq!(fetched.quiz().unwrap().summary, "s");

        assert!(store.get(stored.id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = QuizStore::open_in_memory().await.unwrap();

        let old = store.insert_at("old", "2024-01-01T00:00:00.000000Z").await.unwrap();
        let tie_a = store.insert_at("tie-a", "2024-06-01T00:00:00.000000Z").await.unwrap();
        let tie_b = store.insert_at("tie-b", "2024-06-01T00:00:00.000000Z").await.unwrap();
        let fresh = store.insert(new_quiz("fresh")).await.unwrap().id;

        let ids: Vec<i64> = store.list().await.unwrap().iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![fresh, tie_b, tie_a, old]);
    }

    #[tokio::test]
    async fn test_bad_timestamp_is_reported() {
        let store = QuizStore::open_in_memory().await.unwrap();
        let id = store.insert_at("x", "yesterday").await.unwrap();

        assert!(matches!(
            store.get(id).await,
            Err(StoreError::Timestamp { .. })
        ));
    }

    #[tokio::test]
    async fn test_open_on_disk_persists() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("quizzes.db");

        let id = {
            let store = QuizStore::open(&db_path).await.unwrap();
            assert!(store.ping().await);
            store.insert(new_quiz("https://en.wikipedia.org/wiki/Cat")).await.unwrap().id
        };

        let reopened = QuizStore::open(&db_path).await.unwrap();
        let history = reopened.list().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, id);
        assert_eq!(history[0].title.as_deref(), Some("Dog"));
    }
}
