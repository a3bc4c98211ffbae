//! SQLite journal backend
//!
//! One row per persistent comment, identity as primary key. The database is
//! tiny (comments number in the hundreds, not millions), so the tuning here
//! is about surviving concurrent access from the sweep and command paths,
//! not about throughput.

use std::path::Path;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info, instrument};

use super::backend::CommentJournal;
use super::error::{JournalError, JournalResult};
use super::schema::CommentRow;
use crate::comment::{Comment, CommentId};

/// SQLite-backed comment journal
pub struct SqliteJournal {
    pool: Pool<Sqlite>,
    db_path: String,
}

impl SqliteJournal {
    /// Open (or create) the journal database and run migrations
    #[instrument(skip_all)]
    pub async fn new(db_path: impl AsRef<Path>) -> JournalResult<Self> {
        let db_path_str = db_path.as_ref().to_string_lossy().to_string();

        info!("opening comment journal at: {}", db_path_str);

        let options = SqliteConnectOptions::new()
            .filename(&db_path_str)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| JournalError::ConnectionFailed(e.to_string()))?;

        debug!("running journal migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self {
            pool,
            db_path: db_path_str,
        })
    }
}

#[async_trait]
impl CommentJournal for SqliteJournal {
    #[instrument(skip(self, comment), fields(id = comment.id()))]
    async fn record(&self, comment: &Comment) -> JournalResult<()> {
        let row = CommentRow::from_comment(comment)?;

        sqlx::query(
            r#"
            INSERT INTO comments (
                id, author, text, entry_type, entry_time,
                is_service, host, service, expire_time, persistent, source
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                author = excluded.author,
                text = excluded.text,
                entry_type = excluded.entry_type,
                entry_time = excluded.entry_time,
                is_service = excluded.is_service,
                host = excluded.host,
                service = excluded.service,
                expire_time = excluded.expire_time,
                persistent = excluded.persistent,
                source = excluded.source
            "#,
        )
        .bind(row.id)
        .bind(&row.author)
        .bind(&row.text)
        .bind(&row.entry_type)
        .bind(row.entry_time)
        .bind(row.is_service)
        .bind(&row.host)
        .bind(&row.service)
        .bind(row.expire_time)
        .bind(row.persistent)
        .bind(&row.source)
        .execute(&self.pool)
        .await?;

        debug!("journaled comment");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn forget(&self, id: CommentId) -> JournalResult<()> {
        // Identities above the column range can never be in the journal
        let Ok(id) = i64::try_from(id) else {
            return Ok(());
        };

        sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn load_all(&self) -> JournalResult<Vec<Comment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, author, text, entry_type, entry_time,
                   is_service, host, service, expire_time, persistent, source
            FROM comments
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let comments: JournalResult<Vec<Comment>> = rows
            .into_iter()
            .map(|row| {
                CommentRow {
                    id: row.get("id"),
                    author: row.get("author"),
                    text: row.get("text"),
                    entry_type: row.get("entry_type"),
                    entry_time: row.get("entry_time"),
                    is_service: row.get("is_service"),
                    host: row.get("host"),
                    service: row.get("service"),
                    expire_time: row.get("expire_time"),
                    persistent: row.get("persistent"),
                    source: row.get("source"),
                }
                .into_comment()
            })
            .collect();

        let comments = comments?;
        debug!("loaded {} journaled comments", comments.len());
        Ok(comments)
    }

    #[instrument(skip(self))]
    async fn stats(&self) -> JournalResult<String> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM comments")
            .fetch_one(&self.pool)
            .await?;

        let file_size = std::fs::metadata(&self.db_path)
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(format!(
            "SQLite journal: {} comments, {:.1} KB on disk",
            row.0,
            file_size as f64 / 1000.0
        ))
    }

    async fn close(&self) -> JournalResult<()> {
        info!("closing comment journal");
        self.pool.close().await;
        Ok(())
    }
}
