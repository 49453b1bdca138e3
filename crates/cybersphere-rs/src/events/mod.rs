use sqlx::SqlitePool;
use tracing::error;

use crate::models::{Event, EventKind};

/// Append-only audit trail of task lifecycle events. Writes are
/// best-effort: the log must never fail a caller's primary operation.
#[derive(Clone)]
pub struct EventLog {
    pool: SqlitePool,
}

impl EventLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn append(&self, kind: EventKind, source: &str, data: &str) {
        let result = sqlx::query("INSERT INTO events(event_type, source, data) VALUES(?, ?, ?)")
            .bind(kind.as_str())
            .bind(source)
            .bind(data)
            .execute(&self.pool)
            .await;

        if let Err(e) = result {
            error!(error = %e, event_type = kind.as_str(), "failed to log event");
        }
    }

    /// Most-recent-first; ordered by id because CURRENT_TIMESTAMP only has
    /// second granularity and same-second appends must still come back in
    /// insertion order.
    pub async fn recent(&self, limit: i64) -> anyhow::Result<Vec<Event>> {
        let rows = sqlx::query_as::<_, Event>(
            "SELECT id, event_type, source, data, timestamp FROM events \
             WHERE event_type IN ('task_execution', 'task_result', 'task_error') \
             ORDER BY id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn memory_log() -> EventLog {
        // create_pool caps the pool at one connection, which also keeps the
        // in-memory database alive across queries.
        let pool = db::create_pool("sqlite::memory:")
            .await
            .expect("in-memory pool should work");
        db::run_migrations(&pool)
            .await
            .expect("migrations should work");
        EventLog::new(pool)
    }

    #[tokio::test]
    async fn recent_returns_newest_first_within_limit() {
        let log = memory_log().await;
        log.append(EventKind::TaskExecution, "dispatcher", "first").await;
        log.append(EventKind::TaskResult, "dispatcher", "second").await;
        log.append(EventKind::TaskError, "dispatcher", "third").await;

        let events = log.recent(2).await.expect("query should work");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data, "third");
        assert_eq!(events[1].data, "second");
    }

    #[tokio::test]
    async fn recent_defaults_cover_all_rows_under_limit() {
        let log = memory_log().await;
        log.append(EventKind::TaskExecution, "dispatcher", "only").await;

        let events = log.recent(100).await.expect("query should work");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "task_execution");
        assert_eq!(events[0].source, "dispatcher");
    }

    #[tokio::test]
    async fn append_never_fails_the_caller() {
        let log = memory_log().await;
        // Closing the pool makes every insert fail; append must swallow it.
        log.append(EventKind::TaskExecution, "dispatcher", "pre-close").await;
        sqlx::query("DROP TABLE events")
            .execute(&log.pool)
            .await
            .expect("drop should work");
        log.append(EventKind::TaskError, "dispatcher", "post-drop").await;
    }
}
