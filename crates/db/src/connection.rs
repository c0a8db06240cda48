use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

pub type DbPool = sqlx::SqlitePool;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a pool against `database_url`, creating the database file when it is missing.
///
/// In-memory databases are pinned to a single long-lived connection so the
/// schema cannot vanish when the pool recycles idle connections.
pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let mut pool_options = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)));

    if is_in_memory(database_url) {
        pool_options = pool_options.max_connections(1).idle_timeout(None).max_lifetime(None);
    }

    pool_options.connect_with(options).await
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

#[cfg(test)]
mod tests {
    use super::connect_with_settings;

    #[tokio::test]
    async fn in_memory_pool_answers_queries() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");

        let one: i64 = sqlx::query_scalar("SELECT 1").fetch_one(&pool).await.expect("select");

        assert_eq!(one, 1);
        pool.close().await;
    }

    #[tokio::test]
    async fn in_memory_pool_keeps_schema_across_acquires() {
        let pool = connect_with_settings("sqlite::memory:", 8, 5).await.expect("connect");

        sqlx::query("CREATE TABLE scratch (id INTEGER)").execute(&pool).await.expect("create");
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM scratch")
            .fetch_one(&pool)
            .await
            .expect("select");

        assert_eq!(count, 0);
        assert_eq!(pool.options().get_max_connections(), 1);
        pool.close().await;
    }

    #[test]
    fn in_memory_urls_are_detected() {
        assert!(super::is_in_memory("sqlite::memory:"));
        assert!(super::is_in_memory("sqlite://file.db?mode=memory"));
        assert!(!super::is_in_memory("sqlite://stockroom.db?mode=rwc"));
    }
}
