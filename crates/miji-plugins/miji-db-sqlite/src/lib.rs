//! # miji-db-sqlite
//!
//! This crate implements the `miji-core` store traits over an sqlx `SqlitePool`.
//!
//! The pool is the only shared state. Every operation is one SQL statement, so
//! atomicity comes from SQLite itself and no in-process locks are taken.
//! Foreign keys are enforced per connection and the schema cascades deletes
//! from threads to posts to comments.

mod comment;
mod error;
mod post;
mod thread;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use miji_core::{Result, Store, StoreError};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

pub use comment::SqliteCommentStore;
pub use post::SqlitePostStore;
pub use thread::SqliteThreadStore;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Connection settings for [`SqliteStore::connect`].
#[derive(Debug, Clone)]
pub struct SqliteStoreOptions {
    /// Any sqlx sqlite URL, e.g. `sqlite://miji.db`. The file is created if missing.
    pub url: String,
    pub max_connections: u32,
    /// How long a call may wait for a free connection.
    pub acquire_timeout: Duration,
    /// Deadline for a single store call. SQLite's busy wait is capped below it.
    pub statement_timeout: Duration,
}

impl Default for SqliteStoreOptions {
    fn default() -> Self {
        Self {
            url: "sqlite://miji.db".to_string(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
            statement_timeout: Duration::from_secs(5),
        }
    }
}

/// SQLite's own lock wait, kept under the call deadline so a locked database
/// fails inside the statement (and is reported as `Timeout`) before `bounded`
/// has to abandon it.
fn busy_timeout(statement_timeout: Duration) -> Duration {
    statement_timeout.mul_f64(0.8)
}

/// Owns the pool and hands out the three sub-stores.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    statement_timeout: Duration,
}

impl SqliteStore {
    /// Opens (and if needed creates) the database described by `options`.
    pub async fn connect(options: &SqliteStoreOptions) -> Result<Self> {
        let connect = SqliteConnectOptions::from_str(&options.url)
            .map_err(connect_failure)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(busy_timeout(options.statement_timeout));

        let pool = SqlitePoolOptions::new()
            .max_connections(options.max_connections)
            .acquire_timeout(options.acquire_timeout)
            .connect_with(connect)
            .await
            .map_err(connect_failure)?;

        info!(max_connections = options.max_connections, "sqlite pool ready");
        Ok(Self {
            pool,
            statement_timeout: options.statement_timeout,
        })
    }

    /// A private in-memory database, mainly for tests.
    ///
    /// The database lives only as long as a connection to it is open, so the
    /// pool is pinned to one connection that never expires.
    pub async fn in_memory() -> Result<Self> {
        let defaults = SqliteStoreOptions::default();
        let connect = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(connect_failure)?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .acquire_timeout(defaults.acquire_timeout)
            .connect_with(connect)
            .await
            .map_err(connect_failure)?;

        Ok(Self {
            pool,
            statement_timeout: defaults.statement_timeout,
        })
    }

    /// Applies the embedded migrations. Safe to run on every start.
    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|err| StoreError::Storage {
                operation: "store.migrate",
                message: err.to_string(),
            })?;
        info!("database migrations applied");
        Ok(())
    }

    pub fn threads(&self) -> SqliteThreadStore {
        SqliteThreadStore {
            pool: self.pool.clone(),
            timeout: self.statement_timeout,
        }
    }

    pub fn posts(&self) -> SqlitePostStore {
        SqlitePostStore {
            pool: self.pool.clone(),
            timeout: self.statement_timeout,
        }
    }

    pub fn comments(&self) -> SqliteCommentStore {
        SqliteCommentStore {
            pool: self.pool.clone(),
            timeout: self.statement_timeout,
        }
    }

    /// The unified store over this pool, ready to hand to request handlers.
    pub fn store(&self) -> Store {
        Store::new(
            Arc::new(self.threads()),
            Arc::new(self.posts()),
            Arc::new(self.comments()),
        )
    }

    /// The underlying pool, for callers that need raw access (e.g. tests).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Waits for checked-out connections and closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn connect_failure(err: sqlx::Error) -> StoreError {
    StoreError::Storage {
        operation: "store.connect",
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miji_core::{Post, PostStore, Thread, ThreadStore};

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.migrate().await.unwrap();
        store.migrate().await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' \
             AND name IN ('threads', 'posts', 'comments') ORDER BY name",
        )
        .fetch_all(store.pool())
        .await
        .unwrap();
        assert_eq!(tables, ["comments", "posts", "threads"]);
    }

    #[test]
    fn busy_wait_ends_before_the_call_deadline() {
        let deadline = Duration::from_millis(500);
        assert!(busy_timeout(deadline) < deadline);
        assert!(busy_timeout(deadline) > Duration::ZERO);
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let store = SqliteStore::in_memory().await.unwrap();
        let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn unified_store_shares_one_database() {
        let sqlite = SqliteStore::in_memory().await.unwrap();
        sqlite.migrate().await.unwrap();
        let store = sqlite.store();

        let thread = store.create_thread(&Thread::new("Go", "lang")).await.unwrap();
        let post = store.create_post(&Post::new(thread.id, "hi", "body")).await.unwrap();

        assert_eq!(sqlite.posts().get_post(post.id).await.unwrap(), post);
        assert_eq!(sqlite.threads().list_threads().await.unwrap(), vec![thread]);
    }

    #[tokio::test]
    async fn bad_url_fails_to_connect() {
        let options = SqliteStoreOptions {
            url: "sqlite:///no-such-dir/miji/miji.db".into(),
            acquire_timeout: Duration::from_secs(1),
            ..SqliteStoreOptions::default()
        };
        let err = SqliteStore::connect(&options).await.err().unwrap();
        assert!(matches!(err, StoreError::Storage { operation: "store.connect", .. }));
    }
}
