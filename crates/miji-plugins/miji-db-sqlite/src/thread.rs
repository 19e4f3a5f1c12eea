//! SQLite `ThreadStore` implementation.

use std::time::Duration;

use async_trait::async_trait;
use miji_core::{Entity, Result, StoreError, Thread, ThreadStore};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{bounded, classify, storage};

#[derive(sqlx::FromRow)]
struct ThreadRow {
    id: Uuid,
    title: String,
    description: String,
}

impl From<ThreadRow> for Thread {
    fn from(row: ThreadRow) -> Self {
        Thread {
            id: row.id,
            title: row.title,
            description: row.description,
        }
    }
}

/// SQLx-backed thread store. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct SqliteThreadStore {
    pub(crate) pool: SqlitePool,
    pub(crate) timeout: Duration,
}

#[async_trait]
impl ThreadStore for SqliteThreadStore {
    async fn get_thread(&self, id: Uuid) -> Result<Thread> {
        bounded(self.timeout, "thread.get", async {
            let row: Option<ThreadRow> =
                sqlx::query_as("SELECT id, title, description FROM threads WHERE id = ?")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(classify("thread.get", Entity::Thread, id))?;

            row.map(Thread::from).ok_or(StoreError::NotFound {
                entity: Entity::Thread,
                id,
            })
        })
        .await
    }

    async fn list_threads(&self) -> Result<Vec<Thread>> {
        bounded(self.timeout, "thread.list", async {
            let rows: Vec<ThreadRow> =
                sqlx::query_as("SELECT id, title, description FROM threads ORDER BY rowid")
                    .fetch_all(&self.pool)
                    .await
                    .map_err(storage("thread.list"))?;

            debug!(count = rows.len(), "listed threads");
            Ok(rows.into_iter().map(Thread::from).collect())
        })
        .await
    }

    async fn create_thread(&self, thread: &Thread) -> Result<Thread> {
        thread.validate()?;

        bounded(self.timeout, "thread.create", async {
            let row: ThreadRow = sqlx::query_as(
                "INSERT INTO threads (id, title, description) VALUES (?, ?, ?) \
                 RETURNING id, title, description",
            )
            .bind(thread.id)
            .bind(&thread.title)
            .bind(&thread.description)
            .fetch_one(&self.pool)
            .await
            .map_err(classify("thread.create", Entity::Thread, thread.id))?;

            debug!(thread_id = %row.id, "thread created");
            Ok(row.into())
        })
        .await
    }

    async fn update_thread(&self, thread: &Thread) -> Result<Thread> {
        thread.validate()?;

        bounded(self.timeout, "thread.update", async {
            let row: Option<ThreadRow> = sqlx::query_as(
                "UPDATE threads SET title = ?, description = ? WHERE id = ? \
                 RETURNING id, title, description",
            )
            .bind(&thread.title)
            .bind(&thread.description)
            .bind(thread.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify("thread.update", Entity::Thread, thread.id))?;

            row.map(Thread::from).ok_or(StoreError::NotFound {
                entity: Entity::Thread,
                id: thread.id,
            })
        })
        .await
    }

    async fn delete_thread(&self, id: Uuid) -> Result<()> {
        bounded(self.timeout, "thread.delete", async {
            // Posts and their comments go with it (ON DELETE CASCADE).
            let result = sqlx::query("DELETE FROM threads WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(classify("thread.delete", Entity::Thread, id))?;

            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound {
                    entity: Entity::Thread,
                    id,
                });
            }

            debug!(thread_id = %id, "thread deleted");
            Ok(())
        })
        .await
    }
}
