//! SQLite `PostStore` implementation.
//!
//! Vote counts are only ever changed by a single `UPDATE ... SET votes = votes + ?`
//! (or the `COALESCE` in `update_post`), so concurrent votes on one post are
//! serialized by SQLite's write lock and none are lost.

use std::time::Duration;

use async_trait::async_trait;
use miji_core::{Entity, Post, PostStore, PostUpdate, Result, StoreError, VoteDirection};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{bounded, classify};

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    thread_id: Uuid,
    title: String,
    content: String,
    votes: i64,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            thread_id: row.thread_id,
            title: row.title,
            content: row.content,
            votes: row.votes,
        }
    }
}

fn not_found(id: Uuid) -> StoreError {
    StoreError::NotFound {
        entity: Entity::Post,
        id,
    }
}

/// SQLx-backed post store. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct SqlitePostStore {
    pub(crate) pool: SqlitePool,
    pub(crate) timeout: Duration,
}

#[async_trait]
impl PostStore for SqlitePostStore {
    async fn get_post(&self, id: Uuid) -> Result<Post> {
        bounded(self.timeout, "post.get", async {
            let row: Option<PostRow> = sqlx::query_as(
                "SELECT id, thread_id, title, content, votes FROM posts WHERE id = ?",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify("post.get", Entity::Post, id))?;

            row.map(Post::from).ok_or_else(|| not_found(id))
        })
        .await
    }

    async fn list_posts_by_thread(&self, thread_id: Uuid) -> Result<Vec<Post>> {
        bounded(self.timeout, "post.list_by_thread", async {
            let rows: Vec<PostRow> = sqlx::query_as(
                "SELECT id, thread_id, title, content, votes FROM posts \
                 WHERE thread_id = ? ORDER BY rowid",
            )
            .bind(thread_id)
            .fetch_all(&self.pool)
            .await
            .map_err(classify("post.list_by_thread", Entity::Thread, thread_id))?;

            debug!(thread_id = %thread_id, count = rows.len(), "listed posts");
            Ok(rows.into_iter().map(Post::from).collect())
        })
        .await
    }

    async fn create_post(&self, post: &Post) -> Result<Post> {
        bounded(self.timeout, "post.create", async {
            let row: PostRow = sqlx::query_as(
                "INSERT INTO posts (id, thread_id, title, content, votes) VALUES (?, ?, ?, ?, ?) \
                 RETURNING id, thread_id, title, content, votes",
            )
            .bind(post.id)
            .bind(post.thread_id)
            .bind(&post.title)
            .bind(&post.content)
            .bind(post.votes)
            .fetch_one(&self.pool)
            .await
            .map_err(classify("post.create", Entity::Post, post.id))?;

            debug!(post_id = %row.id, thread_id = %row.thread_id, "post created");
            Ok(row.into())
        })
        .await
    }

    async fn update_post(&self, update: &PostUpdate) -> Result<Post> {
        bounded(self.timeout, "post.update", async {
            let row: Option<PostRow> = sqlx::query_as(
                "UPDATE posts SET thread_id = ?, title = ?, content = ?, votes = COALESCE(?, votes) \
                 WHERE id = ? RETURNING id, thread_id, title, content, votes",
            )
            .bind(update.thread_id)
            .bind(&update.title)
            .bind(&update.content)
            .bind(update.votes)
            .bind(update.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify("post.update", Entity::Post, update.id))?;

            row.map(Post::from).ok_or_else(|| not_found(update.id))
        })
        .await
    }

    async fn delete_post(&self, id: Uuid) -> Result<()> {
        bounded(self.timeout, "post.delete", async {
            // Comments go with it (ON DELETE CASCADE).
            let result = sqlx::query("DELETE FROM posts WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(classify("post.delete", Entity::Post, id))?;

            if result.rows_affected() == 0 {
                return Err(not_found(id));
            }

            debug!(post_id = %id, "post deleted");
            Ok(())
        })
        .await
    }

    async fn vote_post(&self, id: Uuid, direction: VoteDirection) -> Result<Post> {
        bounded(self.timeout, "post.vote", async {
            let row: Option<PostRow> = sqlx::query_as(
                "UPDATE posts SET votes = votes + ? WHERE id = ? \
                 RETURNING id, thread_id, title, content, votes",
            )
            .bind(direction.delta())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify("post.vote", Entity::Post, id))?;

            let post = row.map(Post::from).ok_or_else(|| not_found(id))?;
            debug!(post_id = %id, ?direction, votes = post.votes, "post voted");
            Ok(post)
        })
        .await
    }
}
