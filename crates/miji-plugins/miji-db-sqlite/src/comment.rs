//! SQLite `CommentStore` implementation.

use std::time::Duration;

use async_trait::async_trait;
use miji_core::{
    Comment, CommentStore, CommentUpdate, Entity, Result, StoreError, VoteDirection,
};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{bounded, classify};

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    post_id: Uuid,
    content: String,
    votes: i64,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            post_id: row.post_id,
            content: row.content,
            votes: row.votes,
        }
    }
}

fn not_found(id: Uuid) -> StoreError {
    StoreError::NotFound {
        entity: Entity::Comment,
        id,
    }
}

/// SQLx-backed comment store. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct SqliteCommentStore {
    pub(crate) pool: SqlitePool,
    pub(crate) timeout: Duration,
}

#[async_trait]
impl CommentStore for SqliteCommentStore {
    async fn get_comment(&self, id: Uuid) -> Result<Comment> {
        bounded(self.timeout, "comment.get", async {
            let row: Option<CommentRow> =
                sqlx::query_as("SELECT id, post_id, content, votes FROM comments WHERE id = ?")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(classify("comment.get", Entity::Comment, id))?;

            row.map(Comment::from).ok_or_else(|| not_found(id))
        })
        .await
    }

    async fn list_comments_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        bounded(self.timeout, "comment.list_by_post", async {
            let rows: Vec<CommentRow> = sqlx::query_as(
                "SELECT id, post_id, content, votes FROM comments WHERE post_id = ? ORDER BY rowid",
            )
            .bind(post_id)
            .fetch_all(&self.pool)
            .await
            .map_err(classify("comment.list_by_post", Entity::Post, post_id))?;

            Ok(rows.into_iter().map(Comment::from).collect())
        })
        .await
    }

    async fn create_comment(&self, comment: &Comment) -> Result<Comment> {
        bounded(self.timeout, "comment.create", async {
            let row: CommentRow = sqlx::query_as(
                "INSERT INTO comments (id, post_id, content, votes) VALUES (?, ?, ?, ?) \
                 RETURNING id, post_id, content, votes",
            )
            .bind(comment.id)
            .bind(comment.post_id)
            .bind(&comment.content)
            .bind(comment.votes)
            .fetch_one(&self.pool)
            .await
            .map_err(classify("comment.create", Entity::Comment, comment.id))?;

            debug!(comment_id = %row.id, post_id = %row.post_id, "comment created");
            Ok(row.into())
        })
        .await
    }

    async fn update_comment(&self, update: &CommentUpdate) -> Result<Comment> {
        bounded(self.timeout, "comment.update", async {
            let row: Option<CommentRow> = sqlx::query_as(
                "UPDATE comments SET post_id = ?, content = ?, votes = COALESCE(?, votes) \
                 WHERE id = ? RETURNING id, post_id, content, votes",
            )
            .bind(update.post_id)
            .bind(&update.content)
            .bind(update.votes)
            .bind(update.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify("comment.update", Entity::Comment, update.id))?;

            row.map(Comment::from).ok_or_else(|| not_found(update.id))
        })
        .await
    }

    async fn delete_comment(&self, id: Uuid) -> Result<()> {
        bounded(self.timeout, "comment.delete", async {
            let result = sqlx::query("DELETE FROM comments WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(classify("comment.delete", Entity::Comment, id))?;

            if result.rows_affected() == 0 {
                return Err(not_found(id));
            }
            Ok(())
        })
        .await
    }

    async fn vote_comment(&self, id: Uuid, direction: VoteDirection) -> Result<Comment> {
        bounded(self.timeout, "comment.vote", async {
            let row: Option<CommentRow> = sqlx::query_as(
                "UPDATE comments SET votes = votes + ? WHERE id = ? \
                 RETURNING id, post_id, content, votes",
            )
            .bind(direction.delta())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify("comment.vote", Entity::Comment, id))?;

            row.map(Comment::from).ok_or_else(|| not_found(id))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SqliteStore;
    use miji_core::{Post, PostStore, Thread, ThreadStore};

    async fn setup() -> (SqliteStore, Post) {
        let store = SqliteStore::in_memory().await.expect("in-memory store");
        store.migrate().await.expect("migrations");
        let thread = store
            .threads()
            .create_thread(&Thread::new("Go", "lang"))
            .await
            .unwrap();
        let post = store
            .posts()
            .create_post(&Post::new(thread.id, "hi", "body"))
            .await
            .unwrap();
        (store, post)
    }

    #[tokio::test]
    async fn create_get_and_list_comments() {
        let (store, post) = setup().await;
        let comments = store.comments();

        let first = comments.create_comment(&Comment::new(post.id, "first")).await.unwrap();
        let second = comments.create_comment(&Comment::new(post.id, "second")).await.unwrap();

        assert_eq!(comments.get_comment(first.id).await.unwrap(), first);
        assert_eq!(
            comments.list_comments_by_post(post.id).await.unwrap(),
            vec![first, second]
        );
    }

    #[tokio::test]
    async fn comment_on_missing_post_violates_constraint() {
        let (store, _) = setup().await;

        let err = store
            .comments()
            .create_comment(&Comment::new(Uuid::now_v7(), "lost"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::ConstraintViolation { entity: Entity::Comment, parent: Entity::Post, .. }
        ));
    }

    #[tokio::test]
    async fn duplicate_comment_id_is_a_conflict() {
        let (store, post) = setup().await;
        let comments = store.comments();
        let comment = comments.create_comment(&Comment::new(post.id, "first")).await.unwrap();

        assert!(comments.create_comment(&comment).await.unwrap_err().is_conflict());
    }

    #[tokio::test]
    async fn update_missing_comment_is_not_found() {
        let (store, post) = setup().await;
        let ghost = Comment::new(post.id, "ghost");

        let err = store.comments().update_comment(&ghost.into()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: Entity::Comment, .. }));
    }

    #[tokio::test]
    async fn update_comment_to_missing_post_violates_constraint() {
        let (store, post) = setup().await;
        let comments = store.comments();
        let comment = comments.create_comment(&Comment::new(post.id, "first")).await.unwrap();

        let mut update = CommentUpdate::from(comment.clone());
        update.post_id = Uuid::now_v7();
        let err = comments.update_comment(&update).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::ConstraintViolation { entity: Entity::Comment, parent: Entity::Post, .. }
        ));
        assert_eq!(comments.get_comment(comment.id).await.unwrap(), comment);
    }

    #[tokio::test]
    async fn update_rewrites_content_and_optionally_votes() {
        let (store, post) = setup().await;
        let comments = store.comments();
        let comment = comments.create_comment(&Comment::new(post.id, "first")).await.unwrap();
        comments.vote_comment(comment.id, VoteDirection::Up).await.unwrap();

        let edited = comments
            .update_comment(&CommentUpdate {
                id: comment.id,
                post_id: post.id,
                content: "edited".into(),
                votes: None,
            })
            .await
            .unwrap();
        assert_eq!(edited.content, "edited");
        assert_eq!(edited.votes, 1);

        let reset = comments
            .update_comment(&CommentUpdate { votes: Some(0), ..CommentUpdate::from(edited) })
            .await
            .unwrap();
        assert_eq!(reset.votes, 0);
    }

    #[tokio::test]
    async fn vote_and_delete() {
        let (store, post) = setup().await;
        let comments = store.comments();
        let comment = comments.create_comment(&Comment::new(post.id, "first")).await.unwrap();

        assert_eq!(comments.vote_comment(comment.id, VoteDirection::Down).await.unwrap().votes, -1);

        comments.delete_comment(comment.id).await.unwrap();
        assert!(comments.delete_comment(comment.id).await.unwrap_err().is_not_found());
        assert!(comments
            .vote_comment(comment.id, VoteDirection::Up)
            .await
            .unwrap_err()
            .is_not_found());
    }
}
