//! # Core Traits (Ports)
//!
//! Any storage plugin must implement these traits to back a [`crate::Store`].
//! Implementations are shared across request tasks, so every method takes
//! `&self` and must be safe to call concurrently without external locking.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Comment, CommentUpdate, Post, PostUpdate, Thread, VoteDirection};

/// Persistence contract for threads.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ThreadStore: Send + Sync {
    async fn get_thread(&self, id: Uuid) -> Result<Thread>;
    /// All threads in insertion order.
    async fn list_threads(&self) -> Result<Vec<Thread>>;
    /// Inserts with the caller's id and returns the row as stored.
    async fn create_thread(&self, thread: &Thread) -> Result<Thread>;
    /// Overwrites title and description.
    async fn update_thread(&self, thread: &Thread) -> Result<Thread>;
    /// Removes the thread together with its posts and their comments.
    async fn delete_thread(&self, id: Uuid) -> Result<()>;
}

/// Persistence contract for posts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn get_post(&self, id: Uuid) -> Result<Post>;
    /// Posts of one thread in insertion order. Empty if the thread does not exist.
    async fn list_posts_by_thread(&self, thread_id: Uuid) -> Result<Vec<Post>>;
    async fn create_post(&self, post: &Post) -> Result<Post>;
    async fn update_post(&self, update: &PostUpdate) -> Result<Post>;
    /// Removes the post together with its comments.
    async fn delete_post(&self, id: Uuid) -> Result<()>;
    /// Applies the vote as a single atomic increment and returns the updated post.
    async fn vote_post(&self, id: Uuid, direction: VoteDirection) -> Result<Post>;
}

/// Persistence contract for comments.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn get_comment(&self, id: Uuid) -> Result<Comment>;
    async fn list_comments_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>>;
    async fn create_comment(&self, comment: &Comment) -> Result<Comment>;
    async fn update_comment(&self, update: &CommentUpdate) -> Result<Comment>;
    async fn delete_comment(&self, id: Uuid) -> Result<()>;
    async fn vote_comment(&self, id: Uuid, direction: VoteDirection) -> Result<Comment>;
}
