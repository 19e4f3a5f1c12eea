//! # Unified Store
//!
//! One capability surface over the three sub-stores, handed to the
//! presentation layer so handlers depend on a single value.
//! Each method forwards to exactly one sub-store call and adds no logic.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Comment, CommentUpdate, Post, PostUpdate, Thread, VoteDirection};
use crate::traits::{CommentStore, PostStore, ThreadStore};

#[derive(Clone)]
pub struct Store {
    threads: Arc<dyn ThreadStore>,
    posts: Arc<dyn PostStore>,
    comments: Arc<dyn CommentStore>,
}

impl Store {
    pub fn new(
        threads: Arc<dyn ThreadStore>,
        posts: Arc<dyn PostStore>,
        comments: Arc<dyn CommentStore>,
    ) -> Self {
        Self {
            threads,
            posts,
            comments,
        }
    }
}

#[async_trait]
impl ThreadStore for Store {
    async fn get_thread(&self, id: Uuid) -> Result<Thread> {
        self.threads.get_thread(id).await
    }

    async fn list_threads(&self) -> Result<Vec<Thread>> {
        self.threads.list_threads().await
    }

    async fn create_thread(&self, thread: &Thread) -> Result<Thread> {
        self.threads.create_thread(thread).await
    }

    async fn update_thread(&self, thread: &Thread) -> Result<Thread> {
        self.threads.update_thread(thread).await
    }

    async fn delete_thread(&self, id: Uuid) -> Result<()> {
        self.threads.delete_thread(id).await
    }
}

#[async_trait]
impl PostStore for Store {
    async fn get_post(&self, id: Uuid) -> Result<Post> {
        self.posts.get_post(id).await
    }

    async fn list_posts_by_thread(&self, thread_id: Uuid) -> Result<Vec<Post>> {
        self.posts.list_posts_by_thread(thread_id).await
    }

    async fn create_post(&self, post: &Post) -> Result<Post> {
        self.posts.create_post(post).await
    }

    async fn update_post(&self, update: &PostUpdate) -> Result<Post> {
        self.posts.update_post(update).await
    }

    async fn delete_post(&self, id: Uuid) -> Result<()> {
        self.posts.delete_post(id).await
    }

    async fn vote_post(&self, id: Uuid, direction: VoteDirection) -> Result<Post> {
        self.posts.vote_post(id, direction).await
    }
}

#[async_trait]
impl CommentStore for Store {
    async fn get_comment(&self, id: Uuid) -> Result<Comment> {
        self.comments.get_comment(id).await
    }

    async fn list_comments_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        self.comments.list_comments_by_post(post_id).await
    }

    async fn create_comment(&self, comment: &Comment) -> Result<Comment> {
        self.comments.create_comment(comment).await
    }

    async fn update_comment(&self, update: &CommentUpdate) -> Result<Comment> {
        self.comments.update_comment(update).await
    }

    async fn delete_comment(&self, id: Uuid) -> Result<()> {
        self.comments.delete_comment(id).await
    }

    async fn vote_comment(&self, id: Uuid, direction: VoteDirection) -> Result<Comment> {
        self.comments.vote_comment(id, direction).await
    }
}
