//! # Domain Models
//!
//! These structs represent the core entities of the forum.
//! Identifiers are UUID v7, assigned by the caller before the write so the
//! id is known (e.g. for a redirect target) before the store confirms it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, StoreError};

/// A top-level discussion topic. Owns its Posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: Uuid,
    pub title: String,
    /// May be empty.
    pub description: String,
}

impl Thread {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            title: title.into(),
            description: description.into(),
        }
    }

    /// Rejects a blank title before anything is written.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(StoreError::Validation(format!(
                "thread {} must have a non-empty title",
                self.id
            )));
        }
        Ok(())
    }
}

/// A submission within a thread. Votable, owns its Comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub title: String,
    pub content: String,
    pub votes: i64,
}

impl Post {
    pub fn new(thread_id: Uuid, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            thread_id,
            title: title.into(),
            content: content.into(),
            votes: 0,
        }
    }
}

/// A reply to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub content: String,
    pub votes: i64,
}

impl Comment {
    pub fn new(post_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            post_id,
            content: content.into(),
            votes: 0,
        }
    }
}

/// Payload for `PostStore::update_post`.
///
/// `votes: None` keeps the stored counter; only an explicit `Some` overwrites it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostUpdate {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub title: String,
    pub content: String,
    pub votes: Option<i64>,
}

impl From<Post> for PostUpdate {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            thread_id: post.thread_id,
            title: post.title,
            content: post.content,
            votes: Some(post.votes),
        }
    }
}

/// Payload for `CommentStore::update_comment`. Same `votes` rule as [`PostUpdate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentUpdate {
    pub id: Uuid,
    pub post_id: Uuid,
    pub content: String,
    pub votes: Option<i64>,
}

impl From<Comment> for CommentUpdate {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            content: comment.content,
            votes: Some(comment.votes),
        }
    }
}

/// Direction of a vote as submitted by a client.
///
/// Anything other than `"up"` or `"down"` parses to `Abstain`, which is a
/// no-op rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
    Abstain,
}

impl VoteDirection {
    pub fn delta(self) -> i64 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
            VoteDirection::Abstain => 0,
        }
    }
}

impl From<&str> for VoteDirection {
    fn from(raw: &str) -> Self {
        match raw {
            "up" => VoteDirection::Up,
            "down" => VoteDirection::Down,
            _ => VoteDirection::Abstain,
        }
    }
}
