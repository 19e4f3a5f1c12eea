//! miji/crates/miji-core/src/lib.rs
//!
//! Entities, errors and store contracts for the miji forum.
//! Storage plugins implement the traits; the presentation layer talks to [`Store`].

pub mod error;
pub mod models;
pub mod store;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use store::Store;
pub use traits::*;

#[cfg(test)]
mod tests {
    use super::models::*;
    use super::error::StoreError;

    #[test]
    fn new_entities_start_with_zero_votes() {
        let thread = Thread::new("Go", "lang");
        let post = Post::new(thread.id, "hi", "body");
        let comment = Comment::new(post.id, "first");

        assert_eq!(post.thread_id, thread.id);
        assert_eq!(post.votes, 0);
        assert_eq!(comment.post_id, post.id);
        assert_eq!(comment.votes, 0);
        assert_ne!(thread.id, post.id);
    }

    #[test]
    fn blank_thread_title_is_rejected() {
        assert!(Thread::new("Go", "").validate().is_ok());
        assert!(matches!(
            Thread::new("   ", "lang").validate(),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn vote_direction_parses_leniently() {
        assert_eq!(VoteDirection::from("up").delta(), 1);
        assert_eq!(VoteDirection::from("down").delta(), -1);
        assert_eq!(VoteDirection::from("sideways"), VoteDirection::Abstain);
        assert_eq!(VoteDirection::from("UP").delta(), 0);
    }

    #[test]
    fn full_update_carries_votes() {
        let mut post = Post::new(uuid::Uuid::now_v7(), "hi", "body");
        post.votes = 7;
        let update = PostUpdate::from(post);
        assert_eq!(update.votes, Some(7));
    }
}
