//! # StoreError
//!
//! Centralized error handling for the forum store.
//! Every failure names the entity and id it concerns so it can be logged upstream.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// The kind of row an error is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Thread,
    Post,
    Comment,
}

impl Entity {
    /// The entity this one references through its foreign key.
    pub fn parent(self) -> Option<Entity> {
        match self {
            Entity::Thread => None,
            Entity::Post => Some(Entity::Thread),
            Entity::Comment => Some(Entity::Post),
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Entity::Thread => "thread",
            Entity::Post => "post",
            Entity::Comment => "comment",
        })
    }
}

/// The primary error type for all store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Operation addressed an id with no matching row
    #[error("{entity} not found with ID {id}")]
    NotFound { entity: Entity, id: Uuid },

    /// Creation with an id that is already taken
    #[error("{entity} already exists with ID {id}")]
    Conflict { entity: Entity, id: Uuid },

    /// Create/update referencing a parent row that does not exist
    #[error("{entity} {id} references a {parent} that does not exist")]
    ConstraintViolation { entity: Entity, id: Uuid, parent: Entity },

    /// Entity rejected before any I/O
    #[error("validation error: {0}")]
    Validation(String),

    /// Deadline elapsed before the backing store answered
    #[error("{operation} timed out")]
    Timeout { operation: &'static str },

    /// Infrastructure failure (e.g. DB unreachable, disk full)
    #[error("{operation} failed: {message}")]
    Storage {
        operation: &'static str,
        message: String,
    },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

/// A specialized Result type for store logic.
pub type Result<T> = std::result::Result<T, StoreError>;
