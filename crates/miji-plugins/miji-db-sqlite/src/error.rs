//! Mapping of sqlx failures onto [`StoreError`], and the per-call deadline.

use std::future::Future;
use std::time::Duration;

use miji_core::{Entity, Result, StoreError};
use tracing::warn;
use uuid::Uuid;

const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

/// True when SQLite gave up waiting for another connection's lock. The code
/// sqlx reports is the extended one; its low byte is the primary code.
fn is_busy(db: &dyn sqlx::error::DatabaseError) -> bool {
    db.code()
        .and_then(|code| code.parse::<i32>().ok())
        .is_some_and(|code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
}

/// Builds a `map_err` adapter that classifies a driver error for `operation`
/// on the row `entity`/`id`.
pub(crate) fn classify(
    operation: &'static str,
    entity: Entity,
    id: Uuid,
) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |err| {
        if let sqlx::Error::Database(db) = &err {
            if is_busy(db.as_ref()) {
                return StoreError::Timeout { operation };
            }
            if db.is_unique_violation() {
                return StoreError::Conflict { entity, id };
            }
            if db.is_foreign_key_violation() {
                if let Some(parent) = entity.parent() {
                    return StoreError::ConstraintViolation { entity, id, parent };
                }
            }
        }
        if matches!(err, sqlx::Error::PoolTimedOut) {
            return StoreError::Timeout { operation };
        }
        StoreError::Storage {
            operation,
            message: format!("{entity} {id}: {err}"),
        }
    }
}

/// `map_err` adapter for statements that are not about a single row.
pub(crate) fn storage(operation: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |err| match err {
        sqlx::Error::PoolTimedOut => StoreError::Timeout { operation },
        sqlx::Error::Database(db) if is_busy(db.as_ref()) => StoreError::Timeout { operation },
        err => StoreError::Storage {
            operation,
            message: err.to_string(),
        },
    }
}

/// Runs one store call under `limit`. Every call is a single statement, so an
/// expired or dropped call leaves nothing half-written.
///
/// A call that was still waiting on SQLite's busy handler wrote nothing. One
/// whose statement had already started runs to completion on the sqlx worker,
/// so after a `Timeout` from this path the write may or may not have landed.
pub(crate) async fn bounded<T, F>(limit: Duration, operation: &'static str, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation, ?limit, "store call exceeded its deadline");
            Err(StoreError::Timeout { operation })
        }
    }
}
