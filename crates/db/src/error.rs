//! Persistence-layer error taxonomy.
//!
//! Every store and repository method surfaces one of these variants so the
//! calling layer can map them to transport-specific responses. Nothing here
//! is retried or swallowed: a concurrency conflict always reaches the caller,
//! who holds stale data and must re-read before trying again.

use dealerlot_core::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// No row at the primary key, or the row failed a scoping predicate
    /// (e.g. belongs to a different dealer). The two cases are deliberately
    /// indistinguishable so the caller decides 404 vs 403 semantics.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// The compare-and-swap write affected zero rows although the primary
    /// key existed: another writer replaced the concurrency stamp first.
    #[error("{entity} with id {id} was modified by another process")]
    ConcurrencyConflict { entity: &'static str, id: DbId },

    /// A role-membership operation referenced a role name with no row.
    #[error("role {0:?} not found")]
    RoleNotFound(String),

    /// A step of the cascading dealer delete failed; the transaction was
    /// rolled back and the original state is intact.
    #[error("dealer deletion failed")]
    DealerDeletionFailed(#[source] Box<DbError>),

    /// A required identifier was empty.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Any other database error, surfaced as-is (no automatic retry).
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type DbResult<T> = Result<T, DbError>;
