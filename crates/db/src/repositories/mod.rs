//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` as the first argument. Reads return `Ok(None)` for missing rows;
//! mutations return [`DbError::NotFound`] / [`DbError::ConcurrencyConflict`]
//! so the two misses stay distinguishable.
//!
//! Every mutation follows the stamp protocol: the WHERE clause conjuncts
//! `id = $n AND (concurrency_stamp = $expected OR concurrency_stamp IS NULL)`.
//! The `IS NULL` arm accepts rows created before stamp tracking existed and
//! must be preserved for pre-existing data.

use dealerlot_core::types::DbId;
use sqlx::PgPool;

use crate::error::DbError;

pub mod car_repo;
pub mod dealer_repo;
pub mod role_store;
pub mod user_repo;
pub mod user_store;

pub use car_repo::CarRepo;
pub use dealer_repo::DealerRepo;
pub use role_store::RoleStore;
pub use user_repo::UserRepo;
pub use user_store::UserStore;

/// Refuse a dangling dealer reference before a write.
pub(crate) async fn ensure_dealer_exists(pool: &PgPool, dealer_id: DbId) -> Result<(), DbError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM dealers WHERE id = $1)")
        .bind(dealer_id)
        .fetch_one(pool)
        .await?;
    if exists {
        Ok(())
    } else {
        Err(DbError::NotFound {
            entity: "dealer",
            id: dealer_id,
        })
    }
}

/// Classify a compare-and-swap write that affected zero rows.
///
/// Exactly one row can match by primary key, so a missed write means either
/// the row is gone (`NotFound`) or its stamp changed under us
/// (`ConcurrencyConflict`). One existence probe decides which. Never retried:
/// the caller holds stale data and must re-read first.
pub(crate) async fn classify_missed_write(
    pool: &PgPool,
    table: &str,
    entity: &'static str,
    id: DbId,
) -> DbError {
    let query = format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = $1)");
    match sqlx::query_scalar::<_, bool>(&query)
        .bind(id)
        .fetch_one(pool)
        .await
    {
        Ok(true) => {
            tracing::debug!(entity, id, "stale concurrency stamp on write");
            DbError::ConcurrencyConflict { entity, id }
        }
        Ok(false) => DbError::NotFound { entity, id },
        Err(err) => DbError::Database(err),
    }
}
