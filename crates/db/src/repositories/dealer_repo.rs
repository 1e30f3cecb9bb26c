//! Repository for the `dealers` table, including the transactional cascading
//! delete of a dealer and everything that references it.

use dealerlot_core::stamp::new_stamp;
use dealerlot_core::types::DbId;
use sqlx::PgPool;

use crate::error::{DbError, DbResult};
use crate::models::dealer::{CreateDealer, Dealer};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, description, concurrency_stamp";

/// Provides CRUD operations for dealers.
pub struct DealerRepo;

impl DealerRepo {
    /// Insert a new dealer with a fresh concurrency stamp, returning the
    /// created row.
    pub async fn create(pool: &PgPool, input: &CreateDealer) -> DbResult<Dealer> {
        if input.name.trim().is_empty() {
            return Err(DbError::InvalidArgument("dealer name must not be empty"));
        }
        let stamp = new_stamp();
        let query = format!(
            "INSERT INTO dealers (name, description, concurrency_stamp)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Dealer>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&stamp)
            .fetch_one(pool)
            .await?)
    }

    /// Find a dealer by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> DbResult<Option<Dealer>> {
        let query = format!("SELECT {COLUMNS} FROM dealers WHERE id = $1");
        Ok(sqlx::query_as::<_, Dealer>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?)
    }

    /// List all dealers ordered by id ascending.
    pub async fn list(pool: &PgPool) -> DbResult<Vec<Dealer>> {
        let query = format!("SELECT {COLUMNS} FROM dealers ORDER BY id ASC");
        Ok(sqlx::query_as::<_, Dealer>(&query).fetch_all(pool).await?)
    }

    /// Update name/description under the stamp protocol, returning the
    /// updated row with its new stamp.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        name: &str,
        description: Option<&str>,
        expected: Option<&str>,
    ) -> DbResult<Dealer> {
        if name.trim().is_empty() {
            return Err(DbError::InvalidArgument("dealer name must not be empty"));
        }
        let stamp = new_stamp();
        let query = format!(
            "UPDATE dealers SET name = $2, description = $3, concurrency_stamp = $4
             WHERE id = $1 AND (concurrency_stamp = $5 OR concurrency_stamp IS NULL)
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Dealer>(&query)
            .bind(id)
            .bind(name)
            .bind(description)
            .bind(&stamp)
            .bind(expected)
            .fetch_optional(pool)
            .await?;
        match updated {
            Some(dealer) => Ok(dealer),
            None => Err(super::classify_missed_write(pool, "dealers", "dealer", id).await),
        }
    }

    /// Delete a dealer and everything referencing it, as one transaction.
    ///
    /// The database has no FK-level cascade from dealers: referencing cars
    /// are deleted and referencing users have `dealer_id` cleared explicitly,
    /// children first, then the dealer row is CAS-deleted under the stamp
    /// protocol. Any failure inside the transaction rolls the whole cascade
    /// back and surfaces as [`DbError::DealerDeletionFailed`] with the cause.
    ///
    /// Returns [`DbError::NotFound`] before opening the transaction when the
    /// dealer does not exist.
    pub async fn delete(pool: &PgPool, id: DbId, expected: Option<&str>) -> DbResult<()> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM dealers WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await?;
        if !exists {
            return Err(DbError::NotFound {
                entity: "dealer",
                id,
            });
        }

        match Self::run_cascade(pool, id, expected).await {
            Ok(()) => Ok(()),
            Err(cause) => {
                // The transaction already rolled back; classify the miss
                // against the committed state before wrapping.
                tracing::warn!(dealer_id = id, error = %cause, "dealer cascade rolled back");
                let cause = match cause {
                    DbError::ConcurrencyConflict { .. } => {
                        super::classify_missed_write(pool, "dealers", "dealer", id).await
                    }
                    other => other,
                };
                Err(DbError::DealerDeletionFailed(Box::new(cause)))
            }
        }
    }

    /// The cascade body. Statement order matters: referencing rows must be
    /// gone before the dealer row delete can satisfy the FK constraints.
    async fn run_cascade(pool: &PgPool, id: DbId, expected: Option<&str>) -> DbResult<()> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM cars WHERE dealer_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE users SET dealer_id = NULL WHERE dealer_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(
            "DELETE FROM dealers
             WHERE id = $1 AND (concurrency_stamp = $2 OR concurrency_stamp IS NULL)",
        )
        .bind(id)
        .bind(expected)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            // Dropping `tx` rolls back.
            return Err(DbError::ConcurrencyConflict {
                entity: "dealer",
                id,
            });
        }

        tx.commit().await?;
        Ok(())
    }
}
