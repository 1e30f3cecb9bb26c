//! Store for the `roles` table.
//!
//! Name normalization (upper-casing) is the caller's responsibility; this
//! store persists whatever normalized value it is given.

use dealerlot_core::stamp::new_stamp;
use dealerlot_core::types::DbId;
use sqlx::PgPool;

use crate::error::{DbError, DbResult};
use crate::models::role::Role;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, normalized_name, concurrency_stamp";

/// Provides CRUD operations for roles.
pub struct RoleStore;

impl RoleStore {
    /// Insert a new role with a fresh concurrency stamp, returning the
    /// created row.
    pub async fn create(pool: &PgPool, name: &str, normalized_name: &str) -> DbResult<Role> {
        if name.is_empty() || normalized_name.is_empty() {
            return Err(DbError::InvalidArgument("role name must not be empty"));
        }
        let stamp = new_stamp();
        let query = format!(
            "INSERT INTO roles (name, normalized_name, concurrency_stamp)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Role>(&query)
            .bind(name)
            .bind(normalized_name)
            .bind(&stamp)
            .fetch_one(pool)
            .await?)
    }

    /// Find a role by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> DbResult<Option<Role>> {
        let query = format!("SELECT {COLUMNS} FROM roles WHERE id = $1");
        Ok(sqlx::query_as::<_, Role>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?)
    }

    /// Find a role by its normalized name.
    pub async fn find_by_normalized_name(
        pool: &PgPool,
        normalized_name: &str,
    ) -> DbResult<Option<Role>> {
        if normalized_name.is_empty() {
            return Err(DbError::InvalidArgument("role name must not be empty"));
        }
        let query = format!("SELECT {COLUMNS} FROM roles WHERE normalized_name = $1");
        Ok(sqlx::query_as::<_, Role>(&query)
            .bind(normalized_name)
            .fetch_optional(pool)
            .await?)
    }

    /// Update name/normalized name under the stamp protocol, returning the
    /// updated row with its new stamp.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        name: &str,
        normalized_name: &str,
        expected: Option<&str>,
    ) -> DbResult<Role> {
        if name.is_empty() || normalized_name.is_empty() {
            return Err(DbError::InvalidArgument("role name must not be empty"));
        }
        let stamp = new_stamp();
        let query = format!(
            "UPDATE roles SET name = $2, normalized_name = $3, concurrency_stamp = $4
             WHERE id = $1 AND (concurrency_stamp = $5 OR concurrency_stamp IS NULL)
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Role>(&query)
            .bind(id)
            .bind(name)
            .bind(normalized_name)
            .bind(&stamp)
            .bind(expected)
            .fetch_optional(pool)
            .await?;
        match updated {
            Some(role) => Ok(role),
            None => Err(super::classify_missed_write(pool, "roles", "role", id).await),
        }
    }

    /// Delete a role under the stamp protocol.
    pub async fn delete(pool: &PgPool, id: DbId, expected: Option<&str>) -> DbResult<()> {
        let result = sqlx::query(
            "DELETE FROM roles
             WHERE id = $1 AND (concurrency_stamp = $2 OR concurrency_stamp IS NULL)",
        )
        .bind(id)
        .bind(expected)
        .execute(pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(super::classify_missed_write(pool, "roles", "role", id).await);
        }
        Ok(())
    }
}
