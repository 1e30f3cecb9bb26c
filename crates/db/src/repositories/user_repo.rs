//! Repository for the `users` table: the admin-facing CRUD surface.
//!
//! Credential-field mutation and role membership live in
//! [`super::user_store::UserStore`]; this repository covers the plain entity
//! operations the controller layer consumes.

use dealerlot_core::roles::normalize_name;
use dealerlot_core::stamp::new_stamp;
use dealerlot_core::types::DbId;
use sqlx::PgPool;

use crate::error::{DbError, DbResult};
use crate::models::user::{CreateUser, UpdateUserProfile, User};

/// Column list shared across queries; reads join the owning dealer's name in
/// the same statement.
pub(crate) const COLUMNS: &str = "u.id, u.user_name, u.normalized_user_name, u.name, \
    u.email, u.normalized_email, u.email_confirmed, u.password_hash, u.security_stamp, \
    u.phone, u.phone_confirmed, u.dealer_id, d.name AS dealer_name, u.concurrency_stamp";

pub(crate) const FROM_JOINED: &str = "FROM users u LEFT JOIN dealers d ON u.dealer_id = d.id";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user with a fresh concurrency stamp, returning the
    /// created row (joined projection).
    ///
    /// A dealer reference, if set, must name an existing dealer; a dangling
    /// one is refused before the write, same as [`Self::assign_dealer`].
    pub async fn create(pool: &PgPool, input: &CreateUser) -> DbResult<User> {
        if let Some(dealer_id) = input.dealer_id {
            super::ensure_dealer_exists(pool, dealer_id).await?;
        }
        let stamp = new_stamp();
        let normalized_email = input.email.as_deref().map(normalize_name);
        let id: DbId = sqlx::query_scalar(
            "INSERT INTO users (name, email, normalized_email, phone, dealer_id, concurrency_stamp)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id",
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(&normalized_email)
        .bind(&input.phone)
        .bind(input.dealer_id)
        .bind(&stamp)
        .fetch_one(pool)
        .await?;
        Self::fetch(pool, id).await
    }

    /// Find a user by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> DbResult<Option<User>> {
        let query = format!("SELECT {COLUMNS} {FROM_JOINED} WHERE u.id = $1");
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?)
    }

    /// List all users ordered by id ascending.
    pub async fn list(pool: &PgPool) -> DbResult<Vec<User>> {
        let query = format!("SELECT {COLUMNS} {FROM_JOINED} ORDER BY u.id ASC");
        Ok(sqlx::query_as::<_, User>(&query).fetch_all(pool).await?)
    }

    /// Update profile fields under the stamp protocol, returning the updated
    /// row with its new stamp.
    ///
    /// The normalized username/email columns are recomputed here so lookups
    /// never case-fold at query time.
    pub async fn update_profile(
        pool: &PgPool,
        id: DbId,
        input: &UpdateUserProfile,
        expected: Option<&str>,
    ) -> DbResult<User> {
        let stamp = new_stamp();
        let normalized_user_name = input.user_name.as_deref().map(normalize_name);
        let normalized_email = input.email.as_deref().map(normalize_name);
        let result = sqlx::query(
            "UPDATE users SET user_name = $2, normalized_user_name = $3, name = $4,
                    email = $5, normalized_email = $6, phone = $7, concurrency_stamp = $8
             WHERE id = $1 AND (concurrency_stamp = $9 OR concurrency_stamp IS NULL)",
        )
        .bind(id)
        .bind(&input.user_name)
        .bind(&normalized_user_name)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&normalized_email)
        .bind(&input.phone)
        .bind(&stamp)
        .bind(expected)
        .execute(pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(super::classify_missed_write(pool, "users", "user", id).await);
        }
        Self::fetch(pool, id).await
    }

    /// Move the user to another dealer under the stamp protocol.
    ///
    /// The target dealer must exist; a dangling reference is refused before
    /// the write.
    pub async fn assign_dealer(
        pool: &PgPool,
        id: DbId,
        dealer_id: DbId,
        expected: Option<&str>,
    ) -> DbResult<User> {
        super::ensure_dealer_exists(pool, dealer_id).await?;

        let stamp = new_stamp();
        let result = sqlx::query(
            "UPDATE users SET dealer_id = $2, concurrency_stamp = $3
             WHERE id = $1 AND (concurrency_stamp = $4 OR concurrency_stamp IS NULL)",
        )
        .bind(id)
        .bind(dealer_id)
        .bind(&stamp)
        .bind(expected)
        .execute(pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(super::classify_missed_write(pool, "users", "user", id).await);
        }
        Self::fetch(pool, id).await
    }

    /// Delete a user under the stamp protocol.
    pub async fn delete(pool: &PgPool, id: DbId, expected: Option<&str>) -> DbResult<()> {
        let result = sqlx::query(
            "DELETE FROM users
             WHERE id = $1 AND (concurrency_stamp = $2 OR concurrency_stamp IS NULL)",
        )
        .bind(id)
        .bind(expected)
        .execute(pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(super::classify_missed_write(pool, "users", "user", id).await);
        }
        Ok(())
    }

    /// Re-select the joined projection after a write; the row is known to
    /// exist at this point.
    async fn fetch(pool: &PgPool, id: DbId) -> DbResult<User> {
        Self::find_by_id(pool, id)
            .await?
            .ok_or(DbError::NotFound { entity: "user", id })
    }
}
