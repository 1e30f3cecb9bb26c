//! Credential store backing the external identity layer.
//!
//! One cohesive type covering the capability set that layer expects: identity
//! lookups over precomputed normalized columns, a single-flush persist for
//! the in-memory credential setters on [`User`], and role membership over the
//! `user_roles` association table. Same pool, same stamp protocol as the
//! plain repositories.

use dealerlot_core::roles::normalize_name;
use dealerlot_core::stamp::new_stamp;
use dealerlot_core::types::DbId;
use sqlx::PgPool;

use crate::error::{DbError, DbResult};
use crate::models::user::User;

use super::user_repo::{COLUMNS, FROM_JOINED};

/// Provides the credential-storage operations for users.
pub struct UserStore;

impl UserStore {
    /// Insert the user with a fresh concurrency stamp, writing the generated
    /// id and the stamp back into the detached struct.
    pub async fn create(pool: &PgPool, user: &mut User) -> DbResult<()> {
        if let Some(dealer_id) = user.dealer_id {
            super::ensure_dealer_exists(pool, dealer_id).await?;
        }
        let stamp = new_stamp();
        let id: DbId = sqlx::query_scalar(
            "INSERT INTO users (user_name, normalized_user_name, name, email, normalized_email,
                                email_confirmed, password_hash, security_stamp, phone,
                                phone_confirmed, dealer_id, concurrency_stamp)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING id",
        )
        .bind(&user.user_name)
        .bind(&user.normalized_user_name)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.normalized_email)
        .bind(user.email_confirmed)
        .bind(&user.password_hash)
        .bind(&user.security_stamp)
        .bind(&user.phone)
        .bind(user.phone_confirmed)
        .bind(user.dealer_id)
        .bind(&stamp)
        .fetch_one(pool)
        .await?;
        user.id = id;
        user.concurrency_stamp = Some(stamp);
        Ok(())
    }

    /// Find a user by primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> DbResult<Option<User>> {
        let query = format!("SELECT {COLUMNS} {FROM_JOINED} WHERE u.id = $1");
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?)
    }

    /// Find a user by normalized username.
    pub async fn find_by_name(pool: &PgPool, normalized_user_name: &str) -> DbResult<Option<User>> {
        if normalized_user_name.is_empty() {
            return Err(DbError::InvalidArgument("normalized username must not be empty"));
        }
        let query = format!("SELECT {COLUMNS} {FROM_JOINED} WHERE u.normalized_user_name = $1");
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(normalized_user_name)
            .fetch_optional(pool)
            .await?)
    }

    /// Find a user by normalized email.
    pub async fn find_by_email(pool: &PgPool, normalized_email: &str) -> DbResult<Option<User>> {
        if normalized_email.is_empty() {
            return Err(DbError::InvalidArgument("normalized email must not be empty"));
        }
        let query = format!("SELECT {COLUMNS} {FROM_JOINED} WHERE u.normalized_email = $1");
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(normalized_email)
            .fetch_optional(pool)
            .await?)
    }

    /// Flush every credential field of the detached struct in one statement
    /// under the stamp protocol, replacing the stamp in place on success.
    ///
    /// The field setters on [`User`] only mutate memory; this is the single
    /// write they all funnel through.
    pub async fn persist(pool: &PgPool, user: &mut User) -> DbResult<()> {
        let expected = user.concurrency_stamp.clone();
        let stamp = new_stamp();
        let result = sqlx::query(
            "UPDATE users SET user_name = $2, normalized_user_name = $3, name = $4,
                    email = $5, normalized_email = $6, email_confirmed = $7,
                    password_hash = $8, security_stamp = $9, phone = $10,
                    phone_confirmed = $11, dealer_id = $12, concurrency_stamp = $13
             WHERE id = $1 AND (concurrency_stamp = $14 OR concurrency_stamp IS NULL)",
        )
        .bind(user.id)
        .bind(&user.user_name)
        .bind(&user.normalized_user_name)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.normalized_email)
        .bind(user.email_confirmed)
        .bind(&user.password_hash)
        .bind(&user.security_stamp)
        .bind(&user.phone)
        .bind(user.phone_confirmed)
        .bind(user.dealer_id)
        .bind(&stamp)
        .bind(&expected)
        .execute(pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(super::classify_missed_write(pool, "users", "user", user.id).await);
        }
        user.concurrency_stamp = Some(stamp);
        Ok(())
    }

    /// Delete the user's row under the stamp protocol.
    pub async fn delete(pool: &PgPool, user: &User) -> DbResult<()> {
        let result = sqlx::query(
            "DELETE FROM users
             WHERE id = $1 AND (concurrency_stamp = $2 OR concurrency_stamp IS NULL)",
        )
        .bind(user.id)
        .bind(&user.concurrency_stamp)
        .execute(pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(super::classify_missed_write(pool, "users", "user", user.id).await);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Role membership
    // -----------------------------------------------------------------------

    /// Add the user to a role, resolved by normalized name.
    ///
    /// The store does not deduplicate: inserting an existing membership is
    /// the caller's error and surfaces as a database constraint violation.
    pub async fn add_to_role(pool: &PgPool, user: &User, role_name: &str) -> DbResult<()> {
        let role_id = Self::resolve_role_id(pool, role_name).await?;
        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
            .bind(user.id)
            .bind(role_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Remove the user from a role, resolved by normalized name. Removing a
    /// membership that does not exist is a no-op.
    pub async fn remove_from_role(pool: &PgPool, user: &User, role_name: &str) -> DbResult<()> {
        let role_id = Self::resolve_role_id(pool, role_name).await?;
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role_id = $2")
            .bind(user.id)
            .bind(role_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Whether the user holds the given role.
    pub async fn is_in_role(pool: &PgPool, user: &User, role_name: &str) -> DbResult<bool> {
        if role_name.is_empty() {
            return Err(DbError::InvalidArgument("role name must not be empty"));
        }
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM user_roles ur
             JOIN roles r ON ur.role_id = r.id
             WHERE ur.user_id = $1 AND r.normalized_name = $2",
        )
        .bind(user.id)
        .bind(normalize_name(role_name))
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }

    /// List the role names the user holds.
    pub async fn roles(pool: &PgPool, user: &User) -> DbResult<Vec<String>> {
        Ok(sqlx::query_scalar(
            "SELECT r.name FROM user_roles ur
             JOIN roles r ON ur.role_id = r.id
             WHERE ur.user_id = $1
             ORDER BY r.name ASC",
        )
        .bind(user.id)
        .fetch_all(pool)
        .await?)
    }

    /// List all users holding the given role.
    pub async fn users_in_role(pool: &PgPool, role_name: &str) -> DbResult<Vec<User>> {
        if role_name.is_empty() {
            return Err(DbError::InvalidArgument("role name must not be empty"));
        }
        let query = format!(
            "SELECT {COLUMNS} {FROM_JOINED}
             JOIN user_roles ur ON ur.user_id = u.id
             JOIN roles r ON ur.role_id = r.id
             WHERE r.normalized_name = $1
             ORDER BY u.id ASC"
        );
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(normalize_name(role_name))
            .fetch_all(pool)
            .await?)
    }

    /// Resolve a role name (normalized by upper-casing) to its id.
    async fn resolve_role_id(pool: &PgPool, role_name: &str) -> DbResult<DbId> {
        if role_name.is_empty() {
            return Err(DbError::InvalidArgument("role name must not be empty"));
        }
        let role_id: Option<DbId> =
            sqlx::query_scalar("SELECT id FROM roles WHERE normalized_name = $1")
                .bind(normalize_name(role_name))
                .fetch_optional(pool)
                .await?;
        role_id.ok_or_else(|| DbError::RoleNotFound(role_name.to_string()))
    }
}
