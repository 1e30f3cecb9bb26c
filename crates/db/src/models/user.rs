//! User entity model and DTOs.
//!
//! The `User` struct doubles as the login-credential container handed to the
//! external identity layer. That layer mutates a detached copy through the
//! setter tier below and flushes every credential field in one statement via
//! `UserStore::persist` -- the setters themselves never touch the database.

use dealerlot_core::types::DbId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full user row from the `users` table, joined with the owning dealer's name
/// on repository reads.
///
/// Contains the password hash -- never serialize this to API responses
/// directly; the controller layer maps to its own return DTOs.
#[derive(Debug, Clone, Default, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub user_name: Option<String>,
    pub normalized_user_name: Option<String>,
    /// Display name, distinct from the login `user_name`.
    pub name: String,
    pub email: Option<String>,
    pub normalized_email: Option<String>,
    pub email_confirmed: bool,
    pub password_hash: Option<String>,
    pub security_stamp: Option<String>,
    pub phone: Option<String>,
    pub phone_confirmed: bool,
    pub dealer_id: Option<DbId>,
    pub dealer_name: Option<String>,
    pub concurrency_stamp: Option<String>,
}

impl User {
    pub fn set_user_name(&mut self, user_name: Option<String>) {
        self.user_name = user_name;
    }

    pub fn set_normalized_user_name(&mut self, normalized: Option<String>) {
        self.normalized_user_name = normalized;
    }

    pub fn set_email(&mut self, email: Option<String>) {
        self.email = email;
    }

    pub fn set_normalized_email(&mut self, normalized: Option<String>) {
        self.normalized_email = normalized;
    }

    pub fn set_email_confirmed(&mut self, confirmed: bool) {
        self.email_confirmed = confirmed;
    }

    /// Stores the hash verbatim; hashing is the identity layer's concern.
    pub fn set_password_hash(&mut self, password_hash: Option<String>) {
        self.password_hash = password_hash;
    }

    pub fn set_security_stamp(&mut self, stamp: Option<String>) {
        self.security_stamp = stamp;
    }

    pub fn set_phone(&mut self, phone: Option<String>) {
        self.phone = phone;
    }

    pub fn set_phone_confirmed(&mut self, confirmed: bool) {
        self.phone_confirmed = confirmed;
    }

    pub fn has_password(&self) -> bool {
        self.password_hash.as_deref().is_some_and(|h| !h.is_empty())
    }
}

/// DTO for the plain-CRUD user create path (admin-created users; credential
/// fields are filled in later through the identity layer).
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub dealer_id: Option<DbId>,
}

/// DTO for updating a user's profile fields in one statement.
///
/// The repository recomputes the normalized username/email columns from these
/// values, so lookups never case-fold at query time.
#[derive(Debug, Deserialize)]
pub struct UpdateUserProfile {
    pub user_name: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}
