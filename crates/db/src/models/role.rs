//! Role entity model.

use dealerlot_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// A role row from the `roles` table.
///
/// `normalized_name` is the upper-cased lookup form; normalizing is the
/// caller's responsibility, the store persists whatever it is given.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Role {
    pub id: DbId,
    pub name: String,
    pub normalized_name: String,
    pub concurrency_stamp: Option<String>,
}
