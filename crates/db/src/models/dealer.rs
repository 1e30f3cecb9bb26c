//! Dealer entity model and DTOs.

use dealerlot_core::types::DbId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A dealer row from the `dealers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Dealer {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub concurrency_stamp: Option<String>,
}

/// DTO for creating a new dealer.
#[derive(Debug, Deserialize)]
pub struct CreateDealer {
    pub name: String,
    pub description: Option<String>,
}
