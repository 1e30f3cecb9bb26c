//! Car entity model and DTOs.

use dealerlot_core::types::DbId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A car row from the `cars` table, joined with the owning dealer's name.
///
/// `dealer_id` is nullable: a `None` dealer is the valid "unassigned" state.
/// `concurrency_stamp` is `None` only for rows that predate stamp tracking;
/// pass it back as the expected stamp when updating or deleting.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Car {
    pub id: DbId,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub stock: i32,
    pub dealer_id: Option<DbId>,
    pub dealer_name: Option<String>,
    pub concurrency_stamp: Option<String>,
}

/// DTO for creating a new car.
#[derive(Debug, Deserialize)]
pub struct CreateCar {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub stock: i32,
    pub dealer_id: Option<DbId>,
}

/// DTO for updating a car's make/model/year in one statement.
#[derive(Debug, Deserialize)]
pub struct UpdateCarDetails {
    pub make: String,
    pub model: String,
    pub year: i32,
}
