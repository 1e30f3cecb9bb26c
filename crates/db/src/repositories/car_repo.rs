//! Repository for the `cars` table.

use dealerlot_core::stamp::new_stamp;
use dealerlot_core::types::DbId;
use sqlx::PgPool;

use crate::error::{DbError, DbResult};
use crate::models::car::{Car, CreateCar, UpdateCarDetails};

/// Column list shared across queries; reads join the owning dealer's name in
/// the same statement rather than paying a second round trip.
const COLUMNS: &str = "c.id, c.make, c.model, c.year, c.stock, c.dealer_id, \
                       d.name AS dealer_name, c.concurrency_stamp";

const FROM_JOINED: &str = "FROM cars c LEFT JOIN dealers d ON c.dealer_id = d.id";

/// Provides CRUD, scoped reads, and search over cars.
pub struct CarRepo;

impl CarRepo {
    /// Insert a new car with a fresh concurrency stamp, returning the created
    /// row (joined projection).
    ///
    /// A dealer reference, if set, must name an existing dealer; a dangling
    /// one is refused before the write, same as [`Self::assign_dealer`].
    pub async fn create(pool: &PgPool, input: &CreateCar) -> DbResult<Car> {
        if let Some(dealer_id) = input.dealer_id {
            super::ensure_dealer_exists(pool, dealer_id).await?;
        }
        let stamp = new_stamp();
        let id: DbId = sqlx::query_scalar(
            "INSERT INTO cars (make, model, year, stock, dealer_id, concurrency_stamp)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id",
        )
        .bind(&input.make)
        .bind(&input.model)
        .bind(input.year)
        .bind(input.stock)
        .bind(input.dealer_id)
        .bind(&stamp)
        .fetch_one(pool)
        .await?;
        Self::fetch(pool, id).await
    }

    /// Find a car by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> DbResult<Option<Car>> {
        let query = format!("SELECT {COLUMNS} {FROM_JOINED} WHERE c.id = $1");
        Ok(sqlx::query_as::<_, Car>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?)
    }

    /// Find a car by id, scoped to one dealer.
    ///
    /// Returns `None` when the row exists but belongs to a different dealer,
    /// indistinguishable from a missing row: the boundary layer decides
    /// whether that reads as 404 or 403.
    pub async fn find_by_id_for_dealer(
        pool: &PgPool,
        id: DbId,
        dealer_id: DbId,
    ) -> DbResult<Option<Car>> {
        let query = format!("SELECT {COLUMNS} {FROM_JOINED} WHERE c.id = $1 AND c.dealer_id = $2");
        Ok(sqlx::query_as::<_, Car>(&query)
            .bind(id)
            .bind(dealer_id)
            .fetch_optional(pool)
            .await?)
    }

    /// List all cars ordered by id ascending.
    pub async fn list(pool: &PgPool) -> DbResult<Vec<Car>> {
        let query = format!("SELECT {COLUMNS} {FROM_JOINED} ORDER BY c.id ASC");
        Ok(sqlx::query_as::<_, Car>(&query).fetch_all(pool).await?)
    }

    /// Search by make and/or model, case-insensitive substring match.
    ///
    /// An absent filter places no constraint on that column; both absent
    /// returns every row.
    pub async fn search(
        pool: &PgPool,
        make: Option<&str>,
        model: Option<&str>,
    ) -> DbResult<Vec<Car>> {
        let (where_clause, patterns) = build_search_filter(make, model);
        let query = format!("SELECT {COLUMNS} {FROM_JOINED} {where_clause} ORDER BY c.id ASC");

        let mut q = sqlx::query_as::<_, Car>(&query);
        for pattern in &patterns {
            q = q.bind(pattern.as_str());
        }
        Ok(q.fetch_all(pool).await?)
    }

    /// Update make/model/year under the stamp protocol, returning the updated
    /// row with its new stamp.
    pub async fn update_details(
        pool: &PgPool,
        id: DbId,
        input: &UpdateCarDetails,
        expected: Option<&str>,
    ) -> DbResult<Car> {
        let stamp = new_stamp();
        let result = sqlx::query(
            "UPDATE cars SET make = $2, model = $3, year = $4, concurrency_stamp = $5
             WHERE id = $1 AND (concurrency_stamp = $6 OR concurrency_stamp IS NULL)",
        )
        .bind(id)
        .bind(&input.make)
        .bind(&input.model)
        .bind(input.year)
        .bind(&stamp)
        .bind(expected)
        .execute(pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(super::classify_missed_write(pool, "cars", "car", id).await);
        }
        Self::fetch(pool, id).await
    }

    /// Update the stock count under the stamp protocol.
    pub async fn update_stock(
        pool: &PgPool,
        id: DbId,
        stock: i32,
        expected: Option<&str>,
    ) -> DbResult<Car> {
        if stock < 0 {
            return Err(DbError::InvalidArgument("stock must be non-negative"));
        }
        let stamp = new_stamp();
        let result = sqlx::query(
            "UPDATE cars SET stock = $2, concurrency_stamp = $3
             WHERE id = $1 AND (concurrency_stamp = $4 OR concurrency_stamp IS NULL)",
        )
        .bind(id)
        .bind(stock)
        .bind(&stamp)
        .bind(expected)
        .execute(pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(super::classify_missed_write(pool, "cars", "car", id).await);
        }
        Self::fetch(pool, id).await
    }

    /// Move the car to another dealer under the stamp protocol.
    ///
    /// The target dealer must exist; a dangling reference is refused before
    /// the write.
    pub async fn assign_dealer(
        pool: &PgPool,
        id: DbId,
        dealer_id: DbId,
        expected: Option<&str>,
    ) -> DbResult<Car> {
        super::ensure_dealer_exists(pool, dealer_id).await?;

        let stamp = new_stamp();
        let result = sqlx::query(
            "UPDATE cars SET dealer_id = $2, concurrency_stamp = $3
             WHERE id = $1 AND (concurrency_stamp = $4 OR concurrency_stamp IS NULL)",
        )
        .bind(id)
        .bind(dealer_id)
        .bind(&stamp)
        .bind(expected)
        .execute(pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(super::classify_missed_write(pool, "cars", "car", id).await);
        }
        Self::fetch(pool, id).await
    }

    /// Delete a car under the stamp protocol.
    pub async fn delete(pool: &PgPool, id: DbId, expected: Option<&str>) -> DbResult<()> {
        let result = sqlx::query(
            "DELETE FROM cars
             WHERE id = $1 AND (concurrency_stamp = $2 OR concurrency_stamp IS NULL)",
        )
        .bind(id)
        .bind(expected)
        .execute(pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(super::classify_missed_write(pool, "cars", "car", id).await);
        }
        Ok(())
    }

    /// Re-select the joined projection after a write; the row is known to
    /// exist at this point.
    async fn fetch(pool: &PgPool, id: DbId) -> DbResult<Car> {
        Self::find_by_id(pool, id)
            .await?
            .ok_or(DbError::NotFound { entity: "car", id })
    }
}

/// Compose the optional make/model filters as a condition list with numbered
/// binds, in filter order.
fn build_search_filter(make: Option<&str>, model: Option<&str>) -> (String, Vec<String>) {
    let mut conditions: Vec<String> = Vec::new();
    let mut patterns: Vec<String> = Vec::new();

    if let Some(make) = make {
        patterns.push(format!("%{make}%"));
        conditions.push(format!("c.make ILIKE ${}", patterns.len()));
    }
    if let Some(model) = model {
        patterns.push(format!("%{model}%"));
        conditions.push(format!("c.model ILIKE ${}", patterns.len()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };
    (where_clause, patterns)
}
