//! Integration tests for the concurrency-stamp protocol.
//!
//! - A write with the stamp last read succeeds and yields a fresh stamp
//! - Reusing a consumed stamp is a conflict, never a silent retry
//! - Rows with a NULL stamp (predating stamp tracking) accept any expected
//!   stamp
//! - A missed write against a deleted row classifies as NotFound

use assert_matches::assert_matches;
use sqlx::PgPool;

use dealerlot_db::models::{CreateCar, CreateDealer, UpdateCarDetails};
use dealerlot_db::repositories::{CarRepo, DealerRepo, RoleStore};
use dealerlot_db::DbError;

fn new_car(make: &str, model: &str) -> CreateCar {
    CreateCar {
        make: make.to_string(),
        model: model.to_string(),
        year: 2020,
        stock: 1,
        dealer_id: None,
    }
}

fn details(make: &str, model: &str, year: i32) -> UpdateCarDetails {
    UpdateCarDetails {
        make: make.to_string(),
        model: model.to_string(),
        year,
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_cas_success_rotates_stamp(pool: PgPool) {
    let car = CarRepo::create(&pool, &new_car("Toyota", "Corolla"))
        .await
        .unwrap();
    let t0 = car.concurrency_stamp.clone().unwrap();

    let updated = CarRepo::update_stock(&pool, car.id, 9, Some(&t0)).await.unwrap();
    let t1 = updated.concurrency_stamp.clone().unwrap();
    assert_ne!(t0, t1);
    assert_eq!(updated.stock, 9);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_stale_stamp_conflicts(pool: PgPool) {
    let car = CarRepo::create(&pool, &new_car("Toyota", "Corolla"))
        .await
        .unwrap();
    let t0 = car.concurrency_stamp.clone().unwrap();

    CarRepo::update_stock(&pool, car.id, 9, Some(&t0)).await.unwrap();

    // T0 has been consumed; reusing it must surface a conflict.
    let err = CarRepo::update_stock(&pool, car.id, 10, Some(&t0))
        .await
        .unwrap_err();
    assert_matches!(err, DbError::ConcurrencyConflict { entity: "car", .. });

    // The conflicting write left no trace.
    let current = CarRepo::find_by_id(&pool, car.id).await.unwrap().unwrap();
    assert_eq!(current.stock, 9);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_stale_stamp_conflicts_on_delete(pool: PgPool) {
    let car = CarRepo::create(&pool, &new_car("Honda", "Civic")).await.unwrap();
    let t0 = car.concurrency_stamp.clone().unwrap();

    let updated = CarRepo::update_details(&pool, car.id, &details("Honda", "Accord", 2021), Some(&t0))
        .await
        .unwrap();

    let err = CarRepo::delete(&pool, car.id, Some(&t0)).await.unwrap_err();
    assert_matches!(err, DbError::ConcurrencyConflict { entity: "car", .. });

    CarRepo::delete(&pool, car.id, updated.concurrency_stamp.as_deref())
        .await
        .unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_legacy_null_stamp_accepts_any_expected(pool: PgPool) {
    // A row created before stamp tracking existed: stamp column is NULL.
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO cars (make, model, year, stock) VALUES ('Saab', '900', 1994, 1) RETURNING id",
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    let updated = CarRepo::update_stock(&pool, id, 2, Some("not-the-stored-stamp"))
        .await
        .unwrap();
    assert_eq!(updated.stock, 2);
    // The write installed a real stamp; the row is legacy no longer.
    assert!(updated.concurrency_stamp.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_legacy_null_stamp_accepts_none_expected(pool: PgPool) {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO cars (make, model, year, stock) VALUES ('Saab', '9000', 1995, 1) RETURNING id",
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    CarRepo::delete(&pool, id, None).await.unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_missed_write_on_missing_row_is_not_found(pool: PgPool) {
    let err = CarRepo::update_stock(&pool, 4242, 1, Some("whatever"))
        .await
        .unwrap_err();
    assert_matches!(err, DbError::NotFound { entity: "car", id: 4242 });
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_dealer_update_follows_protocol(pool: PgPool) {
    let dealer = DealerRepo::create(
        &pool,
        &CreateDealer {
            name: "Original".to_string(),
            description: None,
        },
    )
    .await
    .unwrap();
    let t0 = dealer.concurrency_stamp.clone().unwrap();

    let updated = DealerRepo::update(&pool, dealer.id, "Renamed", Some("desc"), Some(&t0))
        .await
        .unwrap();
    assert_ne!(updated.concurrency_stamp, dealer.concurrency_stamp);

    let err = DealerRepo::update(&pool, dealer.id, "Again", None, Some(&t0))
        .await
        .unwrap_err();
    assert_matches!(err, DbError::ConcurrencyConflict { entity: "dealer", .. });
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_role_update_follows_protocol(pool: PgPool) {
    let role = RoleStore::create(&pool, "Manager", "MANAGER").await.unwrap();
    let t0 = role.concurrency_stamp.clone().unwrap();

    let updated = RoleStore::update(&pool, role.id, "Sales Manager", "SALES MANAGER", Some(&t0))
        .await
        .unwrap();
    assert_ne!(updated.concurrency_stamp.as_deref(), Some(t0.as_str()));

    let err = RoleStore::delete(&pool, role.id, Some(&t0)).await.unwrap_err();
    assert_matches!(err, DbError::ConcurrencyConflict { entity: "role", .. });

    RoleStore::delete(&pool, role.id, updated.concurrency_stamp.as_deref())
        .await
        .unwrap();
    assert!(RoleStore::find_by_id(&pool, role.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_seeded_roles_are_legacy_rows(pool: PgPool) {
    // The seed migration inserts the well-known roles without stamps.
    let role = RoleStore::find_by_normalized_name(&pool, "SUPERADMIN")
        .await
        .unwrap()
        .unwrap();
    assert!(role.concurrency_stamp.is_none());

    // Legacy rows accept any expected stamp.
    let updated = RoleStore::update(&pool, role.id, "SuperAdmin", "SUPERADMIN", Some("bogus"))
        .await
        .unwrap();
    assert!(updated.concurrency_stamp.is_some());
}
