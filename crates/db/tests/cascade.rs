//! Integration tests for the cascading dealer delete.
//!
//! The cascade is an explicit transaction, not an FK-level cascade: cars go,
//! user references are cleared, the dealer row is CAS-deleted last, and any
//! failure rolls everything back as one unit.

use assert_matches::assert_matches;
use sqlx::PgPool;

use dealerlot_db::models::{CreateCar, CreateDealer, CreateUser, Dealer};
use dealerlot_db::repositories::{CarRepo, DealerRepo, UserRepo};
use dealerlot_db::DbError;

async fn dealer_with_dependents(pool: &PgPool) -> Dealer {
    let dealer = DealerRepo::create(
        pool,
        &CreateDealer {
            name: "Cascade Motors".to_string(),
            description: None,
        },
    )
    .await
    .unwrap();

    for model in ["Corolla", "Camry", "Yaris"] {
        CarRepo::create(
            pool,
            &CreateCar {
                make: "Toyota".to_string(),
                model: model.to_string(),
                year: 2021,
                stock: 1,
                dealer_id: Some(dealer.id),
            },
        )
        .await
        .unwrap();
    }
    for name in ["Alice", "Bob"] {
        UserRepo::create(
            pool,
            &CreateUser {
                name: name.to_string(),
                email: Some(format!("{}@cascade.test", name.to_lowercase())),
                phone: None,
                dealer_id: Some(dealer.id),
            },
        )
        .await
        .unwrap();
    }

    dealer
}

async fn count_cars_of(pool: &PgPool, dealer_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM cars WHERE dealer_id = $1")
        .bind(dealer_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn count_users_of(pool: &PgPool, dealer_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE dealer_id = $1")
        .bind(dealer_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_cascade_removes_all_dependents_atomically(pool: PgPool) {
    let dealer = dealer_with_dependents(&pool).await;

    DealerRepo::delete(&pool, dealer.id, dealer.concurrency_stamp.as_deref())
        .await
        .unwrap();

    assert_eq!(count_cars_of(&pool, dealer.id).await, 0);
    assert_eq!(count_users_of(&pool, dealer.id).await, 0);
    assert!(DealerRepo::find_by_id(&pool, dealer.id).await.unwrap().is_none());

    // The users themselves survive, only their dealer reference is cleared.
    let users = UserRepo::list(&pool).await.unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.dealer_id.is_none()));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_cascade_rolls_back_on_stale_stamp(pool: PgPool) {
    let dealer = dealer_with_dependents(&pool).await;

    // A concurrent writer rotated the dealer's stamp between our read and
    // our delete.
    let err = DealerRepo::delete(&pool, dealer.id, Some("stale-stamp"))
        .await
        .unwrap_err();
    assert_matches!(err, DbError::DealerDeletionFailed(cause) => {
        assert_matches!(*cause, DbError::ConcurrencyConflict { entity: "dealer", .. });
    });

    // Nothing of the cascade is visible: full rollback.
    assert_eq!(count_cars_of(&pool, dealer.id).await, 3);
    assert_eq!(count_users_of(&pool, dealer.id).await, 2);
    assert!(DealerRepo::find_by_id(&pool, dealer.id).await.unwrap().is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_cascade_missing_dealer_is_not_found(pool: PgPool) {
    // Checked before any transaction is opened.
    let err = DealerRepo::delete(&pool, 4242, None).await.unwrap_err();
    assert_matches!(err, DbError::NotFound { entity: "dealer", id: 4242 });
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_cascade_on_dealer_without_dependents(pool: PgPool) {
    let dealer = DealerRepo::create(
        &pool,
        &CreateDealer {
            name: "Empty Lot".to_string(),
            description: None,
        },
    )
    .await
    .unwrap();

    DealerRepo::delete(&pool, dealer.id, dealer.concurrency_stamp.as_deref())
        .await
        .unwrap();
    assert!(DealerRepo::find_by_id(&pool, dealer.id).await.unwrap().is_none());
}
