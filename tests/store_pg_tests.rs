//! Postgres booking store round-trip tests
//!
//! These run against a disposable database and are ignored by default;
//! point TEST_DATABASE_URL at a scratch Postgres instance to enable them.

use chrono::{Days, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use drivehub_worker::rentals::model::RentalStatus;
use drivehub_worker::rentals::store::BookingStore;
use drivehub_worker::rentals::PgBookingStore;

/// Helper to create a test database pool
async fn setup_test_db() -> PgPool {
    let database_url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| "postgresql://localhost/drivehub_test".to_string());

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

async fn seed_rental(pool: &PgPool, status: RentalStatus, end_days_ago: u64) -> (Uuid, Uuid) {
    let car_id = Uuid::new_v4();
    let rental_id = Uuid::new_v4();
    let owner_id = Uuid::new_v4();
    let today = Utc::now().date_naive();

    sqlx::query(
        "INSERT INTO cars (id, owner_id, is_available, status) VALUES ($1, $2, FALSE, 'rented')",
    )
    .bind(car_id)
    .bind(owner_id)
    .execute(pool)
    .await
    .expect("Failed to seed car");

    sqlx::query(
        r#"
        INSERT INTO rentals (
            id, car_id, customer_id, owner_id, start_date, end_date,
            status, payment_status, total_amount, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'paid', 10000, $8, $8)
        "#,
    )
    .bind(rental_id)
    .bind(car_id)
    .bind(Uuid::new_v4())
    .bind(owner_id)
    .bind(today - Days::new(end_days_ago + 2))
    .bind(today - Days::new(end_days_ago))
    .bind(status)
    .bind(Utc::now() - Duration::days(end_days_ago as i64 + 2))
    .execute(pool)
    .await
    .expect("Failed to seed rental");

    (rental_id, car_id)
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_find_expired_and_complete_round_trip() {
    let pool = setup_test_db().await;
    let store = PgBookingStore::new(pool.clone());

    let (rental_id, car_id) = seed_rental(&pool, RentalStatus::Active, 1).await;

    let today = Utc::now().date_naive();
    let expired = store.find_expired(today).await.expect("query failed");
    assert!(expired.iter().any(|r| r.id == rental_id));

    store.complete_rental(rental_id).await.expect("update failed");
    store.release_car(car_id).await.expect("update failed");

    let status: (RentalStatus,) =
        sqlx::query_as("SELECT status FROM rentals WHERE id = $1")
            .bind(rental_id)
            .fetch_one(&pool)
            .await
            .expect("fetch failed");
    assert_eq!(status.0, RentalStatus::Completed);

    let available: (bool,) = sqlx::query_as("SELECT is_available FROM cars WHERE id = $1")
        .bind(car_id)
        .fetch_one(&pool)
        .await
        .expect("fetch failed");
    assert!(available.0);
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_unit_rollback_discards_cancellation() {
    let pool = setup_test_db().await;
    let store = PgBookingStore::new(pool.clone());

    let (rental_id, car_id) = seed_rental(&pool, RentalStatus::PendingApproval, 0).await;

    let mut unit = store.begin().await.expect("begin failed");
    unit.cancel_rental(rental_id, "Owner did not respond within 24 hours")
        .await
        .expect("cancel failed");
    unit.release_car(car_id).await.expect("release failed");
    unit.rollback().await.expect("rollback failed");

    let status: (RentalStatus,) =
        sqlx::query_as("SELECT status FROM rentals WHERE id = $1")
            .bind(rental_id)
            .fetch_one(&pool)
            .await
            .expect("fetch failed");
    assert_eq!(status.0, RentalStatus::PendingApproval);
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_unit_commit_applies_cancellation() {
    let pool = setup_test_db().await;
    let store = PgBookingStore::new(pool.clone());

    let (rental_id, car_id) = seed_rental(&pool, RentalStatus::PendingApproval, 0).await;

    let mut unit = store.begin().await.expect("begin failed");
    unit.cancel_rental(rental_id, "Owner did not respond within 24 hours")
        .await
        .expect("cancel failed");
    unit.release_car(car_id).await.expect("release failed");
    unit.commit().await.expect("commit failed");

    let row: (RentalStatus, Option<String>) =
        sqlx::query_as("SELECT status, rejection_reason FROM rentals WHERE id = $1")
            .bind(rental_id)
            .fetch_one(&pool)
            .await
            .expect("fetch failed");
    assert_eq!(row.0, RentalStatus::Cancelled);
    assert!(row.1.is_some());
}
