//! Postgres implementation of the booking repository port

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::model::{CarStatus, NewRefund, Payment, PaymentStatus, Rental, RentalPaymentStatus, RentalStatus};
use super::store::{BookingStore, BookingUnit};

/// Booking store backed by the marketplace Postgres database.
#[derive(Clone)]
pub struct PgBookingStore {
    db_pool: PgPool,
}

impl PgBookingStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn find_expired(&self, last_end_date: NaiveDate) -> Result<Vec<Rental>> {
        let rentals = sqlx::query_as::<_, Rental>(
            r#"
            SELECT * FROM rentals
            WHERE status IN ('active', 'approved')
              AND end_date <= $1
            ORDER BY end_date ASC
            "#,
        )
        .bind(last_end_date)
        .fetch_all(&self.db_pool)
        .await
        .context("Failed to query expired rentals")?;

        Ok(rentals)
    }

    async fn find_pending_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<Rental>> {
        let rentals = sqlx::query_as::<_, Rental>(
            r#"
            SELECT * FROM rentals
            WHERE status = 'pending_approval'
              AND created_at < $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.db_pool)
        .await
        .context("Failed to query timed-out pending rentals")?;

        Ok(rentals)
    }

    async fn find_pending_between(
        &self,
        oldest: DateTime<Utc>,
        newest: DateTime<Utc>,
    ) -> Result<Vec<Rental>> {
        let rentals = sqlx::query_as::<_, Rental>(
            r#"
            SELECT * FROM rentals
            WHERE status = 'pending_approval'
              AND created_at >= $1
              AND created_at < $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(oldest)
        .bind(newest)
        .fetch_all(&self.db_pool)
        .await
        .context("Failed to query pending rentals in reminder window")?;

        Ok(rentals)
    }

    async fn find_approved_starting_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Rental>> {
        let rentals = sqlx::query_as::<_, Rental>(
            r#"
            SELECT * FROM rentals
            WHERE status = 'approved'
              AND start_date >= $1
              AND start_date <= $2
            ORDER BY start_date ASC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.db_pool)
        .await
        .context("Failed to query approved rentals near start")?;

        Ok(rentals)
    }

    async fn complete_rental(&self, rental_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE rentals
            SET status = $1, updated_at = $2
            WHERE id = $3
            "#,
        )
        .bind(RentalStatus::Completed)
        .bind(Utc::now())
        .bind(rental_id)
        .execute(&self.db_pool)
        .await
        .context("Failed to mark rental completed")?;

        Ok(())
    }

    async fn release_car(&self, car_id: Uuid) -> Result<()> {
        release_car_query(car_id)
            .execute(&self.db_pool)
            .await
            .context("Failed to release car")?;

        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn BookingUnit>> {
        let tx = self
            .db_pool
            .begin()
            .await
            .context("Failed to open booking transaction")?;

        Ok(Box::new(PgBookingUnit { tx }))
    }
}

fn release_car_query(car_id: Uuid) -> sqlx::query::Query<'static, Postgres, sqlx::postgres::PgArguments> {
    sqlx::query(
        r#"
        UPDATE cars
        SET is_available = TRUE, status = $1, updated_at = $2
        WHERE id = $3
        "#,
    )
    .bind(CarStatus::Available)
    .bind(Utc::now())
    .bind(car_id)
}

/// One open compensation transaction against the booking tables.
pub struct PgBookingUnit {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl BookingUnit for PgBookingUnit {
    async fn cancel_rental(&mut self, rental_id: Uuid, reason: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE rentals
            SET status = $1, payment_status = $2, rejection_reason = $3, updated_at = $4
            WHERE id = $5
            "#,
        )
        .bind(RentalStatus::Cancelled)
        .bind(RentalPaymentStatus::Refunded)
        .bind(reason)
        .bind(Utc::now())
        .bind(rental_id)
        .execute(&mut *self.tx)
        .await
        .context("Failed to cancel rental")?;

        Ok(())
    }

    async fn release_car(&mut self, car_id: Uuid) -> Result<()> {
        release_car_query(car_id)
            .execute(&mut *self.tx)
            .await
            .context("Failed to release car")?;

        Ok(())
    }

    async fn find_payment(&mut self, rental_id: Uuid) -> Result<Option<Payment>> {
        // Lock the payment row for the rest of the unit so a concurrent
        // sweep cycle serializes here instead of double-refunding.
        let payment = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE rental_id = $1 FOR UPDATE",
        )
        .bind(rental_id)
        .fetch_optional(&mut *self.tx)
        .await
        .context("Failed to look up payment for rental")?;

        Ok(payment)
    }

    async fn mark_payment_refunded(
        &mut self,
        payment_id: Uuid,
        gateway_refund_id: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let refund_meta = serde_json::json!({
            "refund": {
                "refunded_at": now,
                "reason": reason,
                "gateway_refund_id": gateway_refund_id,
            }
        });

        sqlx::query(
            r#"
            UPDATE payments
            SET payment_status = $1, metadata = metadata || $2, updated_at = $3
            WHERE id = $4
            "#,
        )
        .bind(PaymentStatus::Refunded)
        .bind(refund_meta)
        .bind(now)
        .bind(payment_id)
        .execute(&mut *self.tx)
        .await
        .context("Failed to mark payment refunded")?;

        Ok(())
    }

    async fn debit_owner_balance(&mut self, owner_id: Uuid, amount: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE owner_profiles
            SET total_earnings = GREATEST(total_earnings - $1, 0),
                available_balance = GREATEST(available_balance - $1, 0),
                updated_at = $2
            WHERE user_id = $3
            "#,
        )
        .bind(amount)
        .bind(Utc::now())
        .bind(owner_id)
        .execute(&mut *self.tx)
        .await
        .context("Failed to reverse owner balance")?;

        Ok(())
    }

    async fn insert_refund(&mut self, refund: NewRefund) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO refunds (
                id, payment_id, rental_id, owner_id, customer_id,
                gateway_refund_id, amount, currency, reason, metadata, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(refund.payment_id)
        .bind(refund.rental_id)
        .bind(refund.owner_id)
        .bind(refund.customer_id)
        .bind(&refund.gateway_refund_id)
        .bind(refund.amount)
        .bind(&refund.currency)
        .bind(&refund.reason)
        .bind(&refund.metadata)
        .bind(Utc::now())
        .execute(&mut *self.tx)
        .await
        .context("Failed to insert refund audit record")?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx
            .commit()
            .await
            .context("Failed to commit booking transaction")?;

        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx
            .rollback()
            .await
            .context("Failed to roll back booking transaction")?;

        Ok(())
    }
}
