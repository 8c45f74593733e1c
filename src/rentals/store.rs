//! Booking repository port
//!
//! The expiration engine talks to storage through these traits so the
//! Postgres implementation can be swapped for an in-memory fake in tests.
//! Window finders take explicit bounds computed by the engine, which keeps
//! every implementation filtering on exactly the same predicate.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::model::{NewRefund, Payment, Rental};

/// Read/write access to rentals and their associated records.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Rentals in `active`/`approved` whose end date is on or before
    /// `last_end_date` (the end-of-today boundary collapsed to a date).
    async fn find_expired(&self, last_end_date: NaiveDate) -> Result<Vec<Rental>>;

    /// Rentals still `pending_approval` created strictly before `cutoff`.
    async fn find_pending_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<Rental>>;

    /// Rentals still `pending_approval` with `oldest <= created_at < newest`.
    async fn find_pending_between(
        &self,
        oldest: DateTime<Utc>,
        newest: DateTime<Utc>,
    ) -> Result<Vec<Rental>>;

    /// Rentals in `approved` starting within `[from, to]` inclusive.
    async fn find_approved_starting_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Rental>>;

    /// Mark a rental `completed`. Not transactional with `release_car`;
    /// the expired sweep applies the two writes independently.
    async fn complete_rental(&self, rental_id: Uuid) -> Result<()>;

    /// Make a car bookable again (`is_available = true`, status `available`).
    async fn release_car(&self, car_id: Uuid) -> Result<()>;

    /// Open the atomic unit used by the pending-timeout compensation routine.
    async fn begin(&self) -> Result<Box<dyn BookingUnit>>;
}

/// The compensation routine's transactional surface. All writes staged on a
/// unit commit together or not at all; dropping a unit without committing
/// discards them.
#[async_trait]
pub trait BookingUnit: Send {
    /// Cancel a pending rental: status `cancelled`, payment status
    /// `refunded`, rejection reason recorded.
    async fn cancel_rental(&mut self, rental_id: Uuid, reason: &str) -> Result<()>;

    async fn release_car(&mut self, car_id: Uuid) -> Result<()>;

    async fn find_payment(&mut self, rental_id: Uuid) -> Result<Option<Payment>>;

    /// Mark the payment refunded and append refund metadata (timestamp,
    /// reason, gateway refund id).
    async fn mark_payment_refunded(
        &mut self,
        payment_id: Uuid,
        gateway_refund_id: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<()>;

    /// Subtract `amount` from the owner's total earnings and available
    /// balance, clamping both at zero.
    async fn debit_owner_balance(&mut self, owner_id: Uuid, amount: i64) -> Result<()>;

    async fn insert_refund(&mut self, refund: NewRefund) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}
