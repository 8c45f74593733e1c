//! Booking expiration engine
//!
//! Walks rentals through their time-based state transitions: closing out
//! finished rentals, cancelling booking requests the owner never answered
//! (including the compensating refund), and emitting owner/customer
//! reminders. Each sweep isolates per-rental failures so one bad record
//! never aborts the rest of the scan.

use anyhow::Result;
use chrono::{Days, Duration, Utc};
use uuid::Uuid;

use crate::config::ExpirationConfig;
use crate::notifications::{NotificationDispatcher, NotificationMessage};
use crate::payments::{RefundGateway, RefundRequest};
use crate::rentals::model::{NewRefund, PayoutStatus, Rental};
use crate::rentals::store::{BookingStore, BookingUnit};
use crate::rentals::time;

/// Gateway reason tag for timeout-driven refunds.
const REFUND_REASON_PENDING_TIMEOUT: &str = "pending_timeout";

/// Outcome of one sweep. `processed` counts *matched* rentals; a rental
/// whose processing failed still counts toward the total.
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub sweep: &'static str,
    pub processed: usize,
    pub success: bool,
    pub error: Option<String>,
}

impl SweepReport {
    fn from_result(sweep: &'static str, result: Result<usize>) -> Self {
        match result {
            Ok(processed) => Self {
                sweep,
                processed,
                success: true,
                error: None,
            },
            Err(e) => {
                tracing::error!(sweep, error = %e, "Sweep query failed");
                Self {
                    sweep,
                    processed: 0,
                    success: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

/// Outcome of one full expiration cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub expired: SweepReport,
    pub pending_timeouts: SweepReport,
    pub owner_reminders: SweepReport,
    pub upcoming_rentals: SweepReport,
}

impl CycleReport {
    pub fn total_processed(&self) -> usize {
        self.expired.processed
            + self.pending_timeouts.processed
            + self.owner_reminders.processed
            + self.upcoming_rentals.processed
    }
}

/// The expiration engine, generic over its three ports so tests can run it
/// entirely against in-memory fakes.
pub struct ExpirationService<S, G, N> {
    store: S,
    gateway: G,
    notifier: N,
    config: ExpirationConfig,
}

impl<S, G, N> ExpirationService<S, G, N>
where
    S: BookingStore,
    G: RefundGateway,
    N: NotificationDispatcher,
{
    pub fn new(store: S, gateway: G, notifier: N, config: ExpirationConfig) -> Self {
        Self {
            store,
            gateway,
            notifier,
            config,
        }
    }

    /// Run the four sweeps in fixed order. A sweep's top-level query failure
    /// is recorded in its report and never prevents the later sweeps.
    pub async fn run_all_checks(&self) -> CycleReport {
        tracing::info!("Running booking expiration checks");

        let expired = SweepReport::from_result("expired", self.check_expired_bookings().await);
        let pending_timeouts =
            SweepReport::from_result("pending_timeouts", self.check_pending_timeouts().await);
        let owner_reminders =
            SweepReport::from_result("owner_reminders", self.send_owner_reminders().await);
        let upcoming_rentals =
            SweepReport::from_result("upcoming_rentals", self.check_upcoming_rentals().await);

        let report = CycleReport {
            expired,
            pending_timeouts,
            owner_reminders,
            upcoming_rentals,
        };

        tracing::info!(
            expired = report.expired.processed,
            pending_timeouts = report.pending_timeouts.processed,
            owner_reminders = report.owner_reminders.processed,
            upcoming_rentals = report.upcoming_rentals.processed,
            "Expiration cycle complete"
        );

        report
    }

    /// Close out rentals whose end date has passed while still `active` or
    /// `approved`: mark completed, free the car, tell both parties.
    pub async fn check_expired_bookings(&self) -> Result<usize> {
        let today = Utc::now().date_naive();
        let rentals = self.store.find_expired(today).await?;

        for rental in &rentals {
            if let Err(e) = self.complete_rental(rental).await {
                tracing::error!(
                    rental_id = %rental.id,
                    error = %e,
                    "Failed to close out expired rental"
                );
            }
        }

        Ok(rentals.len())
    }

    async fn complete_rental(&self, rental: &Rental) -> Result<()> {
        self.store.complete_rental(rental.id).await?;
        self.store.release_car(rental.car_id).await?;

        // Notification failure never reverts the state change above.
        self.notify_quietly(rental.customer_id, NotificationMessage::booking_completed(rental))
            .await;
        self.notify_quietly(
            rental.owner_id,
            NotificationMessage::booking_completed_owner(rental),
        )
        .await;

        tracing::info!(rental_id = %rental.id, car_id = %rental.car_id, "Rental completed, car released");

        Ok(())
    }

    /// Auto-cancel booking requests the owner never answered within the
    /// response window, reversing any captured payment.
    pub async fn check_pending_timeouts(&self) -> Result<usize> {
        let cutoff = Utc::now() - Duration::hours(self.config.owner_response_hours);
        let rentals = self.store.find_pending_older_than(cutoff).await?;

        let reason = format!(
            "Owner did not respond within {} hours",
            self.config.owner_response_hours
        );

        for rental in &rentals {
            if let Err(e) = self.expire_pending_booking(rental, &reason).await {
                tracing::error!(
                    rental_id = %rental.id,
                    error = %e,
                    "Failed to expire pending booking"
                );
            }
        }

        Ok(rentals.len())
    }

    /// The compensation routine: cancel the rental, free the car, and
    /// reverse the money movement, all in one atomic unit. Notifications go
    /// out only after a successful commit.
    ///
    /// A refund-gateway failure is logged and swallowed; the cancellation
    /// still commits and no retry is scheduled. A database failure inside
    /// the unit rolls everything back and propagates to the caller.
    pub async fn expire_pending_booking(&self, rental: &Rental, reason: &str) -> Result<()> {
        let mut unit = self.store.begin().await?;

        if let Err(e) = self.stage_cancellation(unit.as_mut(), rental, reason).await {
            if let Err(rb) = unit.rollback().await {
                tracing::error!(rental_id = %rental.id, error = %rb, "Rollback failed");
            }
            return Err(e);
        }

        unit.commit().await?;

        tracing::info!(rental_id = %rental.id, reason, "Pending booking expired");

        self.notify_quietly(
            rental.customer_id,
            NotificationMessage::booking_request_expired(rental, reason),
        )
        .await;
        self.notify_quietly(
            rental.owner_id,
            NotificationMessage::booking_request_expired_owner(rental, reason),
        )
        .await;

        Ok(())
    }

    async fn stage_cancellation(
        &self,
        unit: &mut dyn BookingUnit,
        rental: &Rental,
        reason: &str,
    ) -> Result<()> {
        unit.cancel_rental(rental.id, reason).await?;
        unit.release_car(rental.car_id).await?;

        let Some(payment) = unit.find_payment(rental.id).await? else {
            return Ok(());
        };

        let intent_id = match payment.payment_intent_id.as_deref() {
            Some(intent_id) if payment.is_refundable() => intent_id.to_string(),
            _ => {
                tracing::debug!(
                    rental_id = %rental.id,
                    "No refundable payment; cancelling without gateway call"
                );
                return Ok(());
            }
        };

        let request =
            RefundRequest::for_rental(intent_id, REFUND_REASON_PENDING_TIMEOUT, rental.id);

        let refund = match self.gateway.create_refund(request).await {
            Ok(refund) => refund,
            Err(e) => {
                // The cancellation stands even when the refund fails; there
                // is no automatic retry of the gateway call.
                tracing::error!(
                    rental_id = %rental.id,
                    payment_id = %payment.id,
                    error = %e,
                    "Refund gateway call failed; booking cancelled without refund"
                );
                return Ok(());
            }
        };

        let now = Utc::now();
        unit.mark_payment_refunded(payment.id, &refund.id, reason, now)
            .await?;

        // Owner was already credited before the timeout fired: claw the
        // share back, clamped at zero.
        if payment.payout_status == PayoutStatus::Paid {
            unit.debit_owner_balance(rental.owner_id, payment.owner_amount)
                .await?;
        }

        unit.insert_refund(NewRefund {
            payment_id: payment.id,
            rental_id: rental.id,
            owner_id: rental.owner_id,
            customer_id: rental.customer_id,
            gateway_refund_id: refund.id,
            amount: payment.total_amount,
            currency: payment.currency.clone(),
            reason: reason.to_string(),
            metadata: serde_json::json!({ "type": REFUND_REASON_PENDING_TIMEOUT }),
        })
        .await?;

        Ok(())
    }

    /// Nudge owners whose pending requests are inside the reminder window
    /// (between the reminder lead and the response deadline). There is no
    /// already-reminded flag: with a check interval shorter than the window,
    /// the same request is reminded on every cycle.
    pub async fn send_owner_reminders(&self) -> Result<usize> {
        let now = Utc::now();
        let oldest = now - Duration::hours(self.config.owner_response_hours);
        let newest = now - Duration::hours(self.config.owner_reminder_hours);
        let rentals = self.store.find_pending_between(oldest, newest).await?;

        for rental in &rentals {
            let hours_left = time::rounded_hours_until_timeout(
                rental.created_at,
                self.config.owner_response_hours,
                now,
            );
            self.notify_quietly(
                rental.owner_id,
                NotificationMessage::owner_response_reminder(rental, hours_left),
            )
            .await;
        }

        Ok(rentals.len())
    }

    /// Remind customers whose approved rental starts today or tomorrow.
    pub async fn check_upcoming_rentals(&self) -> Result<usize> {
        let today = Utc::now().date_naive();
        let tomorrow = today + Days::new(1);
        let rentals = self
            .store
            .find_approved_starting_between(today, tomorrow)
            .await?;

        for rental in &rentals {
            self.notify_quietly(rental.customer_id, NotificationMessage::upcoming_rental(rental))
                .await;
        }

        Ok(rentals.len())
    }

    async fn notify_quietly(&self, user_id: Uuid, message: NotificationMessage) {
        if let Err(e) = self.notifier.notify(user_id, message).await {
            tracing::warn!(user_id = %user_id, error = %e, "Notification dispatch failed");
        }
    }
}
