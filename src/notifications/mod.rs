//! Notification dispatcher port and the engine's message templates
//!
//! Delivery is best-effort: the engine logs dispatch failures and moves on,
//! a lost notification never reverts a booking state change.

pub mod pg;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::rentals::model::Rental;

pub use pg::PgNotificationDispatcher;

/// Engine-triggered message kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BookingCompleted,
    BookingCompletedOwner,
    BookingRequestExpired,
    BookingRequestExpiredOwner,
    OwnerResponseReminder,
    UpcomingRental,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::BookingCompleted => "booking_completed",
            NotificationKind::BookingCompletedOwner => "booking_completed_owner",
            NotificationKind::BookingRequestExpired => "booking_request_expired",
            NotificationKind::BookingRequestExpiredOwner => "booking_request_expired_owner",
            NotificationKind::OwnerResponseReminder => "owner_response_reminder",
            NotificationKind::UpcomingRental => "upcoming_rental",
        }
    }
}

/// Message priority as persisted on the notification row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Normal,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Normal => "normal",
            Priority::High => "high",
        }
    }
}

/// A rendered notification ready for dispatch.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationMessage {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub payload: serde_json::Value,
    pub priority: Priority,
}

impl NotificationMessage {
    fn rental_payload(rental: &Rental) -> serde_json::Value {
        serde_json::json!({
            "rental_id": rental.id,
            "car_id": rental.car_id,
            "start_date": rental.start_date,
            "end_date": rental.end_date,
        })
    }

    /// Customer copy when a finished rental is closed out.
    pub fn booking_completed(rental: &Rental) -> Self {
        Self {
            kind: NotificationKind::BookingCompleted,
            title: "Your rental is complete".to_string(),
            message: format!(
                "Your rental ending {} has been marked as completed. Thanks for driving with us!",
                rental.end_date
            ),
            payload: Self::rental_payload(rental),
            priority: Priority::Normal,
        }
    }

    /// Owner copy when a finished rental is closed out and the car freed.
    pub fn booking_completed_owner(rental: &Rental) -> Self {
        Self {
            kind: NotificationKind::BookingCompletedOwner,
            title: "Rental completed".to_string(),
            message: format!(
                "The rental of your car ending {} is complete. The car is available for new bookings.",
                rental.end_date
            ),
            payload: Self::rental_payload(rental),
            priority: Priority::Normal,
        }
    }

    /// Customer copy when a pending request times out and is cancelled.
    pub fn booking_request_expired(rental: &Rental, reason: &str) -> Self {
        Self {
            kind: NotificationKind::BookingRequestExpired,
            title: "Booking request expired".to_string(),
            message: format!(
                "Your booking request was cancelled: {reason}. Any captured payment has been refunded."
            ),
            payload: Self::rental_payload(rental),
            priority: Priority::High,
        }
    }

    /// Owner copy for the same timeout.
    pub fn booking_request_expired_owner(rental: &Rental, reason: &str) -> Self {
        Self {
            kind: NotificationKind::BookingRequestExpiredOwner,
            title: "Booking request expired".to_string(),
            message: format!("A booking request for your car was cancelled: {reason}."),
            payload: Self::rental_payload(rental),
            priority: Priority::Normal,
        }
    }

    /// Nudge to the owner before the response window closes.
    pub fn owner_response_reminder(rental: &Rental, hours_left: i64) -> Self {
        Self {
            kind: NotificationKind::OwnerResponseReminder,
            title: "Booking request awaiting your response".to_string(),
            message: format!(
                "A booking request for your car expires in about {hours_left} hour(s). Approve or decline before it is cancelled automatically."
            ),
            payload: serde_json::json!({
                "rental_id": rental.id,
                "car_id": rental.car_id,
                "hours_left": hours_left,
            }),
            priority: Priority::High,
        }
    }

    /// Customer heads-up that an approved rental starts today or tomorrow.
    pub fn upcoming_rental(rental: &Rental) -> Self {
        Self {
            kind: NotificationKind::UpcomingRental,
            title: "Your rental starts soon".to_string(),
            message: format!(
                "Reminder: your approved rental starts on {}. Safe travels!",
                rental.start_date
            ),
            payload: Self::rental_payload(rental),
            priority: Priority::Normal,
        }
    }
}

/// Capability to deliver a message to a user (persisted + emailed).
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn notify(&self, user_id: Uuid, message: NotificationMessage) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rentals::model::{RentalPaymentStatus, RentalStatus};
    use chrono::{NaiveDate, Utc};

    fn rental() -> Rental {
        Rental {
            id: Uuid::new_v4(),
            car_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            start_date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 12).unwrap(),
            status: RentalStatus::PendingApproval,
            payment_status: RentalPaymentStatus::Paid,
            total_amount: 10_000,
            rejection_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_owner_reminder_includes_countdown() {
        let message = NotificationMessage::owner_response_reminder(&rental(), 7);
        assert_eq!(message.kind, NotificationKind::OwnerResponseReminder);
        assert!(message.message.contains("7 hour"));
        assert_eq!(message.payload["hours_left"], 7);
    }

    #[test]
    fn test_expiry_message_carries_reason() {
        let message =
            NotificationMessage::booking_request_expired(&rental(), "Owner did not respond");
        assert!(message.message.contains("Owner did not respond"));
        assert_eq!(message.priority, Priority::High);
    }

    #[test]
    fn test_payload_references_rental() {
        let r = rental();
        let message = NotificationMessage::booking_completed(&r);
        assert_eq!(message.payload["rental_id"], serde_json::json!(r.id));
    }
}
