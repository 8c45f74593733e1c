//! Booking models and data structures for the DriveHub worker

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

/// Rental model - one booking of one car by one customer
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Rental {
    pub id: Uuid,
    pub car_id: Uuid,
    pub customer_id: Uuid,
    pub owner_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: RentalStatus,
    pub payment_status: RentalPaymentStatus,
    pub total_amount: i64, // Minor currency units
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Rental lifecycle status; transitions only move forward
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "rental_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RentalStatus {
    PendingApproval, // Awaiting owner response
    Approved,        // Owner accepted, not yet started
    Active,          // Customer has the car
    Completed,       // Past its end date
    Cancelled,       // Cancelled (by a party or by timeout)
    Rejected,        // Owner declined
}

/// Payment state as seen on the rental row
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "rental_payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RentalPaymentStatus {
    Pending,
    Paid,
    Refunded,
    Failed,
}

/// Car availability record
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Car {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub is_available: bool,
    pub status: CarStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "car_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CarStatus {
    Available,
    Rented,
    Maintenance,
}

/// Captured payment, one-to-one with a rental
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Payment {
    pub id: Uuid,
    pub rental_id: Uuid,
    pub payment_intent_id: Option<String>,
    pub payment_status: PaymentStatus,
    pub payout_status: PayoutStatus,
    pub owner_amount: i64,
    pub total_amount: i64,
    pub currency: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// A refund is only attempted against a captured charge with a known
    /// gateway intent id.
    pub fn is_refundable(&self) -> bool {
        self.payment_status == PaymentStatus::Succeeded && self.payment_intent_id.is_some()
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Refunded,
    Failed,
}

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "payout_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Pending,
    Paid,
}

/// Owner running balance; both fields are clamped at zero on reversal
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct OwnerProfile {
    pub user_id: Uuid,
    pub total_earnings: i64,
    pub available_balance: i64,
    pub updated_at: DateTime<Utc>,
}

/// Append-only refund audit row
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Refund {
    pub id: Uuid,
    pub payment_id: Uuid,
    pub rental_id: Uuid,
    pub owner_id: Uuid,
    pub customer_id: Uuid,
    pub gateway_refund_id: String,
    pub amount: i64,
    pub currency: String,
    pub reason: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Insert DTO for the refund audit trail
#[derive(Debug, Clone)]
pub struct NewRefund {
    pub payment_id: Uuid,
    pub rental_id: Uuid,
    pub owner_id: Uuid,
    pub customer_id: Uuid,
    pub gateway_refund_id: String,
    pub amount: i64,
    pub currency: String,
    pub reason: String,
    pub metadata: serde_json::Value,
}
