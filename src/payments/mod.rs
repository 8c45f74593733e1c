//! Refund gateway port
//!
//! The engine only needs one capability from the payment processor: reverse
//! a previously captured charge. The wire protocol lives behind this trait;
//! [`http::HttpRefundGateway`] is the production client and tests substitute
//! a fake.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub use http::HttpRefundGateway;

/// Refund gateway errors
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Refund request failed: {0}")]
    Request(String),

    #[error("Refund rejected by gateway: {0}")]
    Rejected(String),
}

/// Full refund of a captured payment intent.
#[derive(Debug, Clone, Serialize)]
pub struct RefundRequest {
    pub payment_intent_id: String,
    pub reason: String,
    pub metadata: HashMap<String, String>,
}

impl RefundRequest {
    /// Refund tagged with a machine-readable reason and the rental it
    /// compensates.
    pub fn for_rental(payment_intent_id: String, reason: &str, rental_id: uuid::Uuid) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert("reason".to_string(), reason.to_string());
        metadata.insert("rental_id".to_string(), rental_id.to_string());

        Self {
            payment_intent_id,
            reason: reason.to_string(),
            metadata,
        }
    }
}

/// Gateway's view of a created refund.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayRefund {
    pub id: String,
    pub status: String,
}

/// Capability to reverse a captured charge at the payment processor.
#[async_trait]
pub trait RefundGateway: Send + Sync {
    async fn create_refund(&self, request: RefundRequest) -> Result<GatewayRefund, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_refund_request_metadata_tags() {
        let rental_id = Uuid::new_v4();
        let request = RefundRequest::for_rental("pi_123".to_string(), "pending_timeout", rental_id);

        assert_eq!(request.payment_intent_id, "pi_123");
        assert_eq!(request.reason, "pending_timeout");
        assert_eq!(
            request.metadata.get("rental_id"),
            Some(&rental_id.to_string())
        );
        assert_eq!(
            request.metadata.get("reason"),
            Some(&"pending_timeout".to_string())
        );
    }
}
