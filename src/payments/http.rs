//! HTTP client for the payments service refund endpoint

use async_trait::async_trait;
use reqwest::Client;

use super::{GatewayError, GatewayRefund, RefundGateway, RefundRequest};

/// Thin client for the payments service. A refund is a single
/// `POST {base_url}/refunds`; the service wraps the processor SDK and owns
/// retries, authentication, and the wire protocol.
pub struct HttpRefundGateway {
    client: Client,
    base_url: String,
}

impl HttpRefundGateway {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl RefundGateway for HttpRefundGateway {
    async fn create_refund(&self, request: RefundRequest) -> Result<GatewayRefund, GatewayError> {
        let url = format!("{}/refunds", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected(format!("{status}: {body}")));
        }

        let refund = response
            .json::<GatewayRefund>()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        tracing::info!(
            refund_id = %refund.id,
            payment_intent = %request.payment_intent_id,
            "Gateway refund created"
        );

        Ok(refund)
    }
}
