//! Periodic driver for the expiration engine

use std::sync::Arc;
use std::time::Duration;

use crate::notifications::NotificationDispatcher;
use crate::payments::RefundGateway;
use crate::rentals::store::BookingStore;

use super::service::ExpirationService;

/// Run one cycle immediately, then keep cycling on a fixed interval.
///
/// There is no overlap protection: a cycle that outlasts the interval delays
/// the next one (the loop is sequential), but a second checker task started
/// by mistake would race this one.
pub async fn run_expiration_checker<S, G, N>(
    engine: Arc<ExpirationService<S, G, N>>,
    interval: Duration,
) where
    S: BookingStore,
    G: RefundGateway,
    N: NotificationDispatcher,
{
    tracing::info!(
        interval_secs = interval.as_secs(),
        "Starting booking expiration checker"
    );

    loop {
        engine.run_all_checks().await;
        tokio::time::sleep(interval).await;
    }
}
