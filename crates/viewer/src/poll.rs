//! Availability polling.

use crate::client::ViewerClient;
use layerscope_protocol::Availability;
use layerscope_protocol::timing::{POLL_BUDGET, POLL_INTERVAL};
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::debug;

/// Poll the hub at `interval` until a terminal state arrives or `budget`
/// is exhausted, in which case the page counts as not found.
///
/// A single failed round-trip (timeout, no responder yet) is "still
/// loading", not an error: the hub may simply not have initialized.
pub async fn poll_status(
    client: &ViewerClient,
    interval: Duration,
    budget: Duration,
) -> Availability {
    let deadline = Instant::now() + budget;

    loop {
        match client.status().await {
            Ok(status) if status.is_terminal() => return status,
            Ok(_still_loading) => {}
            Err(error) => {
                debug!(%error, "status poll failed, treating as still loading");
            }
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Availability::NotFound;
        }
        sleep(interval.min(remaining)).await;
    }
}

/// [`poll_status`] with the stock cadence and budget.
pub async fn poll_status_default(client: &ViewerClient) -> Availability {
    poll_status(client, POLL_INTERVAL, POLL_BUDGET).await
}
