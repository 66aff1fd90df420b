use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether storage is reachable, logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_booking_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        Err(_) => warn!("storage unavailable (degraded mode)"),
    }

    let subscribers = state.events().subscriber_count();
    if state.is_degraded().await {
        HealthResponse::degraded(subscribers)
    } else {
        HealthResponse::ok(subscribers)
    }
}
