use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::{
    error::ServiceError,
    services::booking_service::apply_status_change,
    state::{
        SharedState,
        clock::date_of,
        lifecycle::{BookingStatus, StatusChange},
    },
};

/// Periodically expire pending bookings whose payment hold ran out.
pub async fn run(state: SharedState) {
    let mut ticker = interval(state.config().sweep_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if state.is_degraded().await {
            debug!("skipping expiry sweep while degraded");
            continue;
        }
        match sweep_once(&state).await {
            Ok(0) => {}
            Ok(expired) => info!(expired, "expired stale booking holds"),
            Err(err) => warn!(error = %err, "expiry sweep failed"),
        }
    }
}

/// Expire every stale hold once and drop slot claims of past days; returns how many bookings
/// were expired.
///
/// Bookings changed concurrently (paid or cancelled in the meantime) are skipped.
pub async fn sweep_once(state: &SharedState) -> Result<usize, ServiceError> {
    let store = state.require_booking_store().await?;
    let now = state.now();

    let pruned = store.prune_claims(date_of(now)).await?;
    if pruned > 0 {
        debug!(pruned, "dropped slot claims of past days");
    }

    let stale = store.list_stale_holds(now).await?;
    let mut expired = 0;

    for booking in stale {
        let invoice = booking.invoice_number.clone();
        match apply_status_change(
            state,
            &store,
            booking,
            StatusChange::status(BookingStatus::Expired),
            None,
            None,
        )
        .await
        {
            Ok(updated) if updated.status == BookingStatus::Expired => expired += 1,
            Ok(_) => {}
            Err(ServiceError::InvalidTransition(reason)) => {
                debug!(%invoice, %reason, "booking left the hold before it could expire");
            }
            Err(err) => return Err(err),
        }
    }

    Ok(expired)
}
