use std::collections::BTreeSet;

use serde::Serialize;
use time::Date;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dao::models::BookingEntity,
    dto::sse::{
        BOOKING_EXPIRED, BOOKING_UPDATED, BookingStatusEvent, SLOT_AVAILABILITY_UPDATED,
        ServerEvent, SlotAvailability, SlotAvailabilityEvent,
    },
    state::{SharedState, clock::format_date, lifecycle::TransitionNotice, slots::Slot},
};

/// Announce that a group of slots of a court changed availability.
pub fn broadcast_slot_availability(
    state: &SharedState,
    court_id: Uuid,
    date: Date,
    slots: &BTreeSet<Slot>,
    availability: SlotAvailability,
) {
    let payload = SlotAvailabilityEvent {
        court_id,
        date: format_date(date),
        time_slots: slots.iter().map(ToString::to_string).collect(),
        availability,
    };
    send_event(state, SLOT_AVAILABILITY_UPDATED, &payload);
}

/// Announce the new status of a booking.
pub fn broadcast_booking_status(
    state: &SharedState,
    booking: &BookingEntity,
    notice: TransitionNotice,
) {
    let kind = match notice {
        TransitionNotice::Updated => BOOKING_UPDATED,
        TransitionNotice::Expired => BOOKING_EXPIRED,
    };
    let payload = BookingStatusEvent {
        invoice_number: booking.invoice_number.clone(),
        status: booking.status,
        payment_status: booking.payment_status,
        id: booking.id,
    };
    send_event(state, kind, &payload);
}

fn send_event(state: &SharedState, kind: &str, payload: &impl Serialize) {
    match ServerEvent::typed(kind, payload) {
        Ok(event) => state.events().broadcast(event),
        Err(err) => warn!(event = kind, error = %err, "failed to serialize SSE payload"),
    }
}
