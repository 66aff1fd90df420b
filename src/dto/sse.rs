use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::lifecycle::{BookingStatus, PaymentStatus};

/// Event type announcing a change in slot availability.
pub const SLOT_AVAILABILITY_UPDATED: &str = "SLOT_AVAILABILITY_UPDATED";
/// Event type announcing a booking status change.
pub const BOOKING_UPDATED: &str = "BOOKING_UPDATED";
/// Event type announcing that a booking hold ran out.
pub const BOOKING_EXPIRED: &str = "BOOKING_EXPIRED";
/// Event type sent once when a client subscribes.
pub const CONNECTED: &str = "CONNECTED";
/// Event type telling a lagging client it missed events and must re-fetch.
pub const RESYNC_REQUIRED: &str = "RESYNC_REQUIRED";

#[derive(Clone, Debug)]
/// Dispatched payload carried across the SSE channel.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }

    /// Build a frame named `kind` whose data is the `{type, payload}` envelope.
    pub fn typed<T: Serialize>(kind: &str, payload: &T) -> serde_json::Result<Self> {
        Self::json(Some(kind.to_owned()), &EventEnvelope { kind, payload })
    }
}

#[derive(Debug, Serialize)]
/// JSON body of every SSE frame.
pub struct EventEnvelope<'a, T> {
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub payload: &'a T,
}

/// Availability announced for a group of slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SlotAvailability {
    /// Held by a pending booking awaiting payment.
    PendingPayment,
    Booked,
    Available,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Payload of `SLOT_AVAILABILITY_UPDATED`.
pub struct SlotAvailabilityEvent {
    pub court_id: Uuid,
    /// `YYYY-MM-DD`
    pub date: String,
    pub time_slots: Vec<String>,
    pub availability: SlotAvailability,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Payload of `BOOKING_UPDATED` and `BOOKING_EXPIRED`.
pub struct BookingStatusEvent {
    pub invoice_number: String,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
/// Handshake sent to an SSE client when it connects.
pub struct ConnectedEvent {
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Sent when a client fell behind and events were dropped.
pub struct ResyncRequiredEvent {
    /// Number of events the client missed.
    pub missed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_event_wraps_payload_in_envelope() {
        let court_id = Uuid::nil();
        let event = ServerEvent::typed(
            SLOT_AVAILABILITY_UPDATED,
            &SlotAvailabilityEvent {
                court_id,
                date: "2025-01-10".into(),
                time_slots: vec!["10:00".into()],
                availability: SlotAvailability::PendingPayment,
            },
        )
        .unwrap();

        assert_eq!(event.event.as_deref(), Some(SLOT_AVAILABILITY_UPDATED));
        let body: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(body["type"], SLOT_AVAILABILITY_UPDATED);
        assert_eq!(body["payload"]["courtId"], court_id.to_string());
        assert_eq!(body["payload"]["timeSlots"][0], "10:00");
        assert_eq!(body["payload"]["availability"], "pending_payment");
    }
}
