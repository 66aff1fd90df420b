//! Derives the free/booked board of a court from its blocking bookings.

use std::{
    collections::{BTreeSet, HashMap},
    time::SystemTime,
};

use uuid::Uuid;

use crate::{
    dao::models::{BookingEntity, BookingQuery, CourtEntity},
    dto::{
        booking::{CourtAvailabilityResponse, SlotState, SlotStatusResponse},
        directory::CourtResponse,
    },
    error::ServiceError,
    state::{
        SharedState,
        clock::parse_date,
        lifecycle::BookingStatus,
        slots::{OperatingHours, Slot},
    },
};

/// Union of the slots held by bookings that still block at `now`.
pub fn blocked_slots(bookings: &[BookingEntity], now: SystemTime) -> BTreeSet<Slot> {
    bookings
        .iter()
        .filter(|booking| booking.blocks_slots(now))
        .flat_map(|booking| booking.time_slots.iter().copied())
        .collect()
}

/// One entry per bookable slot of the operating window.
pub fn slot_board(hours: &OperatingHours, blocked: &BTreeSet<Slot>) -> Vec<SlotStatusResponse> {
    hours
        .slots()
        .map(|slot| SlotStatusResponse {
            time: slot.to_string(),
            status: if blocked.contains(&slot) {
                SlotState::Booked
            } else {
                SlotState::Available
            },
        })
        .collect()
}

pub(crate) fn parse_day(raw: &str) -> Result<time::Date, ServiceError> {
    parse_date(raw)
        .map_err(|_| ServiceError::InvalidInput(format!("`{raw}` is not a YYYY-MM-DD date")))
}

/// Availability board of one court on one day.
pub async fn available_slots(
    state: &SharedState,
    court_id: Uuid,
    date: &str,
) -> Result<Vec<SlotStatusResponse>, ServiceError> {
    let date = parse_day(date)?;
    let store = state.require_booking_store().await?;
    store
        .find_court(court_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("court {court_id}")))?;

    let bookings = store
        .list_bookings(BookingQuery::blocking_on(court_id, date))
        .await?;
    let blocked = blocked_slots(&bookings, state.now());
    Ok(slot_board(state.config().operating_hours(), &blocked))
}

/// Courts, optionally of one arena, each with its availability board for the day.
pub async fn courts_with_availability(
    state: &SharedState,
    arena_id: Option<Uuid>,
    date: &str,
) -> Result<Vec<CourtAvailabilityResponse>, ServiceError> {
    let date = parse_day(date)?;
    let store = state.require_booking_store().await?;

    let arenas: HashMap<Uuid, _> = store
        .list_arenas()
        .await?
        .into_iter()
        .map(|arena| (arena.id, arena))
        .collect();
    if let Some(arena_id) = arena_id {
        if !arenas.contains_key(&arena_id) {
            return Err(ServiceError::NotFound(format!("arena {arena_id}")));
        }
    }

    let courts: Vec<CourtEntity> = store.list_courts(arena_id).await?;
    let day_bookings = store
        .list_bookings(BookingQuery {
            arena_id,
            booking_date: Some(date),
            statuses: Some(BookingStatus::BLOCKING.to_vec()),
            ..BookingQuery::default()
        })
        .await?;

    let now = state.now();
    let hours = state.config().operating_hours();
    let mut result = Vec::with_capacity(courts.len());
    for court in courts {
        let court_bookings: Vec<BookingEntity> = day_bookings
            .iter()
            .filter(|booking| booking.court_id == court.id)
            .cloned()
            .collect();
        let slots = slot_board(hours, &blocked_slots(&court_bookings, now));
        let booked_slots = slots
            .iter()
            .filter(|slot| slot.status == SlotState::Booked)
            .count();
        let effective_price_per_hour = arenas
            .get(&court.arena_id)
            .map(|arena| court.hourly_rate(arena))
            .or(court.price_per_hour)
            .unwrap_or_default();

        result.push(CourtAvailabilityResponse {
            court: CourtResponse::from(court),
            effective_price_per_hour,
            available_slots: slots.len() - booked_slots,
            booked_slots,
            slots,
        });
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use time::macros::date;

    use super::*;
    use crate::state::lifecycle::PaymentStatus;

    fn booking(status: BookingStatus, slots: &[&str], expiry_time: SystemTime) -> BookingEntity {
        BookingEntity {
            id: Uuid::new_v4(),
            invoice_number: "INV-TEST".into(),
            user_id: Uuid::new_v4(),
            court_id: Uuid::nil(),
            arena_id: Uuid::nil(),
            booking_date: date!(2025 - 01 - 10),
            time_slots: slots.iter().map(|label| label.parse().unwrap()).collect(),
            start_time: String::new(),
            end_time: String::new(),
            total_price: 0,
            service_fee: 0,
            protection_fee: 0,
            discount_amount: 0,
            final_total_amount: 0,
            status,
            payment_status: PaymentStatus::Unpaid,
            payment_method: None,
            applied_voucher_id: None,
            voucher_redeemed: false,
            notes: None,
            expiry_time,
            created_at: SystemTime::UNIX_EPOCH,
            updated_at: SystemTime::UNIX_EPOCH,
            version: 0,
        }
    }

    #[test]
    fn expired_holds_and_cancellations_do_not_block() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(10_000);
        let bookings = vec![
            booking(BookingStatus::Pending, &["08:00"], now + Duration::from_secs(60)),
            booking(BookingStatus::Pending, &["09:00"], now - Duration::from_secs(60)),
            booking(BookingStatus::Confirmed, &["10:00", "11:00"], now),
            booking(BookingStatus::Cancelled, &["12:00"], now),
            booking(BookingStatus::Completed, &["13:00"], now),
        ];

        let blocked = blocked_slots(&bookings, now);
        let labels: Vec<String> = blocked.iter().map(ToString::to_string).collect();
        assert_eq!(labels, ["08:00", "10:00", "11:00", "13:00"]);
    }

    #[test]
    fn board_covers_operating_window_only() {
        let closed = BTreeSet::from(["12:00".parse().unwrap()]);
        let hours = OperatingHours::new(10, 14, closed).unwrap();
        let blocked = BTreeSet::from(["11:00".parse().unwrap(), "20:00".parse().unwrap()]);

        let board = slot_board(&hours, &blocked);
        assert_eq!(
            board,
            vec![
                SlotStatusResponse {
                    time: "10:00".into(),
                    status: SlotState::Available
                },
                SlotStatusResponse {
                    time: "11:00".into(),
                    status: SlotState::Booked
                },
                SlotStatusResponse {
                    time: "13:00".into(),
                    status: SlotState::Available
                },
            ]
        );
    }
}
