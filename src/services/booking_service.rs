//! Booking lifecycle: creation with atomic slot claims, status changes and statistics.

use std::sync::Arc;

use indexmap::IndexMap;
use rand::{Rng, rng};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    config::Fees,
    dao::{
        booking_store::BookingStore,
        models::{
            BookingEntity, BookingQuery, ClaimOutcome, CourtStatus, RedeemOutcome,
            SlotClaimRequest, VoucherEntity,
        },
        storage::InsertOutcome,
    },
    dto::{
        booking::{
            AdminBookingsQuery, BookingResponse, BookingStatsResponse, ConfirmPaymentRequest,
            CreateBookingRequest, UpdateBookingStatusRequest,
        },
        sse::SlotAvailability,
    },
    error::ServiceError,
    services::{
        availability::{blocked_slots, parse_day},
        sse_events::{broadcast_booking_status, broadcast_slot_availability},
        voucher_service::{evaluate, normalize_code},
    },
    state::{
        SharedState,
        auth::Principal,
        clock::date_of,
        lifecycle::{self, BookingStatus, PaymentStatus, SlotEffect, StatusChange},
        slots::{Slot, parse_slots},
    },
};

const INVOICE_PREFIX: &str = "INV";
const INVOICE_SUFFIX_LEN: usize = 8;
const INVOICE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const MAX_INVOICE_ATTEMPTS: u32 = 5;

/// Server-side price breakdown of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub total_price: i64,
    pub service_fee: i64,
    pub protection_fee: i64,
    pub discount_amount: i64,
    pub final_total_amount: i64,
}

impl Quote {
    /// Price `slot_count` hours at `hourly_rate` with the configured fees and a discount.
    pub fn new(hourly_rate: i64, slot_count: usize, fees: Fees, discount_amount: i64) -> Self {
        let slot_count = i64::try_from(slot_count).unwrap_or(i64::MAX);
        let total_price = hourly_rate.saturating_mul(slot_count);
        let discount_amount = discount_amount.clamp(0, total_price);
        let final_total_amount = (total_price + fees.service_fee + fees.protection_fee
            - discount_amount)
            .max(0);
        Self {
            total_price,
            service_fee: fees.service_fee,
            protection_fee: fees.protection_fee,
            discount_amount,
            final_total_amount,
        }
    }
}

/// `INV-YYYYMMDD-XXXXXXXX` using the creation day and an unambiguous random suffix.
pub fn generate_invoice_number(day: time::Date) -> String {
    let mut rng = rng();
    let suffix: String = (0..INVOICE_SUFFIX_LEN)
        .map(|_| char::from(INVOICE_ALPHABET[rng.random_range(0..INVOICE_ALPHABET.len())]))
        .collect();
    format!(
        "{INVOICE_PREFIX}-{:04}{:02}{:02}-{suffix}",
        day.year(),
        u8::from(day.month()),
        day.day()
    )
}

fn log_price_hints(request: &CreateBookingRequest, quote: &Quote) {
    let hints = [
        ("total_price", request.total_price_from_frontend, quote.total_price),
        ("service_fee", request.service_fee_from_frontend, quote.service_fee),
        ("discount", request.discount_from_frontend, quote.discount_amount),
        ("final_total", request.final_total_from_frontend, quote.final_total_amount),
    ];
    for (field, hint, computed) in hints {
        if let Some(hint) = hint.filter(|hint| *hint != computed) {
            warn!(field, hint, computed, "client price hint differs from server computation");
        }
    }
}

async fn resolve_voucher(
    store: &Arc<dyn BookingStore>,
    code: Option<&str>,
    total_price: i64,
    today: time::Date,
) -> Result<Option<(VoucherEntity, i64)>, ServiceError> {
    let Some(code) = code.map(normalize_code).filter(|code| !code.is_empty()) else {
        return Ok(None);
    };
    let voucher = store
        .find_voucher_by_code(code.clone())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("voucher {code}")))?;
    let discount = evaluate(&voucher, total_price, today)?;
    Ok(Some((voucher, discount)))
}

/// Hold the requested slots for the caller while they pay.
pub async fn create_booking(
    state: &SharedState,
    principal: Principal,
    request: CreateBookingRequest,
) -> Result<BookingResponse, ServiceError> {
    let now = state.now();
    let today = date_of(now);
    let booking_date = parse_day(&request.date)?;
    if booking_date < today {
        return Err(ServiceError::InvalidInput(
            "booking date is in the past".into(),
        ));
    }
    let slots = parse_slots(&request.time_slots)
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;
    state
        .config()
        .operating_hours()
        .check(&slots)
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;
    let (Some(first), Some(last)) = (slots.first().copied(), slots.last().copied()) else {
        return Err(ServiceError::InvalidInput(
            "at least one time slot is required".into(),
        ));
    };

    let store = state.require_booking_store().await?;
    let court = store
        .find_court(request.court_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("court {}", request.court_id)))?;
    if court.status != CourtStatus::Active {
        return Err(ServiceError::InvalidInput(format!(
            "court {} is not accepting bookings",
            court.id
        )));
    }
    let arena = store
        .find_arena(court.arena_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("arena {}", court.arena_id)))?;

    // Cheap early rejection; the slot claim below is authoritative.
    let existing = store
        .list_bookings(BookingQuery::blocking_on(court.id, booking_date))
        .await?;
    let conflicts: Vec<Slot> = blocked_slots(&existing, now)
        .intersection(&slots)
        .copied()
        .collect();
    if !conflicts.is_empty() {
        return Err(slot_conflict(&conflicts));
    }

    let hourly_rate = court.hourly_rate(&arena);
    let subtotal = hourly_rate.saturating_mul(i64::try_from(slots.len()).unwrap_or(i64::MAX));
    let voucher = resolve_voucher(&store, request.voucher_code.as_deref(), subtotal, today).await?;
    let quote = Quote::new(
        hourly_rate,
        slots.len(),
        state.config().fees(),
        voucher.as_ref().map_or(0, |(_, discount)| *discount),
    );
    log_price_hints(&request, &quote);

    let booking_id = Uuid::new_v4();
    let expiry_time = now + state.config().hold_window();
    let claim = SlotClaimRequest {
        court_id: court.id,
        booking_date,
        slots: slots.clone(),
        booking_id,
        hold_until: expiry_time,
    };
    if let ClaimOutcome::Taken(taken) = store.claim_slots(claim, now).await? {
        return Err(slot_conflict(&taken));
    }

    let mut booking = BookingEntity {
        id: booking_id,
        invoice_number: String::new(),
        user_id: principal.user_id,
        court_id: court.id,
        arena_id: court.arena_id,
        booking_date,
        time_slots: slots,
        start_time: first.to_string(),
        end_time: last.end_label(),
        total_price: quote.total_price,
        service_fee: quote.service_fee,
        protection_fee: quote.protection_fee,
        discount_amount: quote.discount_amount,
        final_total_amount: quote.final_total_amount,
        status: BookingStatus::Pending,
        payment_status: PaymentStatus::Unpaid,
        payment_method: None,
        applied_voucher_id: voucher.map(|(voucher, _)| voucher.id),
        voucher_redeemed: false,
        notes: request.notes.filter(|notes| !notes.trim().is_empty()),
        expiry_time,
        created_at: now,
        updated_at: now,
        version: 0,
    };

    if let Err(err) = insert_with_invoice(&store, &mut booking).await {
        if let Err(release_err) = store.release_slots(booking_id).await {
            warn!(%booking_id, error = %release_err, "failed to release claims of unsaved booking");
        }
        return Err(err);
    }

    info!(
        invoice = %booking.invoice_number,
        court_id = %booking.court_id,
        date = %request.date,
        slots = booking.time_slots.len(),
        "booking created"
    );
    broadcast_slot_availability(
        state,
        booking.court_id,
        booking.booking_date,
        &booking.time_slots,
        SlotAvailability::PendingPayment,
    );
    Ok(booking.into())
}

async fn insert_with_invoice(
    store: &Arc<dyn BookingStore>,
    booking: &mut BookingEntity,
) -> Result<(), ServiceError> {
    let day = date_of(booking.created_at);
    for attempt in 1..=MAX_INVOICE_ATTEMPTS {
        booking.invoice_number = generate_invoice_number(day);
        match store.insert_booking(booking.clone()).await? {
            InsertOutcome::Inserted => return Ok(()),
            InsertOutcome::Duplicate => {
                debug!(attempt, invoice = %booking.invoice_number, "invoice number collision");
            }
        }
    }
    Err(ServiceError::Internal(
        "could not allocate a unique invoice number".into(),
    ))
}

fn slot_conflict(slots: &[Slot]) -> ServiceError {
    let labels: Vec<String> = slots.iter().map(ToString::to_string).collect();
    ServiceError::SlotConflict(format!("slots already taken: {}", labels.join(", ")))
}

/// Validate a change against the lifecycle and persist it with its side effects.
///
/// A change to the current state is a no-op returning the booking unchanged.
pub async fn apply_status_change(
    state: &SharedState,
    store: &Arc<dyn BookingStore>,
    booking: BookingEntity,
    change: StatusChange,
    notes: Option<String>,
    payment_method: Option<String>,
) -> Result<BookingEntity, ServiceError> {
    let now = state.now();
    let Some(plan) = lifecycle::plan(booking.lifecycle_context(), change, now)? else {
        debug!(invoice = %booking.invoice_number, "status change is a no-op");
        return Ok(booking);
    };

    let mut updated = booking.clone();
    updated.status = plan.to.status;
    updated.payment_status = plan.to.payment;
    if let Some(notes) = notes {
        updated.notes = Some(notes);
    }
    if let Some(method) = payment_method {
        updated.payment_method = Some(method);
    }
    updated.updated_at = now;
    updated.version = booking.version + 1;

    let mut redeemed_voucher = None;
    if plan.redeem_voucher {
        if let Some(voucher_id) = booking.applied_voucher_id {
            match store.redeem_voucher(voucher_id, booking.id).await? {
                RedeemOutcome::Redeemed => redeemed_voucher = Some(voucher_id),
                RedeemOutcome::AlreadyRedeemed => {}
                RedeemOutcome::Exhausted => {
                    return Err(ServiceError::VoucherExhausted(format!(
                        "voucher {voucher_id} has no uses left"
                    )));
                }
                RedeemOutcome::NotFound => {
                    return Err(ServiceError::NotFound(format!("voucher {voucher_id}")));
                }
            }
            updated.voucher_redeemed = true;
        }
    }

    if plan.slots == SlotEffect::Pin {
        let pinned = match store.pin_slots(booking.id).await {
            Ok(pinned) => pinned,
            Err(err) => {
                release_redemption(store, redeemed_voucher, booking.id).await;
                return Err(err.into());
            }
        };
        // A lapsed hold may have been taken over between the plan and the pin.
        if pinned < booking.time_slots.len() {
            warn!(
                invoice = %booking.invoice_number,
                pinned,
                expected = booking.time_slots.len(),
                "hold was taken over before confirmation"
            );
            if let Err(err) = store.release_slots(booking.id).await {
                error!(
                    invoice = %booking.invoice_number,
                    error = %err,
                    "failed to release slot claims"
                );
            }
            release_redemption(store, redeemed_voucher, booking.id).await;
            return Err(ServiceError::SlotConflict(format!(
                "the hold of booking {} expired and its slots were taken",
                booking.invoice_number
            )));
        }
    }

    let written = match store.replace_booking(updated.clone(), booking.version).await {
        Ok(written) => written,
        Err(err) => {
            release_redemption(store, redeemed_voucher, booking.id).await;
            return Err(err.into());
        }
    };
    if !written {
        release_redemption(store, redeemed_voucher, booking.id).await;
        return Err(ServiceError::InvalidTransition(format!(
            "booking {} was modified concurrently",
            booking.invoice_number
        )));
    }

    if plan.slots == SlotEffect::Release {
        if let Err(err) = store.release_slots(booking.id).await {
            error!(
                invoice = %updated.invoice_number,
                error = %err,
                "failed to release slot claims"
            );
        }
    }

    info!(
        invoice = %updated.invoice_number,
        from = plan.from.status.as_str(),
        to = plan.to.status.as_str(),
        payment = plan.to.payment.as_str(),
        "booking status changed"
    );
    broadcast_booking_status(state, &updated, plan.notice);
    match plan.slots {
        SlotEffect::Pin => broadcast_slot_availability(
            state,
            updated.court_id,
            updated.booking_date,
            &updated.time_slots,
            SlotAvailability::Booked,
        ),
        SlotEffect::Release => broadcast_slot_availability(
            state,
            updated.court_id,
            updated.booking_date,
            &updated.time_slots,
            SlotAvailability::Available,
        ),
        SlotEffect::Keep => {}
    }

    Ok(updated)
}

async fn release_redemption(
    store: &Arc<dyn BookingStore>,
    voucher_id: Option<Uuid>,
    booking_id: Uuid,
) {
    let Some(voucher_id) = voucher_id else {
        return;
    };
    if let Err(err) = store.release_voucher(voucher_id, booking_id).await {
        error!(%voucher_id, %booking_id, error = %err, "failed to roll back voucher redemption");
    }
}

async fn load_booking(
    store: &Arc<dyn BookingStore>,
    invoice_number: &str,
) -> Result<BookingEntity, ServiceError> {
    store
        .find_booking_by_invoice(invoice_number.to_owned())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("booking {invoice_number}")))
}

fn ensure_access(principal: &Principal, booking: &BookingEntity) -> Result<(), ServiceError> {
    if principal.can_access(booking.user_id) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(format!(
            "booking {} belongs to another user",
            booking.invoice_number
        )))
    }
}

/// Booking detail for its owner or an administrator.
pub async fn get_booking(
    state: &SharedState,
    principal: Principal,
    invoice_number: &str,
) -> Result<BookingResponse, ServiceError> {
    let store = state.require_booking_store().await?;
    let booking = load_booking(&store, invoice_number).await?;
    ensure_access(&principal, &booking)?;
    Ok(booking.into())
}

/// Bookings of the caller, newest first.
pub async fn list_mine(
    state: &SharedState,
    principal: Principal,
) -> Result<Vec<BookingResponse>, ServiceError> {
    let store = state.require_booking_store().await?;
    let bookings = store
        .list_bookings(BookingQuery {
            user_id: Some(principal.user_id),
            ..BookingQuery::default()
        })
        .await?;
    Ok(bookings.into_iter().rev().map(Into::into).collect())
}

/// Admin listing filtered by status, date and court, newest first.
pub async fn list_admin(
    state: &SharedState,
    query: AdminBookingsQuery,
) -> Result<Vec<BookingResponse>, ServiceError> {
    let store = state.require_booking_store().await?;
    let booking_date = query.date.as_deref().map(parse_day).transpose()?;
    let bookings = store
        .list_bookings(BookingQuery {
            court_id: query.court_id,
            booking_date,
            statuses: query.status.map(|status| vec![status]),
            ..BookingQuery::default()
        })
        .await?;
    Ok(bookings.into_iter().rev().map(Into::into).collect())
}

/// Administrative status and payment change.
pub async fn update_status(
    state: &SharedState,
    invoice_number: &str,
    request: UpdateBookingStatusRequest,
) -> Result<BookingResponse, ServiceError> {
    if request.status.is_none() && request.payment_status.is_none() {
        return Err(ServiceError::InvalidInput(
            "status or paymentStatus is required".into(),
        ));
    }
    let store = state.require_booking_store().await?;
    let booking = load_booking(&store, invoice_number).await?;
    let change = StatusChange {
        status: request.status,
        payment: request.payment_status,
    };
    let updated = apply_status_change(state, &store, booking, change, request.notes, None).await?;
    Ok(updated.into())
}

/// Record a successful payment by the owner, confirming the booking.
pub async fn confirm_payment(
    state: &SharedState,
    principal: Principal,
    invoice_number: &str,
    request: ConfirmPaymentRequest,
) -> Result<BookingResponse, ServiceError> {
    let store = state.require_booking_store().await?;
    let booking = load_booking(&store, invoice_number).await?;
    ensure_access(&principal, &booking)?;
    let change = StatusChange::both(BookingStatus::Confirmed, PaymentStatus::Paid);
    let updated = apply_status_change(
        state,
        &store,
        booking,
        change,
        None,
        Some(request.payment_method.trim().to_owned()),
    )
    .await?;
    Ok(updated.into())
}

/// Cancel a pending booking on behalf of its owner.
pub async fn cancel(
    state: &SharedState,
    principal: Principal,
    invoice_number: &str,
) -> Result<BookingResponse, ServiceError> {
    let store = state.require_booking_store().await?;
    let booking = load_booking(&store, invoice_number).await?;
    ensure_access(&principal, &booking)?;
    let change = StatusChange::status(BookingStatus::Cancelled);
    let updated = apply_status_change(state, &store, booking, change, None, None).await?;
    Ok(updated.into())
}

/// Aggregate counters over every booking.
pub async fn stats(state: &SharedState) -> Result<BookingStatsResponse, ServiceError> {
    let store = state.require_booking_store().await?;
    let bookings = store.list_bookings(BookingQuery::default()).await?;
    let now = state.now();
    let today = date_of(now);

    let mut by_status: IndexMap<String, usize> = BookingStatus::ALL
        .iter()
        .map(|status| (status.as_str().to_owned(), 0))
        .collect();
    let mut by_payment_status: IndexMap<String, usize> = PaymentStatus::ALL
        .iter()
        .map(|status| (status.as_str().to_owned(), 0))
        .collect();
    let mut total_revenue = 0_i64;
    let mut today_bookings = 0;
    let mut active_holds = 0;

    for booking in &bookings {
        *by_status.entry(booking.status.as_str().to_owned()).or_default() += 1;
        *by_payment_status
            .entry(booking.payment_status.as_str().to_owned())
            .or_default() += 1;
        if booking.payment_status == PaymentStatus::Paid {
            total_revenue = total_revenue.saturating_add(booking.final_total_amount);
        }
        if booking.booking_date == today {
            today_bookings += 1;
        }
        if booking.status == BookingStatus::Pending && booking.blocks_slots(now) {
            active_holds += 1;
        }
    }

    Ok(BookingStatsResponse {
        total_bookings: bookings.len(),
        by_status,
        by_payment_status,
        total_revenue,
        today_bookings,
        active_holds,
    })
}
