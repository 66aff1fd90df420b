use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use axum_valid::Valid;

use crate::{
    dto::booking::{
        AdminBookingsQuery, AvailableSlotsQuery, BookingResponse, BookingStatsResponse,
        ConfirmPaymentRequest, CourtAvailabilityResponse, CourtsAvailabilityQuery,
        CreateBookingRequest, SlotStatusResponse, UpdateBookingStatusRequest,
    },
    error::AppError,
    services::{availability, booking_service},
    state::{SharedState, auth::Principal},
};

/// Availability lookups open to anyone.
pub fn public_router() -> Router<SharedState> {
    Router::new()
        .route("/bookings/available-slots", get(available_slots))
        .route("/bookings/courts", get(courts_availability))
}

/// Customer booking flow; requires an authenticated caller.
pub fn user_router() -> Router<SharedState> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings/user/me", get(my_bookings))
        .route("/bookings/{invoice_number}", get(get_booking))
        .route("/bookings/{invoice_number}/payment", post(confirm_payment))
        .route("/bookings/{invoice_number}/cancel", post(cancel_booking))
}

/// Back-office booking management.
pub fn admin_router() -> Router<SharedState> {
    Router::new()
        .route("/bookings/admin", get(list_bookings))
        .route("/bookings/admin/stats", get(booking_stats))
        .route("/bookings/admin/{invoice_number}/status", put(update_status))
}

/// Hourly availability board of a court for one day.
#[utoipa::path(
    get,
    path = "/api/bookings/available-slots",
    tag = "bookings",
    params(AvailableSlotsQuery),
    responses(
        (
            status = 200,
            description = "Slot board within operating hours",
            body = [SlotStatusResponse]
        ),
        (status = 404, description = "Unknown court")
    )
)]
pub async fn available_slots(
    State(state): State<SharedState>,
    Valid(Query(query)): Valid<Query<AvailableSlotsQuery>>,
) -> Result<Json<Vec<SlotStatusResponse>>, AppError> {
    Ok(Json(
        availability::available_slots(&state, query.court_id, &query.date).await?,
    ))
}

/// Courts with their availability for one day, optionally restricted to an arena.
#[utoipa::path(
    get,
    path = "/api/bookings/courts",
    tag = "bookings",
    params(CourtsAvailabilityQuery),
    responses((
        status = 200,
        description = "Courts and their slot boards",
        body = [CourtAvailabilityResponse]
    ))
)]
pub async fn courts_availability(
    State(state): State<SharedState>,
    Valid(Query(query)): Valid<Query<CourtsAvailabilityQuery>>,
) -> Result<Json<Vec<CourtAvailabilityResponse>>, AppError> {
    Ok(Json(
        availability::courts_with_availability(&state, query.arena_id, &query.date).await?,
    ))
}

/// Hold slots for the caller while they pay.
#[utoipa::path(
    post,
    path = "/api/bookings",
    tag = "bookings",
    security(("bearer" = [])),
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created in pending state", body = BookingResponse),
        (status = 400, description = "Invalid date, slot or voucher"),
        (status = 409, description = "Slot already taken")
    )
)]
pub async fn create_booking(
    State(state): State<SharedState>,
    Extension(principal): Extension<Principal>,
    Valid(Json(payload)): Valid<Json<CreateBookingRequest>>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let booking = booking_service::create_booking(&state, principal, payload).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Bookings of the caller, newest first.
#[utoipa::path(
    get,
    path = "/api/bookings/user/me",
    tag = "bookings",
    security(("bearer" = [])),
    responses((status = 200, description = "Caller bookings", body = [BookingResponse]))
)]
pub async fn my_bookings(
    State(state): State<SharedState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    Ok(Json(booking_service::list_mine(&state, principal).await?))
}

/// Booking detail for its owner or an administrator.
#[utoipa::path(
    get,
    path = "/api/bookings/{invoice_number}",
    tag = "bookings",
    security(("bearer" = [])),
    params(("invoice_number" = String, Path, description = "Invoice number of the booking")),
    responses(
        (status = 200, description = "Booking", body = BookingResponse),
        (status = 403, description = "Booking belongs to another user"),
        (status = 404, description = "Unknown invoice number")
    )
)]
pub async fn get_booking(
    State(state): State<SharedState>,
    Extension(principal): Extension<Principal>,
    Path(invoice_number): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    Ok(Json(
        booking_service::get_booking(&state, principal, &invoice_number).await?,
    ))
}

/// Record a successful payment, confirming the booking.
#[utoipa::path(
    post,
    path = "/api/bookings/{invoice_number}/payment",
    tag = "bookings",
    security(("bearer" = [])),
    params(("invoice_number" = String, Path, description = "Invoice number of the booking")),
    request_body = ConfirmPaymentRequest,
    responses(
        (status = 200, description = "Booking confirmed", body = BookingResponse),
        (status = 409, description = "Hold expired, invalid transition or voucher exhausted")
    )
)]
pub async fn confirm_payment(
    State(state): State<SharedState>,
    Extension(principal): Extension<Principal>,
    Path(invoice_number): Path<String>,
    Valid(Json(payload)): Valid<Json<ConfirmPaymentRequest>>,
) -> Result<Json<BookingResponse>, AppError> {
    Ok(Json(
        booking_service::confirm_payment(&state, principal, &invoice_number, payload).await?,
    ))
}

/// Cancel a pending booking.
#[utoipa::path(
    post,
    path = "/api/bookings/{invoice_number}/cancel",
    tag = "bookings",
    security(("bearer" = [])),
    params(("invoice_number" = String, Path, description = "Invoice number of the booking")),
    responses(
        (status = 200, description = "Booking cancelled", body = BookingResponse),
        (status = 409, description = "Booking is no longer pending")
    )
)]
pub async fn cancel_booking(
    State(state): State<SharedState>,
    Extension(principal): Extension<Principal>,
    Path(invoice_number): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    Ok(Json(
        booking_service::cancel(&state, principal, &invoice_number).await?,
    ))
}

/// All bookings filtered by status, date and court.
#[utoipa::path(
    get,
    path = "/api/bookings/admin",
    tag = "admin",
    security(("bearer" = [])),
    params(AdminBookingsQuery),
    responses((status = 200, description = "Matching bookings", body = [BookingResponse]))
)]
pub async fn list_bookings(
    State(state): State<SharedState>,
    Valid(Query(query)): Valid<Query<AdminBookingsQuery>>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    Ok(Json(booking_service::list_admin(&state, query).await?))
}

/// Aggregate booking counters.
#[utoipa::path(
    get,
    path = "/api/bookings/admin/stats",
    tag = "admin",
    security(("bearer" = [])),
    responses((status = 200, description = "Booking statistics", body = BookingStatsResponse))
)]
pub async fn booking_stats(
    State(state): State<SharedState>,
) -> Result<Json<BookingStatsResponse>, AppError> {
    Ok(Json(booking_service::stats(&state).await?))
}

/// Change the status and/or payment status of a booking.
#[utoipa::path(
    put,
    path = "/api/bookings/admin/{invoice_number}/status",
    tag = "admin",
    security(("bearer" = [])),
    params(("invoice_number" = String, Path, description = "Invoice number of the booking")),
    request_body = UpdateBookingStatusRequest,
    responses(
        (status = 200, description = "Updated booking", body = BookingResponse),
        (status = 409, description = "Transition not allowed or voucher exhausted")
    )
)]
pub async fn update_status(
    State(state): State<SharedState>,
    Path(invoice_number): Path<String>,
    Valid(Json(payload)): Valid<Json<UpdateBookingStatusRequest>>,
) -> Result<Json<BookingResponse>, AppError> {
    Ok(Json(
        booking_service::update_status(&state, &invoice_number, payload).await?,
    ))
}
