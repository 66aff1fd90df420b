use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::BookingEntity,
    dto::{directory::CourtResponse, format_system_time, validation::validate_calendar_date},
    state::{
        clock::format_date,
        lifecycle::{BookingStatus, PaymentStatus},
    },
};

/// Payload used to reserve one or more slots of a court.
///
/// The `*FromFrontend` amounts are display hints only; the server recomputes every price.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub court_id: Uuid,
    /// `YYYY-MM-DD`
    #[validate(custom(function = "validate_calendar_date"))]
    pub date: String,
    /// Hour labels such as `"10:00"`.
    #[validate(length(min = 1, max = 24))]
    pub time_slots: Vec<String>,
    #[serde(default, rename = "start_time")]
    pub start_time: Option<String>,
    #[serde(default, rename = "end_time")]
    pub end_time: Option<String>,
    #[serde(default)]
    pub total_price_from_frontend: Option<i64>,
    #[serde(default)]
    pub service_fee_from_frontend: Option<i64>,
    #[serde(default)]
    pub discount_from_frontend: Option<i64>,
    #[serde(default)]
    pub final_total_from_frontend: Option<i64>,
    #[serde(default)]
    pub voucher_code: Option<String>,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

/// Admin request changing the status and/or payment status of a booking.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingStatusRequest {
    #[serde(default)]
    pub status: Option<BookingStatus>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

/// Customer payment confirmation.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentRequest {
    #[validate(length(min = 1, max = 50))]
    pub payment_method: String,
}

/// Query string of `GET /api/bookings/available-slots`.
#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSlotsQuery {
    pub court_id: Uuid,
    /// `YYYY-MM-DD`
    #[validate(custom(function = "validate_calendar_date"))]
    pub date: String,
}

/// Query string of `GET /api/bookings/courts`.
#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct CourtsAvailabilityQuery {
    #[serde(default)]
    pub arena_id: Option<Uuid>,
    /// `YYYY-MM-DD`
    #[validate(custom(function = "validate_calendar_date"))]
    pub date: String,
}

/// Query string of `GET /api/bookings/admin`.
#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct AdminBookingsQuery {
    #[serde(default)]
    pub status: Option<BookingStatus>,
    /// `YYYY-MM-DD`
    #[serde(default)]
    #[validate(custom(function = "validate_calendar_date"))]
    pub date: Option<String>,
    #[serde(default)]
    pub court_id: Option<Uuid>,
}

/// Whether a slot can still be booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    Available,
    Booked,
}

/// One entry of the availability board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SlotStatusResponse {
    /// `HH:00`
    pub time: String,
    pub status: SlotState,
}

/// Court with its availability board for one day.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourtAvailabilityResponse {
    pub court: CourtResponse,
    /// Hourly rate applied to this court.
    pub effective_price_per_hour: i64,
    pub available_slots: usize,
    pub booked_slots: usize,
    pub slots: Vec<SlotStatusResponse>,
}

/// Full booking record.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: Uuid,
    pub invoice_number: String,
    pub user_id: Uuid,
    pub court_id: Uuid,
    pub arena_id: Uuid,
    pub booking_date: String,
    pub time_slots: Vec<String>,
    pub start_time: String,
    pub end_time: String,
    pub total_price: i64,
    pub service_fee: i64,
    pub protection_fee: i64,
    pub discount_amount: i64,
    pub final_total_amount: i64,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub applied_voucher_id: Option<Uuid>,
    pub notes: Option<String>,
    pub expiry_time: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<BookingEntity> for BookingResponse {
    fn from(booking: BookingEntity) -> Self {
        Self {
            id: booking.id,
            invoice_number: booking.invoice_number,
            user_id: booking.user_id,
            court_id: booking.court_id,
            arena_id: booking.arena_id,
            booking_date: format_date(booking.booking_date),
            time_slots: booking.time_slots.iter().map(ToString::to_string).collect(),
            start_time: booking.start_time,
            end_time: booking.end_time,
            total_price: booking.total_price,
            service_fee: booking.service_fee,
            protection_fee: booking.protection_fee,
            discount_amount: booking.discount_amount,
            final_total_amount: booking.final_total_amount,
            status: booking.status,
            payment_status: booking.payment_status,
            payment_method: booking.payment_method,
            applied_voucher_id: booking.applied_voucher_id,
            notes: booking.notes,
            expiry_time: format_system_time(booking.expiry_time),
            created_at: format_system_time(booking.created_at),
            updated_at: format_system_time(booking.updated_at),
        }
    }
}

/// Aggregate counters for the admin dashboard.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingStatsResponse {
    pub total_bookings: usize,
    /// Count per booking status, in lifecycle order.
    #[schema(value_type = Object)]
    pub by_status: IndexMap<String, usize>,
    /// Count per payment status.
    #[schema(value_type = Object)]
    pub by_payment_status: IndexMap<String, usize>,
    /// Sum of `finalTotalAmount` over paid bookings.
    pub total_revenue: i64,
    /// Bookings played or scheduled today.
    pub today_bookings: usize,
    /// Pending bookings whose hold is still running.
    pub active_holds: usize,
}
