use std::{collections::BTreeSet, time::SystemTime};

use serde::{Deserialize, Serialize};
use time::Date;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::{
    auth::UserRole,
    lifecycle::{BookingState, BookingStatus, LifecycleContext, PaymentStatus},
    slots::Slot,
};

/// Venue hosting one or more courts.
#[derive(Debug, Clone, PartialEq)]
pub struct ArenaEntity {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub city: String,
    pub category: String,
    pub description: String,
    /// Default hourly rate for courts that do not override it.
    pub price_per_hour: i64,
    pub rating: f64,
    pub reviews_count: u32,
    /// Ordered gallery URLs.
    pub images: Vec<String>,
    pub facilities: BTreeSet<String>,
    /// Human readable range such as `"06:00 - 24:00"`.
    pub opening_hours: String,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

/// Quality tier of a court; serialized as `Standard` / `Premium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum CourtType {
    Standard,
    Premium,
}

/// Whether a court currently accepts bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CourtStatus {
    Active,
    Maintenance,
    Inactive,
}

/// A single bookable court inside an arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourtEntity {
    pub id: Uuid,
    pub arena_id: Uuid,
    pub name: String,
    pub court_type: CourtType,
    /// Overrides the arena hourly rate when set.
    pub price_per_hour: Option<i64>,
    pub status: CourtStatus,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl CourtEntity {
    /// Hourly rate applied to bookings of this court.
    pub fn hourly_rate(&self, arena: &ArenaEntity) -> i64 {
        self.price_per_hour.unwrap_or(arena.price_per_hour)
    }
}

/// Registered customer or administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEntity {
    pub id: Uuid,
    pub name: String,
    /// Unique, stored lower-cased.
    pub email: String,
    pub phone: Option<String>,
    pub birth_date: Option<Date>,
    pub role: UserRole,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

/// How a voucher discount is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

/// Discount code and its redemption ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoucherEntity {
    pub id: Uuid,
    /// Unique, stored upper-cased.
    pub code: String,
    pub title: String,
    pub description: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    pub min_purchase: i64,
    pub max_discount: Option<i64>,
    pub start_date: Date,
    pub end_date: Date,
    pub is_active: bool,
    /// `None` means unlimited.
    pub usage_limit: Option<u32>,
    pub usage_count: u32,
    /// Bookings that already consumed a use of this voucher.
    pub redeemed_by: Vec<Uuid>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

/// Result of an atomic voucher redemption attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemOutcome {
    Redeemed,
    /// The booking had already redeemed the voucher; nothing changed.
    AlreadyRedeemed,
    /// `usage_count` reached `usage_limit`.
    Exhausted,
    NotFound,
}

/// One reservation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingEntity {
    pub id: Uuid,
    /// Externally visible unique reference.
    pub invoice_number: String,
    pub user_id: Uuid,
    pub court_id: Uuid,
    pub arena_id: Uuid,
    pub booking_date: Date,
    /// Ordered, duplicate free.
    pub time_slots: BTreeSet<Slot>,
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
    pub voucher_redeemed: bool,
    pub notes: Option<String>,
    pub expiry_time: SystemTime,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
    /// Incremented on every update; used for compare-and-set writes.
    pub version: u64,
}

impl BookingEntity {
    /// Current status pair.
    pub fn state(&self) -> BookingState {
        BookingState {
            status: self.status,
            payment: self.payment_status,
        }
    }

    /// Inputs of the lifecycle rules for this booking.
    pub fn lifecycle_context(&self) -> LifecycleContext {
        LifecycleContext {
            state: self.state(),
            expiry_time: self.expiry_time,
            has_voucher: self.applied_voucher_id.is_some(),
            voucher_redeemed: self.voucher_redeemed,
        }
    }

    /// Whether the booking currently keeps its slots away from other customers.
    pub fn blocks_slots(&self, now: SystemTime) -> bool {
        match self.status {
            BookingStatus::Pending => now <= self.expiry_time,
            BookingStatus::Confirmed | BookingStatus::Completed => true,
            BookingStatus::Cancelled
            | BookingStatus::Expired
            | BookingStatus::CancelledBySystem => false,
        }
    }
}

/// Filter applied when listing bookings; `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingQuery {
    pub user_id: Option<Uuid>,
    pub court_id: Option<Uuid>,
    pub arena_id: Option<Uuid>,
    pub booking_date: Option<Date>,
    pub statuses: Option<Vec<BookingStatus>>,
}

impl BookingQuery {
    /// Bookings of a court on a date that may block slots.
    pub fn blocking_on(court_id: Uuid, booking_date: Date) -> Self {
        Self {
            court_id: Some(court_id),
            booking_date: Some(booking_date),
            statuses: Some(BookingStatus::BLOCKING.to_vec()),
            ..Self::default()
        }
    }

    /// Whether a booking satisfies the filter.
    pub fn matches(&self, booking: &BookingEntity) -> bool {
        self.user_id.is_none_or(|id| booking.user_id == id)
            && self.court_id.is_none_or(|id| booking.court_id == id)
            && self.arena_id.is_none_or(|id| booking.arena_id == id)
            && self.booking_date.is_none_or(|date| booking.booking_date == date)
            && self
                .statuses
                .as_ref()
                .is_none_or(|statuses| statuses.contains(&booking.status))
    }
}

/// Request to reserve a set of slots on behalf of a booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotClaimRequest {
    pub court_id: Uuid,
    pub booking_date: Date,
    pub slots: BTreeSet<Slot>,
    pub booking_id: Uuid,
    /// End of the payment hold; claims whose hold ended can be taken over.
    pub hold_until: SystemTime,
}

/// Result of an atomic multi-slot claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    Claimed,
    /// Slots already held by a live booking; nothing was claimed.
    Taken(Vec<Slot>),
}
