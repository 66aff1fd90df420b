pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use std::time::SystemTime;

use futures::future::BoxFuture;
use time::Date;
use uuid::Uuid;

use crate::dao::{
    models::{
        ArenaEntity, BookingEntity, BookingQuery, ClaimOutcome, CourtEntity, RedeemOutcome,
        SlotClaimRequest, UserEntity, VoucherEntity,
    },
    storage::{InsertOutcome, StorageResult},
};

/// Abstraction over the persistence layer for the directory, vouchers, users and bookings.
pub trait BookingStore: Send + Sync {
    fn list_arenas(&self) -> BoxFuture<'static, StorageResult<Vec<ArenaEntity>>>;
    fn find_arena(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ArenaEntity>>>;
    /// Insert or replace an arena.
    fn save_arena(&self, arena: ArenaEntity) -> BoxFuture<'static, StorageResult<()>>;

    fn list_courts(
        &self,
        arena_id: Option<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Vec<CourtEntity>>>;
    fn find_court(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<CourtEntity>>>;
    /// Insert or replace a court.
    fn save_court(&self, court: CourtEntity) -> BoxFuture<'static, StorageResult<()>>;

    fn list_users(&self) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>>;
    fn find_user(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    /// Insert a user, reporting a duplicate email.
    fn insert_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<InsertOutcome>>;
    /// Replace an existing user.
    fn save_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>>;

    fn list_vouchers(&self) -> BoxFuture<'static, StorageResult<Vec<VoucherEntity>>>;
    fn find_voucher(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<VoucherEntity>>>;
    fn find_voucher_by_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<VoucherEntity>>>;
    /// Insert a voucher, reporting a duplicate code.
    fn insert_voucher(
        &self,
        voucher: VoucherEntity,
    ) -> BoxFuture<'static, StorageResult<InsertOutcome>>;
    /// Update the editable fields of a voucher; usage counters are left untouched.
    fn update_voucher(
        &self,
        voucher: VoucherEntity,
    ) -> BoxFuture<'static, StorageResult<InsertOutcome>>;
    /// Atomically consume one use of a voucher on behalf of a booking.
    fn redeem_voucher(
        &self,
        voucher_id: Uuid,
        booking_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<RedeemOutcome>>;
    /// Give back the use consumed by a booking, returning whether anything changed.
    fn release_voucher(
        &self,
        voucher_id: Uuid,
        booking_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>>;

    /// Insert a booking, reporting a duplicate invoice number.
    fn insert_booking(
        &self,
        booking: BookingEntity,
    ) -> BoxFuture<'static, StorageResult<InsertOutcome>>;
    fn find_booking_by_invoice(
        &self,
        invoice_number: String,
    ) -> BoxFuture<'static, StorageResult<Option<BookingEntity>>>;
    /// List bookings matching the query, oldest first.
    fn list_bookings(
        &self,
        query: BookingQuery,
    ) -> BoxFuture<'static, StorageResult<Vec<BookingEntity>>>;
    /// Replace a booking only if its stored version is still `expected_version`.
    fn replace_booking(
        &self,
        booking: BookingEntity,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Pending bookings with an unsettled payment whose hold ended before `now`.
    fn list_stale_holds(
        &self,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<BookingEntity>>>;

    /// Claim every requested slot or none of them.
    fn claim_slots(
        &self,
        request: SlotClaimRequest,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<ClaimOutcome>>;
    /// Make the claims still owned by a booking permanent, returning how many were pinned.
    fn pin_slots(&self, booking_id: Uuid) -> BoxFuture<'static, StorageResult<usize>>;
    /// Drop the claims of a booking.
    fn release_slots(&self, booking_id: Uuid) -> BoxFuture<'static, StorageResult<()>>;
    /// Drop every claim on a date before `before`, returning how many were removed.
    fn prune_claims(&self, before: Date) -> BoxFuture<'static, StorageResult<usize>>;

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
