//! In-process [`BookingStore`] used by tests and `STORAGE_BACKEND=memory`.
//!
//! Every operation runs under a single async mutex, so multi-step operations such as slot claims
//! are atomic with respect to each other.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::SystemTime,
};

use futures::future::BoxFuture;
use time::Date;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::BookingStore;
use crate::{
    dao::{
        models::{
            ArenaEntity, BookingEntity, BookingQuery, ClaimOutcome, CourtEntity, RedeemOutcome,
            SlotClaimRequest, UserEntity, VoucherEntity,
        },
        storage::{InsertOutcome, StorageResult},
    },
    state::{
        lifecycle::{BookingStatus, PaymentStatus},
        slots::Slot,
    },
};

type ClaimKey = (Uuid, Date, Slot);

#[derive(Debug, Clone)]
struct SlotClaim {
    booking_id: Uuid,
    /// `None` once the booking is confirmed.
    hold_until: Option<SystemTime>,
}

#[derive(Debug, Default)]
struct MemoryState {
    arenas: HashMap<Uuid, ArenaEntity>,
    courts: HashMap<Uuid, CourtEntity>,
    users: HashMap<Uuid, UserEntity>,
    vouchers: HashMap<Uuid, VoucherEntity>,
    bookings: HashMap<Uuid, BookingEntity>,
    claims: HashMap<ClaimKey, SlotClaim>,
}

/// Memory-backed [`BookingStore`] implementation.
#[derive(Clone, Default)]
pub struct MemoryBookingStore {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryBookingStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn run<T, F>(&self, op: F) -> BoxFuture<'static, StorageResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&mut MemoryState) -> T + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let mut guard = inner.lock().await;
            Ok(op(&mut guard))
        })
    }
}

fn sorted_by_created<T, K: Ord>(mut items: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    items.sort_by_key(|item| key(item));
    items
}

impl BookingStore for MemoryBookingStore {
    fn list_arenas(&self) -> BoxFuture<'static, StorageResult<Vec<ArenaEntity>>> {
        self.run(|state| {
            sorted_by_created(state.arenas.values().cloned().collect(), |arena| {
                arena.created_at
            })
        })
    }

    fn find_arena(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ArenaEntity>>> {
        self.run(move |state| state.arenas.get(&id).cloned())
    }

    fn save_arena(&self, arena: ArenaEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.run(move |state| {
            state.arenas.insert(arena.id, arena);
        })
    }

    fn list_courts(
        &self,
        arena_id: Option<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Vec<CourtEntity>>> {
        self.run(move |state| {
            let courts = state
                .courts
                .values()
                .filter(|court| arena_id.is_none_or(|id| court.arena_id == id))
                .cloned()
                .collect();
            sorted_by_created(courts, |court| (court.created_at, court.name.clone()))
        })
    }

    fn find_court(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<CourtEntity>>> {
        self.run(move |state| state.courts.get(&id).cloned())
    }

    fn save_court(&self, court: CourtEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.run(move |state| {
            state.courts.insert(court.id, court);
        })
    }

    fn list_users(&self) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>> {
        self.run(|state| {
            sorted_by_created(state.users.values().cloned().collect(), |user| {
                user.created_at
            })
        })
    }

    fn find_user(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        self.run(move |state| state.users.get(&id).cloned())
    }

    fn insert_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<InsertOutcome>> {
        self.run(move |state| {
            let taken = state
                .users
                .values()
                .any(|existing| existing.id == user.id || existing.email == user.email);
            if taken {
                return InsertOutcome::Duplicate;
            }
            state.users.insert(user.id, user);
            InsertOutcome::Inserted
        })
    }

    fn save_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.run(move |state| {
            state.users.insert(user.id, user);
        })
    }

    fn list_vouchers(&self) -> BoxFuture<'static, StorageResult<Vec<VoucherEntity>>> {
        self.run(|state| {
            sorted_by_created(state.vouchers.values().cloned().collect(), |voucher| {
                voucher.created_at
            })
        })
    }

    fn find_voucher(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<VoucherEntity>>> {
        self.run(move |state| state.vouchers.get(&id).cloned())
    }

    fn find_voucher_by_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<VoucherEntity>>> {
        self.run(move |state| {
            state
                .vouchers
                .values()
                .find(|voucher| voucher.code == code)
                .cloned()
        })
    }

    fn insert_voucher(
        &self,
        voucher: VoucherEntity,
    ) -> BoxFuture<'static, StorageResult<InsertOutcome>> {
        self.run(move |state| {
            let taken = state
                .vouchers
                .values()
                .any(|existing| existing.id == voucher.id || existing.code == voucher.code);
            if taken {
                return InsertOutcome::Duplicate;
            }
            state.vouchers.insert(voucher.id, voucher);
            InsertOutcome::Inserted
        })
    }

    fn update_voucher(
        &self,
        voucher: VoucherEntity,
    ) -> BoxFuture<'static, StorageResult<InsertOutcome>> {
        self.run(move |state| {
            let code_taken = state
                .vouchers
                .values()
                .any(|existing| existing.id != voucher.id && existing.code == voucher.code);
            if code_taken {
                return InsertOutcome::Duplicate;
            }
            if let Some(existing) = state.vouchers.get_mut(&voucher.id) {
                let usage_count = existing.usage_count;
                let redeemed_by = std::mem::take(&mut existing.redeemed_by);
                *existing = VoucherEntity {
                    usage_count,
                    redeemed_by,
                    ..voucher
                };
            }
            InsertOutcome::Inserted
        })
    }

    fn redeem_voucher(
        &self,
        voucher_id: Uuid,
        booking_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<RedeemOutcome>> {
        self.run(move |state| {
            let Some(voucher) = state.vouchers.get_mut(&voucher_id) else {
                return RedeemOutcome::NotFound;
            };
            if voucher.redeemed_by.contains(&booking_id) {
                return RedeemOutcome::AlreadyRedeemed;
            }
            if voucher
                .usage_limit
                .is_some_and(|limit| voucher.usage_count >= limit)
            {
                return RedeemOutcome::Exhausted;
            }
            voucher.usage_count += 1;
            voucher.redeemed_by.push(booking_id);
            RedeemOutcome::Redeemed
        })
    }

    fn release_voucher(
        &self,
        voucher_id: Uuid,
        booking_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        self.run(move |state| {
            let Some(voucher) = state.vouchers.get_mut(&voucher_id) else {
                return false;
            };
            let before = voucher.redeemed_by.len();
            voucher.redeemed_by.retain(|id| *id != booking_id);
            if voucher.redeemed_by.len() == before {
                return false;
            }
            voucher.usage_count = voucher.usage_count.saturating_sub(1);
            true
        })
    }

    fn insert_booking(
        &self,
        booking: BookingEntity,
    ) -> BoxFuture<'static, StorageResult<InsertOutcome>> {
        self.run(move |state| {
            let taken = state.bookings.values().any(|existing| {
                existing.id == booking.id || existing.invoice_number == booking.invoice_number
            });
            if taken {
                return InsertOutcome::Duplicate;
            }
            state.bookings.insert(booking.id, booking);
            InsertOutcome::Inserted
        })
    }

    fn find_booking_by_invoice(
        &self,
        invoice_number: String,
    ) -> BoxFuture<'static, StorageResult<Option<BookingEntity>>> {
        self.run(move |state| {
            state
                .bookings
                .values()
                .find(|booking| booking.invoice_number == invoice_number)
                .cloned()
        })
    }

    fn list_bookings(
        &self,
        query: BookingQuery,
    ) -> BoxFuture<'static, StorageResult<Vec<BookingEntity>>> {
        self.run(move |state| {
            let bookings = state
                .bookings
                .values()
                .filter(|booking| query.matches(booking))
                .cloned()
                .collect();
            sorted_by_created(bookings, |booking| booking.created_at)
        })
    }

    fn replace_booking(
        &self,
        booking: BookingEntity,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        self.run(move |state| match state.bookings.get_mut(&booking.id) {
            Some(existing) if existing.version == expected_version => {
                *existing = booking;
                true
            }
            _ => false,
        })
    }

    fn list_stale_holds(
        &self,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<BookingEntity>>> {
        self.run(move |state| {
            let stale = state
                .bookings
                .values()
                .filter(|booking| {
                    booking.status == BookingStatus::Pending
                        && matches!(
                            booking.payment_status,
                            PaymentStatus::Unpaid | PaymentStatus::Failed
                        )
                        && booking.expiry_time < now
                })
                .cloned()
                .collect();
            sorted_by_created(stale, |booking| booking.expiry_time)
        })
    }

    fn claim_slots(
        &self,
        request: SlotClaimRequest,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<ClaimOutcome>> {
        self.run(move |state| {
            let taken: Vec<Slot> = request
                .slots
                .iter()
                .copied()
                .filter(|slot| {
                    state
                        .claims
                        .get(&(request.court_id, request.booking_date, *slot))
                        .is_some_and(|claim| {
                            claim.booking_id != request.booking_id
                                && claim.hold_until.is_none_or(|until| until >= now)
                        })
                })
                .collect();

            if !taken.is_empty() {
                return ClaimOutcome::Taken(taken);
            }

            for slot in &request.slots {
                state.claims.insert(
                    (request.court_id, request.booking_date, *slot),
                    SlotClaim {
                        booking_id: request.booking_id,
                        hold_until: Some(request.hold_until),
                    },
                );
            }
            ClaimOutcome::Claimed
        })
    }

    fn pin_slots(&self, booking_id: Uuid) -> BoxFuture<'static, StorageResult<usize>> {
        self.run(move |state| {
            let mut pinned = 0;
            for claim in state
                .claims
                .values_mut()
                .filter(|claim| claim.booking_id == booking_id)
            {
                claim.hold_until = None;
                pinned += 1;
            }
            pinned
        })
    }

    fn release_slots(&self, booking_id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
        self.run(move |state| {
            state.claims.retain(|_, claim| claim.booking_id != booking_id);
        })
    }

    fn prune_claims(&self, before: Date) -> BoxFuture<'static, StorageResult<usize>> {
        self.run(move |state| {
            let count = state.claims.len();
            state.claims.retain(|(_, date, _), _| *date >= before);
            count - state.claims.len()
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

impl MemoryBookingStore {
    /// Booking ids currently holding a claim on the given court and date.
    pub async fn claim_owners(&self, court_id: Uuid, booking_date: Date) -> HashSet<Uuid> {
        let guard = self.inner.lock().await;
        guard
            .claims
            .iter()
            .filter(|((court, date, _), _)| *court == court_id && *date == booking_date)
            .map(|(_, claim)| claim.booking_id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeSet, time::Duration};

    use time::macros::date;

    use super::*;

    fn request(
        booking_id: Uuid,
        court_id: Uuid,
        slots: &[&str],
        hold_until: SystemTime,
    ) -> SlotClaimRequest {
        SlotClaimRequest {
            court_id,
            booking_date: date!(2025 - 01 - 10),
            slots: slots
                .iter()
                .map(|label| label.parse().unwrap())
                .collect::<BTreeSet<_>>(),
            booking_id,
            hold_until,
        }
    }

    #[tokio::test]
    async fn overlapping_claims_are_rejected_atomically() {
        let store = MemoryBookingStore::new();
        let court = Uuid::new_v4();
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        let hold = now + Duration::from_secs(600);

        let first = Uuid::new_v4();
        let outcome = store
            .claim_slots(request(first, court, &["10:00", "11:00"], hold), now)
            .await
            .unwrap();
        assert_eq!(outcome, ClaimOutcome::Claimed);

        let second = Uuid::new_v4();
        let outcome = store
            .claim_slots(request(second, court, &["09:00", "11:00"], hold), now)
            .await
            .unwrap();
        assert_eq!(outcome, ClaimOutcome::Taken(vec!["11:00".parse().unwrap()]));

        // The free 09:00 slot must not have been claimed by the failed attempt.
        let owners = store.claim_owners(court, date!(2025 - 01 - 10)).await;
        assert_eq!(owners, HashSet::from([first]));
    }

    #[tokio::test]
    async fn stale_holds_can_be_taken_over_but_pinned_claims_cannot() {
        let store = MemoryBookingStore::new();
        let court = Uuid::new_v4();
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);

        let stale = Uuid::new_v4();
        store
            .claim_slots(request(stale, court, &["10:00"], now - Duration::from_secs(1)), now)
            .await
            .unwrap();

        let fresh = Uuid::new_v4();
        let outcome = store
            .claim_slots(request(fresh, court, &["10:00"], now + Duration::from_secs(600)), now)
            .await
            .unwrap();
        assert_eq!(outcome, ClaimOutcome::Claimed);

        store.pin_slots(fresh).await.unwrap();
        let late = now + Duration::from_secs(3_600);
        let outcome = store
            .claim_slots(request(Uuid::new_v4(), court, &["10:00"], late), late)
            .await
            .unwrap();
        assert!(matches!(outcome, ClaimOutcome::Taken(_)));

        store.release_slots(fresh).await.unwrap();
        assert!(store.claim_owners(court, date!(2025 - 01 - 10)).await.is_empty());
    }

    #[tokio::test]
    async fn voucher_redemption_is_idempotent_and_limited() {
        let store = MemoryBookingStore::new();
        let voucher = VoucherEntity {
            id: Uuid::new_v4(),
            code: "SMASH".into(),
            title: "Smash".into(),
            description: String::new(),
            discount_type: crate::dao::models::DiscountType::Fixed,
            discount_value: 1_000,
            min_purchase: 0,
            max_discount: None,
            start_date: date!(2025 - 01 - 01),
            end_date: date!(2025 - 12 - 31),
            is_active: true,
            usage_limit: Some(1),
            usage_count: 0,
            redeemed_by: Vec::new(),
            created_at: SystemTime::UNIX_EPOCH,
            updated_at: SystemTime::UNIX_EPOCH,
        };
        let voucher_id = voucher.id;
        store.insert_voucher(voucher).await.unwrap();

        let first = Uuid::new_v4();
        assert_eq!(
            store.redeem_voucher(voucher_id, first).await.unwrap(),
            RedeemOutcome::Redeemed
        );
        assert_eq!(
            store.redeem_voucher(voucher_id, first).await.unwrap(),
            RedeemOutcome::AlreadyRedeemed
        );
        assert_eq!(
            store.redeem_voucher(voucher_id, Uuid::new_v4()).await.unwrap(),
            RedeemOutcome::Exhausted
        );

        assert!(store.release_voucher(voucher_id, first).await.unwrap());
        let stored = store.find_voucher(voucher_id).await.unwrap().unwrap();
        assert_eq!(stored.usage_count, 0);
    }
}
