use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Reservation status of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Slots are held while the customer pays.
    Pending,
    /// Payment succeeded; slots are booked.
    Confirmed,
    /// The session has been played.
    Completed,
    /// Cancelled by the customer or an administrator before payment.
    Cancelled,
    /// The hold window elapsed without payment.
    Expired,
    /// Administrative override.
    CancelledBySystem,
}

impl BookingStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [BookingStatus; 6] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
        BookingStatus::Expired,
        BookingStatus::CancelledBySystem,
    ];

    /// Statuses that may still claim slots (pending only while its hold is alive).
    pub const BLOCKING: [BookingStatus; 3] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Completed,
    ];

    /// Wire name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Expired => "expired",
            BookingStatus::CancelledBySystem => "cancelled_by_system",
        }
    }

    fn is_blocking(self) -> bool {
        Self::BLOCKING.contains(&self)
    }
}

/// Payment progress of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// No payment received yet.
    Unpaid,
    /// Payment captured.
    Paid,
    /// Payment returned to the customer.
    Refunded,
    /// Payment attempt failed.
    Failed,
}

impl PaymentStatus {
    /// Every payment status.
    pub const ALL: [PaymentStatus; 4] = [
        PaymentStatus::Unpaid,
        PaymentStatus::Paid,
        PaymentStatus::Refunded,
        PaymentStatus::Failed,
    ];

    /// Wire name of the payment status.
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Failed => "failed",
        }
    }
}

/// Combined status pair tracked for every booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingState {
    pub status: BookingStatus,
    pub payment: PaymentStatus,
}

/// Requested change; `None` keeps the current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusChange {
    pub status: Option<BookingStatus>,
    pub payment: Option<PaymentStatus>,
}

impl StatusChange {
    /// Change only the reservation status.
    pub fn status(status: BookingStatus) -> Self {
        Self {
            status: Some(status),
            payment: None,
        }
    }

    /// Change both status and payment status.
    pub fn both(status: BookingStatus, payment: PaymentStatus) -> Self {
        Self {
            status: Some(status),
            payment: Some(payment),
        }
    }
}

/// What happens to the slot claims of the booking once the transition is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotEffect {
    /// Claims stay as they are.
    Keep,
    /// The hold becomes permanent.
    Pin,
    /// Claims are released for other customers.
    Release,
}

/// Notification emitted after the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionNotice {
    /// `BOOKING_UPDATED`
    Updated,
    /// `BOOKING_EXPIRED`
    Expired,
}

/// A validated transition that has not been persisted yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub from: BookingState,
    pub to: BookingState,
    pub slots: SlotEffect,
    /// Whether the applied voucher must be redeemed as part of this transition.
    pub redeem_voucher: bool,
    pub notice: TransitionNotice,
}

/// Error returned when a requested change is not allowed from the current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "invalid transition from {}/{} to {}/{}: {reason}",
    from.status.as_str(),
    from.payment.as_str(),
    to.status.as_str(),
    to.payment.as_str()
)]
pub struct InvalidTransition {
    pub from: BookingState,
    pub to: BookingState,
    pub reason: &'static str,
}

/// Booking fields the lifecycle rules depend on.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleContext {
    pub state: BookingState,
    pub expiry_time: SystemTime,
    pub has_voucher: bool,
    pub voucher_redeemed: bool,
}

/// Validate a status change and compute its side effects.
///
/// Returns `Ok(None)` when the booking is already in the requested state so repeated calls are
/// harmless.
pub fn plan(
    context: LifecycleContext,
    change: StatusChange,
    now: SystemTime,
) -> Result<Option<Plan>, InvalidTransition> {
    let from = context.state;
    let payment = change.payment.unwrap_or(from.payment);
    let status = match change.status {
        Some(status) => status,
        // Settling the payment of a held booking confirms it.
        None if from.status == BookingStatus::Pending && payment == PaymentStatus::Paid => {
            BookingStatus::Confirmed
        }
        None => from.status,
    };
    let to = BookingState { status, payment };

    if to == from {
        return Ok(None);
    }

    let reject = |reason| Err(InvalidTransition { from, to, reason });

    if from.status != to.status {
        match (from.status, to.status) {
            (BookingStatus::Pending, BookingStatus::Confirmed) => {
                if now > context.expiry_time {
                    return reject("the hold window has expired");
                }
            }
            (BookingStatus::Pending, BookingStatus::Cancelled) => {}
            (BookingStatus::Pending, BookingStatus::Expired) => {
                if now <= context.expiry_time {
                    return reject("the hold window is still open");
                }
            }
            (BookingStatus::Confirmed, BookingStatus::Completed) => {}
            (_, BookingStatus::CancelledBySystem) => {}
            _ => return reject("status change not allowed"),
        }
    }

    if from.payment != to.payment {
        let allowed = match (from.payment, to.payment) {
            (PaymentStatus::Unpaid | PaymentStatus::Failed, PaymentStatus::Paid) => {
                matches!(to.status, BookingStatus::Confirmed | BookingStatus::Completed)
            }
            (PaymentStatus::Unpaid, PaymentStatus::Failed) => matches!(
                to.status,
                BookingStatus::Pending
                    | BookingStatus::Cancelled
                    | BookingStatus::Expired
                    | BookingStatus::CancelledBySystem
            ),
            (PaymentStatus::Paid, PaymentStatus::Refunded) => {
                to.status == BookingStatus::CancelledBySystem
            }
            _ => false,
        };
        if !allowed {
            return reject("payment status change not allowed");
        }
    }

    if matches!(to.status, BookingStatus::Confirmed | BookingStatus::Completed)
        && to.payment != PaymentStatus::Paid
    {
        return reject("confirmed bookings must be paid");
    }

    let slots = match (from.status.is_blocking(), to.status.is_blocking()) {
        (true, false) => SlotEffect::Release,
        _ if from.status == BookingStatus::Pending && to.status == BookingStatus::Confirmed => {
            SlotEffect::Pin
        }
        _ => SlotEffect::Keep,
    };

    let redeem_voucher = context.has_voucher
        && !context.voucher_redeemed
        && from.status == BookingStatus::Pending
        && to.status == BookingStatus::Confirmed;

    let notice = if to.status == BookingStatus::Expired {
        TransitionNotice::Expired
    } else {
        TransitionNotice::Updated
    };

    Ok(Some(Plan {
        from,
        to,
        slots,
        redeem_voucher,
        notice,
    }))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn pending_context(expiry_time: SystemTime) -> LifecycleContext {
        LifecycleContext {
            state: BookingState {
                status: BookingStatus::Pending,
                payment: PaymentStatus::Unpaid,
            },
            expiry_time,
            has_voucher: true,
            voucher_redeemed: false,
        }
    }

    fn with_state(
        context: LifecycleContext,
        status: BookingStatus,
        payment: PaymentStatus,
    ) -> LifecycleContext {
        LifecycleContext {
            state: BookingState { status, payment },
            ..context
        }
    }

    #[test]
    fn payment_confirms_pending_booking() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        let context = pending_context(now + Duration::from_secs(600));

        let plan = plan(
            context,
            StatusChange::both(BookingStatus::Confirmed, PaymentStatus::Paid),
            now,
        )
        .unwrap()
        .unwrap();

        assert_eq!(plan.to.status, BookingStatus::Confirmed);
        assert_eq!(plan.slots, SlotEffect::Pin);
        assert!(plan.redeem_voucher);
        assert_eq!(plan.notice, TransitionNotice::Updated);
    }

    #[test]
    fn paid_payment_alone_implies_confirmation() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        let context = pending_context(now + Duration::from_secs(600));
        let change = StatusChange {
            status: None,
            payment: Some(PaymentStatus::Paid),
        };

        let plan = plan(context, change, now).unwrap().unwrap();
        assert_eq!(plan.to.status, BookingStatus::Confirmed);
    }

    #[test]
    fn confirmation_requires_payment() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        let context = pending_context(now + Duration::from_secs(600));

        let err = plan(context, StatusChange::status(BookingStatus::Confirmed), now).unwrap_err();
        assert_eq!(err.reason, "confirmed bookings must be paid");
    }

    #[test]
    fn expired_hold_cannot_be_confirmed() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        let context = pending_context(now - Duration::from_secs(1));

        let err = plan(
            context,
            StatusChange::both(BookingStatus::Confirmed, PaymentStatus::Paid),
            now,
        )
        .unwrap_err();
        assert_eq!(err.reason, "the hold window has expired");
    }

    #[test]
    fn expiry_only_after_hold_window() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);

        let open = pending_context(now + Duration::from_secs(1));
        assert!(plan(open, StatusChange::status(BookingStatus::Expired), now).is_err());

        let elapsed = pending_context(now - Duration::from_secs(1));
        let plan = plan(elapsed, StatusChange::status(BookingStatus::Expired), now)
            .unwrap()
            .unwrap();
        assert_eq!(plan.slots, SlotEffect::Release);
        assert_eq!(plan.notice, TransitionNotice::Expired);
        assert!(!plan.redeem_voucher);
    }

    #[test]
    fn same_state_is_a_no_op() {
        let now = SystemTime::UNIX_EPOCH;
        let context = with_state(
            pending_context(now),
            BookingStatus::Confirmed,
            PaymentStatus::Paid,
        );

        let outcome = plan(
            context,
            StatusChange::both(BookingStatus::Confirmed, PaymentStatus::Paid),
            now,
        )
        .unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn confirmed_booking_cannot_return_to_pending() {
        let now = SystemTime::UNIX_EPOCH;
        let context = with_state(
            pending_context(now),
            BookingStatus::Confirmed,
            PaymentStatus::Paid,
        );

        let err = plan(context, StatusChange::status(BookingStatus::Pending), now).unwrap_err();
        assert_eq!(err.from.status, BookingStatus::Confirmed);
        assert_eq!(err.to.status, BookingStatus::Pending);
    }

    #[test]
    fn admin_override_refunds_and_releases() {
        let now = SystemTime::UNIX_EPOCH;
        let context = with_state(
            pending_context(now),
            BookingStatus::Confirmed,
            PaymentStatus::Paid,
        );

        let plan = plan(
            context,
            StatusChange::both(BookingStatus::CancelledBySystem, PaymentStatus::Refunded),
            now,
        )
        .unwrap()
        .unwrap();
        assert_eq!(plan.slots, SlotEffect::Release);
    }

    #[test]
    fn refund_requires_system_cancellation() {
        let now = SystemTime::UNIX_EPOCH;
        let context = with_state(
            pending_context(now),
            BookingStatus::Confirmed,
            PaymentStatus::Paid,
        );
        let change = StatusChange {
            status: None,
            payment: Some(PaymentStatus::Refunded),
        };

        assert!(plan(context, change, now).is_err());
    }

    #[test]
    fn completion_keeps_slots_booked() {
        let now = SystemTime::UNIX_EPOCH;
        let context = with_state(
            pending_context(now),
            BookingStatus::Confirmed,
            PaymentStatus::Paid,
        );

        let plan = plan(context, StatusChange::status(BookingStatus::Completed), now)
            .unwrap()
            .unwrap();
        assert_eq!(plan.slots, SlotEffect::Keep);
    }

    #[test]
    fn already_redeemed_voucher_is_not_redeemed_again() {
        let now = SystemTime::UNIX_EPOCH;
        let context = LifecycleContext {
            voucher_redeemed: true,
            ..pending_context(now + Duration::from_secs(60))
        };

        let plan = plan(
            context,
            StatusChange::both(BookingStatus::Confirmed, PaymentStatus::Paid),
            now,
        )
        .unwrap()
        .unwrap();
        assert!(!plan.redeem_voucher);
    }
}
