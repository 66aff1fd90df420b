use thiserror::Error;
use time::Date;
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        models::{DiscountType, VoucherEntity},
        storage::InsertOutcome,
    },
    dto::voucher::{VoucherCheckResponse, VoucherRequest, VoucherResponse},
    error::ServiceError,
    services::availability::parse_day,
    state::{SharedState, clock::date_of},
};

/// Reason a voucher cannot be applied to a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoucherRejection {
    #[error("voucher is not active")]
    Inactive,
    #[error("voucher is not valid yet")]
    NotStarted,
    #[error("voucher has expired")]
    Ended,
    #[error("minimum purchase of {0} not reached")]
    MinimumNotMet(i64),
    #[error("voucher usage limit reached")]
    Exhausted,
}

impl From<VoucherRejection> for ServiceError {
    fn from(rejection: VoucherRejection) -> Self {
        match rejection {
            VoucherRejection::Exhausted => ServiceError::VoucherExhausted(rejection.to_string()),
            other => ServiceError::InvalidInput(other.to_string()),
        }
    }
}

/// Codes are compared upper-cased without surrounding whitespace.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Discount granted on `total_price`, never exceeding it.
pub fn discount_for(voucher: &VoucherEntity, total_price: i64) -> i64 {
    let raw = match voucher.discount_type {
        DiscountType::Percentage => {
            let percent = total_price.saturating_mul(voucher.discount_value) / 100;
            voucher
                .max_discount
                .map_or(percent, |cap| percent.min(cap))
        }
        DiscountType::Fixed => voucher.discount_value,
    };
    raw.clamp(0, total_price.max(0))
}

/// Check eligibility on `today` and compute the discount.
pub fn evaluate(
    voucher: &VoucherEntity,
    total_price: i64,
    today: Date,
) -> Result<i64, VoucherRejection> {
    if !voucher.is_active {
        return Err(VoucherRejection::Inactive);
    }
    if today < voucher.start_date {
        return Err(VoucherRejection::NotStarted);
    }
    if today > voucher.end_date {
        return Err(VoucherRejection::Ended);
    }
    if total_price < voucher.min_purchase {
        return Err(VoucherRejection::MinimumNotMet(voucher.min_purchase));
    }
    if voucher
        .usage_limit
        .is_some_and(|limit| voucher.usage_count >= limit)
    {
        return Err(VoucherRejection::Exhausted);
    }
    Ok(discount_for(voucher, total_price))
}

/// Every voucher, for administrators.
pub async fn list_all(state: &SharedState) -> Result<Vec<VoucherResponse>, ServiceError> {
    let store = state.require_booking_store().await?;
    let vouchers = store.list_vouchers().await?;
    Ok(vouchers.into_iter().map(Into::into).collect())
}

/// Vouchers a customer could use today.
pub async fn list_active(state: &SharedState) -> Result<Vec<VoucherResponse>, ServiceError> {
    let store = state.require_booking_store().await?;
    let today = date_of(state.now());
    let vouchers = store.list_vouchers().await?;
    Ok(vouchers
        .into_iter()
        .filter(|voucher| {
            voucher.is_active && voucher.start_date <= today && today <= voucher.end_date
        })
        .filter(|voucher| {
            voucher
                .usage_limit
                .is_none_or(|limit| voucher.usage_count < limit)
        })
        .map(Into::into)
        .collect())
}

/// Dry-run a voucher code against a subtotal.
pub async fn check(
    state: &SharedState,
    code: &str,
    amount: i64,
) -> Result<VoucherCheckResponse, ServiceError> {
    let store = state.require_booking_store().await?;
    let code = normalize_code(code);
    let voucher = store
        .find_voucher_by_code(code.clone())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("voucher {code}")))?;

    Ok(match evaluate(&voucher, amount, date_of(state.now())) {
        Ok(discount_amount) => VoucherCheckResponse {
            code,
            valid: true,
            discount_amount,
            reason: None,
        },
        Err(rejection) => VoucherCheckResponse {
            code,
            valid: false,
            discount_amount: 0,
            reason: Some(rejection.to_string()),
        },
    })
}

fn entity_from_request(
    request: VoucherRequest,
    id: Uuid,
    existing: Option<&VoucherEntity>,
    state: &SharedState,
) -> Result<VoucherEntity, ServiceError> {
    let start_date = parse_day(&request.start_date)?;
    let end_date = parse_day(&request.end_date)?;
    if end_date < start_date {
        return Err(ServiceError::InvalidInput(
            "end_date must not be before start_date".into(),
        ));
    }
    if request.discount_type == DiscountType::Percentage && request.discount_value > 100 {
        return Err(ServiceError::InvalidInput(
            "percentage discounts cannot exceed 100".into(),
        ));
    }

    let now = state.now();
    Ok(VoucherEntity {
        id,
        code: normalize_code(&request.code),
        title: request.title,
        description: request.description,
        discount_type: request.discount_type,
        discount_value: request.discount_value,
        min_purchase: request.min_purchase,
        max_discount: request.max_discount,
        start_date,
        end_date,
        is_active: request.is_active,
        usage_limit: request.usage_limit,
        usage_count: existing.map_or(0, |voucher| voucher.usage_count),
        redeemed_by: existing.map_or_else(Vec::new, |voucher| voucher.redeemed_by.clone()),
        created_at: existing.map_or(now, |voucher| voucher.created_at),
        updated_at: now,
    })
}

/// Register a new voucher; codes are unique.
pub async fn create(
    state: &SharedState,
    request: VoucherRequest,
) -> Result<VoucherResponse, ServiceError> {
    let store = state.require_booking_store().await?;
    let voucher = entity_from_request(request, Uuid::new_v4(), None, state)?;

    match store.insert_voucher(voucher.clone()).await? {
        InsertOutcome::Inserted => {
            info!(code = %voucher.code, id = %voucher.id, "voucher created");
            Ok(voucher.into())
        }
        InsertOutcome::Duplicate => Err(ServiceError::Conflict(format!(
            "voucher code {} already exists",
            voucher.code
        ))),
    }
}

/// Replace the editable fields of a voucher.
pub async fn update(
    state: &SharedState,
    id: Uuid,
    request: VoucherRequest,
) -> Result<VoucherResponse, ServiceError> {
    let store = state.require_booking_store().await?;
    let existing = store
        .find_voucher(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("voucher {id}")))?;
    let voucher = entity_from_request(request, id, Some(&existing), state)?;

    match store.update_voucher(voucher.clone()).await? {
        InsertOutcome::Inserted => {
            info!(code = %voucher.code, %id, "voucher updated");
            let stored = store.find_voucher(id).await?.unwrap_or(voucher);
            Ok(stored.into())
        }
        InsertOutcome::Duplicate => Err(ServiceError::Conflict(format!(
            "voucher code {} already exists",
            voucher.code
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::SystemTime};

    use time::macros::date;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::booking_store::{BookingStore, memory::MemoryBookingStore},
        state::{AppState, clock::ManualClock},
    };

    async fn state() -> (SharedState, MemoryBookingStore) {
        let clock = Arc::new(ManualClock::at_date(date!(2025 - 01 - 10)));
        let state = AppState::with_clock(AppConfig::default(), clock);
        let store = MemoryBookingStore::new();
        state.set_booking_store(Arc::new(store.clone())).await;
        (state, store)
    }

    fn request(code: &str) -> VoucherRequest {
        VoucherRequest {
            code: code.into(),
            title: "Smash".into(),
            description: String::new(),
            discount_type: DiscountType::Percentage,
            discount_value: 10,
            min_purchase: 0,
            max_discount: None,
            start_date: "2025-01-01".into(),
            end_date: "2025-01-31".into(),
            is_active: true,
            usage_limit: Some(5),
        }
    }

    fn voucher(discount_type: DiscountType, value: i64) -> VoucherEntity {
        VoucherEntity {
            id: Uuid::new_v4(),
            code: "SMASH".into(),
            title: "Smash".into(),
            description: String::new(),
            discount_type,
            discount_value: value,
            min_purchase: 50_000,
            max_discount: None,
            start_date: date!(2025 - 01 - 01),
            end_date: date!(2025 - 01 - 31),
            is_active: true,
            usage_limit: Some(2),
            usage_count: 0,
            redeemed_by: Vec::new(),
            created_at: SystemTime::UNIX_EPOCH,
            updated_at: SystemTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn percentage_discount_respects_cap() {
        let mut voucher = voucher(DiscountType::Percentage, 20);
        assert_eq!(discount_for(&voucher, 100_000), 20_000);

        voucher.max_discount = Some(15_000);
        assert_eq!(discount_for(&voucher, 100_000), 15_000);
    }

    #[test]
    fn fixed_discount_never_exceeds_total() {
        let voucher = voucher(DiscountType::Fixed, 80_000);
        assert_eq!(discount_for(&voucher, 60_000), 60_000);
    }

    #[test]
    fn eligibility_checks_window_minimum_and_limit() {
        let mut voucher = voucher(DiscountType::Fixed, 10_000);
        let today = date!(2025 - 01 - 10);

        assert_eq!(evaluate(&voucher, 60_000, today), Ok(10_000));
        assert_eq!(
            evaluate(&voucher, 40_000, today),
            Err(VoucherRejection::MinimumNotMet(50_000))
        );
        assert_eq!(
            evaluate(&voucher, 60_000, date!(2024 - 12 - 31)),
            Err(VoucherRejection::NotStarted)
        );
        assert_eq!(
            evaluate(&voucher, 60_000, date!(2025 - 02 - 01)),
            Err(VoucherRejection::Ended)
        );

        voucher.usage_count = 2;
        assert_eq!(
            evaluate(&voucher, 60_000, today),
            Err(VoucherRejection::Exhausted)
        );

        voucher.usage_count = 0;
        voucher.is_active = false;
        assert_eq!(
            evaluate(&voucher, 60_000, today),
            Err(VoucherRejection::Inactive)
        );
    }

    #[test]
    fn codes_are_normalized() {
        assert_eq!(normalize_code("  smash10 "), "SMASH10");
    }

    #[tokio::test]
    async fn create_normalizes_code_and_rejects_duplicates() {
        let (state, _) = state().await;
        let created = create(&state, request(" smash10 ")).await.unwrap();
        assert_eq!(created.code, "SMASH10");
        assert_eq!(created.usage_count, 0);

        let err = create(&state, request("SMASH10")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(list_all(&state).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_rejects_inverted_window_and_oversized_percentage() {
        let (state, _) = state().await;
        let mut inverted = request("BACKWARDS");
        inverted.end_date = "2024-12-31".into();
        assert!(matches!(
            create(&state, inverted).await,
            Err(ServiceError::InvalidInput(_))
        ));

        let mut generous = request("FREE");
        generous.discount_value = 150;
        assert!(matches!(
            create(&state, generous).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn update_keeps_usage_counters() {
        let (state, store) = state().await;
        let created = create(&state, request("SMASH10")).await.unwrap();
        let booking = Uuid::new_v4();
        store.redeem_voucher(created.id, booking).await.unwrap();

        let mut edit = request("smash15");
        edit.discount_value = 15;
        let updated = update(&state, created.id, edit).await.unwrap();
        assert_eq!(updated.code, "SMASH15");
        assert_eq!(updated.discount_value, 15);
        assert_eq!(updated.usage_count, 1);

        let stored = store.find_voucher(created.id).await.unwrap().unwrap();
        assert_eq!(stored.redeemed_by, vec![booking]);
        assert_eq!(stored.created_at, state.now());

        create(&state, request("OTHER")).await.unwrap();
        let clash = update(&state, created.id, request("OTHER")).await;
        assert!(matches!(clash, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn check_reports_ineligible_and_unknown_codes() {
        let (state, _) = state().await;
        let mut promo = request("BIGSPEND");
        promo.min_purchase = 100_000;
        create(&state, promo).await.unwrap();

        let ok = check(&state, "bigspend", 200_000).await.unwrap();
        assert!(ok.valid);
        assert_eq!(ok.discount_amount, 20_000);

        let short = check(&state, "BIGSPEND", 50_000).await.unwrap();
        assert!(!short.valid);
        assert!(short.reason.is_some());

        let unknown = check(&state, "NOPE", 50_000).await;
        assert!(matches!(unknown, Err(ServiceError::NotFound(_))));
    }
}
