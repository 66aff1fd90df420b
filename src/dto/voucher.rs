use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{DiscountType, VoucherEntity},
    dto::{
        format_system_time,
        validation::{validate_calendar_date, validate_voucher_code},
    },
    state::clock::format_date,
};

/// Voucher as exposed to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct VoucherResponse {
    pub id: Uuid,
    pub code: String,
    pub title: String,
    pub description: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    pub min_purchase: i64,
    pub max_discount: Option<i64>,
    pub start_date: String,
    pub end_date: String,
    pub is_active: bool,
    /// `null` means unlimited.
    pub usage_limit: Option<u32>,
    pub usage_count: u32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<VoucherEntity> for VoucherResponse {
    fn from(voucher: VoucherEntity) -> Self {
        Self {
            id: voucher.id,
            code: voucher.code,
            title: voucher.title,
            description: voucher.description,
            discount_type: voucher.discount_type,
            discount_value: voucher.discount_value,
            min_purchase: voucher.min_purchase,
            max_discount: voucher.max_discount,
            start_date: format_date(voucher.start_date),
            end_date: format_date(voucher.end_date),
            is_active: voucher.is_active,
            usage_limit: voucher.usage_limit,
            usage_count: voucher.usage_count,
            created_at: format_system_time(voucher.created_at),
            updated_at: format_system_time(voucher.updated_at),
        }
    }
}

fn default_active() -> bool {
    true
}

/// Admin payload creating or updating a voucher. Usage counters are never writable.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct VoucherRequest {
    #[validate(custom(function = "validate_voucher_code"))]
    pub code: String,
    #[validate(length(min = 1, max = 120))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: String,
    pub discount_type: DiscountType,
    #[validate(range(min = 1))]
    pub discount_value: i64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub min_purchase: i64,
    #[serde(default)]
    #[validate(range(min = 1))]
    pub max_discount: Option<i64>,
    #[validate(custom(function = "validate_calendar_date"))]
    pub start_date: String,
    #[validate(custom(function = "validate_calendar_date"))]
    pub end_date: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    #[validate(range(min = 1))]
    pub usage_limit: Option<u32>,
}

/// Query string of `GET /api/vouchers/check`.
#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct VoucherCheckQuery {
    #[validate(length(min = 1, max = 32))]
    pub code: String,
    /// Court rental subtotal the voucher would apply to.
    #[validate(range(min = 0))]
    pub amount: i64,
}

/// Outcome of checking a voucher code against an amount.
#[derive(Debug, Serialize, ToSchema)]
pub struct VoucherCheckResponse {
    pub code: String,
    pub valid: bool,
    pub discount_amount: i64,
    /// Why the voucher cannot be applied, when `valid` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
