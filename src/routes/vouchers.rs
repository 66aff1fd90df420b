use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::voucher::{VoucherCheckQuery, VoucherCheckResponse, VoucherRequest, VoucherResponse},
    error::AppError,
    services::voucher_service,
    state::SharedState,
};

/// Vouchers currently on offer.
pub fn public_router() -> Router<SharedState> {
    Router::new().route("/vouchers", get(list_active))
}

/// Voucher dry-run for signed-in customers.
pub fn user_router() -> Router<SharedState> {
    Router::new().route("/vouchers/check", get(check_voucher))
}

/// Voucher maintenance.
pub fn admin_router() -> Router<SharedState> {
    Router::new()
        .route("/admin/vouchers", get(list_all).post(create_voucher))
        .route("/admin/vouchers/{id}", put(update_voucher))
}

#[utoipa::path(
    get,
    path = "/api/vouchers",
    tag = "vouchers",
    responses((status = 200, description = "Vouchers usable today", body = [VoucherResponse]))
)]
/// List vouchers that are active and not exhausted.
pub async fn list_active(
    State(state): State<SharedState>,
) -> Result<Json<Vec<VoucherResponse>>, AppError> {
    Ok(Json(voucher_service::list_active(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/vouchers/check",
    tag = "vouchers",
    security(("bearer" = [])),
    params(VoucherCheckQuery),
    responses(
        (status = 200, description = "Eligibility and discount", body = VoucherCheckResponse),
        (status = 404, description = "Unknown voucher code")
    )
)]
/// Check a voucher code against an amount without redeeming it.
pub async fn check_voucher(
    State(state): State<SharedState>,
    Valid(Query(query)): Valid<Query<VoucherCheckQuery>>,
) -> Result<Json<VoucherCheckResponse>, AppError> {
    Ok(Json(
        voucher_service::check(&state, &query.code, query.amount).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/admin/vouchers",
    tag = "admin",
    security(("bearer" = [])),
    responses((status = 200, description = "All vouchers", body = [VoucherResponse]))
)]
/// List every voucher.
pub async fn list_all(
    State(state): State<SharedState>,
) -> Result<Json<Vec<VoucherResponse>>, AppError> {
    Ok(Json(voucher_service::list_all(&state).await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/vouchers",
    tag = "admin",
    security(("bearer" = [])),
    request_body = VoucherRequest,
    responses(
        (status = 201, description = "Voucher created", body = VoucherResponse),
        (status = 409, description = "Code already in use")
    )
)]
/// Create a voucher.
pub async fn create_voucher(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<VoucherRequest>>,
) -> Result<(StatusCode, Json<VoucherResponse>), AppError> {
    let voucher = voucher_service::create(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(voucher)))
}

#[utoipa::path(
    put,
    path = "/api/admin/vouchers/{id}",
    tag = "admin",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Voucher identifier")),
    request_body = VoucherRequest,
    responses(
        (status = 200, description = "Voucher updated", body = VoucherResponse),
        (status = 404, description = "Unknown voucher"),
        (status = 409, description = "Code already in use")
    )
)]
/// Update a voucher; usage counters are preserved.
pub async fn update_voucher(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<VoucherRequest>>,
) -> Result<Json<VoucherResponse>, AppError> {
    Ok(Json(voucher_service::update(&state, id, payload).await?))
}
