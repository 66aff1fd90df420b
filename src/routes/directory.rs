use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::directory::{
        ArenaRequest, ArenaResponse, CourtResponse, CourtsQuery, CreateCourtRequest,
        UpdateCourtRequest,
    },
    error::AppError,
    services::directory_service,
    state::SharedState,
};

/// Arena and court catalogue.
pub fn public_router() -> Router<SharedState> {
    Router::new()
        .route("/arenas", get(list_arenas))
        .route("/arenas/{id}", get(get_arena))
        .route("/courts", get(list_courts))
        .route("/courts/{id}", get(get_court))
}

/// Catalogue maintenance.
pub fn admin_router() -> Router<SharedState> {
    Router::new()
        .route("/admin/arenas", post(create_arena))
        .route("/admin/arenas/{id}", put(update_arena))
        .route("/admin/courts", post(create_court))
        .route("/admin/courts/{id}", put(update_court))
}

#[utoipa::path(
    get,
    path = "/api/arenas",
    tag = "directory",
    responses((status = 200, description = "All arenas", body = [ArenaResponse]))
)]
/// List every arena.
pub async fn list_arenas(
    State(state): State<SharedState>,
) -> Result<Json<Vec<ArenaResponse>>, AppError> {
    Ok(Json(directory_service::list_arenas(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/arenas/{id}",
    tag = "directory",
    params(("id" = Uuid, Path, description = "Arena identifier")),
    responses(
        (status = 200, description = "Arena", body = ArenaResponse),
        (status = 404, description = "Unknown arena")
    )
)]
/// Retrieve one arena.
pub async fn get_arena(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ArenaResponse>, AppError> {
    Ok(Json(directory_service::get_arena(&state, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/courts",
    tag = "directory",
    params(CourtsQuery),
    responses((status = 200, description = "Courts", body = [CourtResponse]))
)]
/// List courts, optionally of a single arena.
pub async fn list_courts(
    State(state): State<SharedState>,
    Query(query): Query<CourtsQuery>,
) -> Result<Json<Vec<CourtResponse>>, AppError> {
    Ok(Json(
        directory_service::list_courts(&state, query.arena_id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/courts/{id}",
    tag = "directory",
    params(("id" = Uuid, Path, description = "Court identifier")),
    responses(
        (status = 200, description = "Court", body = CourtResponse),
        (status = 404, description = "Unknown court")
    )
)]
/// Retrieve one court.
pub async fn get_court(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CourtResponse>, AppError> {
    Ok(Json(directory_service::get_court(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/arenas",
    tag = "admin",
    security(("bearer" = [])),
    request_body = ArenaRequest,
    responses((status = 201, description = "Arena created", body = ArenaResponse))
)]
/// Register an arena.
pub async fn create_arena(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<ArenaRequest>>,
) -> Result<(StatusCode, Json<ArenaResponse>), AppError> {
    let arena = directory_service::create_arena(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(arena)))
}

#[utoipa::path(
    put,
    path = "/api/admin/arenas/{id}",
    tag = "admin",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Arena identifier")),
    request_body = ArenaRequest,
    responses(
        (status = 200, description = "Arena updated", body = ArenaResponse),
        (status = 404, description = "Unknown arena")
    )
)]
/// Replace an arena.
pub async fn update_arena(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<ArenaRequest>>,
) -> Result<Json<ArenaResponse>, AppError> {
    Ok(Json(
        directory_service::update_arena(&state, id, payload).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/admin/courts",
    tag = "admin",
    security(("bearer" = [])),
    request_body = CreateCourtRequest,
    responses(
        (status = 201, description = "Court created", body = CourtResponse),
        (status = 404, description = "Unknown arena")
    )
)]
/// Add a court to an arena.
pub async fn create_court(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateCourtRequest>>,
) -> Result<(StatusCode, Json<CourtResponse>), AppError> {
    let court = directory_service::create_court(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(court)))
}

#[utoipa::path(
    put,
    path = "/api/admin/courts/{id}",
    tag = "admin",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Court identifier")),
    request_body = UpdateCourtRequest,
    responses(
        (status = 200, description = "Court updated", body = CourtResponse),
        (status = 404, description = "Unknown court")
    )
)]
/// Update a court.
pub async fn update_court(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<UpdateCourtRequest>>,
) -> Result<Json<CourtResponse>, AppError> {
    Ok(Json(
        directory_service::update_court(&state, id, payload).await?,
    ))
}
